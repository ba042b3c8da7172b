pub mod envelope;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf) -> Router {
    let app_state = state::AppState::new(root);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Students
        .route(
            "/api/students",
            get(routes::students::list_students).post(routes::students::create_student),
        )
        .route(
            "/api/students/{id}",
            get(routes::students::get_student)
                .put(routes::students::update_student)
                .delete(routes::students::delete_student),
        )
        // Rolls
        .route(
            "/api/rolls",
            get(routes::rolls::list_rolls).post(routes::rolls::create_roll),
        )
        .route(
            "/api/rolls/{id}",
            get(routes::rolls::get_roll)
                .put(routes::rolls::update_roll)
                .delete(routes::rolls::delete_roll),
        )
        .route("/api/rolls/{id}/states", get(routes::rolls::get_roll_states))
        // Student roll states
        .route(
            "/api/roll-states",
            get(routes::roll_states::list_roll_states)
                .post(routes::roll_states::create_roll_state),
        )
        .route(
            "/api/roll-states/bulk",
            post(routes::roll_states::create_roll_states),
        )
        .route(
            "/api/roll-states/{id}",
            get(routes::roll_states::get_roll_state)
                .put(routes::roll_states::update_roll_state)
                .delete(routes::roll_states::delete_roll_state),
        )
        // Groups
        .route(
            "/api/groups",
            get(routes::groups::list_groups).post(routes::groups::create_group),
        )
        .route("/api/groups/run-filters", post(routes::groups::run_filters))
        .route(
            "/api/groups/{id}",
            get(routes::groups::get_group)
                .put(routes::groups::update_group)
                .delete(routes::groups::delete_group),
        )
        .route(
            "/api/groups/{id}/students",
            get(routes::groups::get_group_students),
        )
        // Materialized membership
        .route(
            "/api/group-students",
            get(routes::group_students::list_group_students),
        )
        .route(
            "/api/group-students/{id}",
            get(routes::group_students::get_group_student)
                .delete(routes::group_students::delete_group_student),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the rollcall API server on `0.0.0.0:{port}`.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener).await
}

/// Start the rollcall API server on a pre-bound listener.
///
/// The caller can read the actual port before starting (useful when
/// `port = 0` and the OS picks a free port).
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root);

    tracing::info!("rollcall API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
