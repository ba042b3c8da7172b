use axum::Json;

use crate::envelope::Envelope;

/// GET /api/health: liveness probe. Does not touch the database.
pub async fn health() -> Json<Envelope<serde_json::Value>> {
    Envelope::ok(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
