use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rollcall_core::RollcallError;

use crate::envelope::Envelope;

/// Unified error type for HTTP responses.
///
/// Every failure is reported with HTTP 500 and the failure envelope. Not-found
/// errors carry `"<Entity> not found"` and an empty object; everything else
/// carries `"error"` and the error text.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let envelope = match self.0.downcast_ref::<RollcallError>() {
            Some(e) if e.is_not_found() => {
                Envelope::failure(serde_json::json!({}), e.user_message())
            }
            _ => Envelope::failure(
                serde_json::json!({ "error": format!("{:#}", self.0) }),
                "error",
            ),
        };
        tracing::warn!(error = %self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(envelope)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
