use axum::Json;
use serde::Serialize;

/// Uniform response body: `{ data, statusCode, userMessage }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: T,
    pub status_code: u16,
    pub user_message: String,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Self::ok_with_message(data, "")
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            data,
            status_code: 200,
            user_message: message.into(),
        })
    }
}

impl Envelope<serde_json::Value> {
    pub fn failure(data: serde_json::Value, message: impl Into<String>) -> Self {
        Self {
            data,
            status_code: 500,
            user_message: message.into(),
        }
    }
}
