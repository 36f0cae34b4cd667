//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// A JSON body sent with `201 Created`.
#[derive(Debug)]
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// Body carrying only a human-readable message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: &'static str,
}

impl MessageResponse {
    /// Wrap a message.
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}
