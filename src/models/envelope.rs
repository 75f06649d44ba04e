//! Response envelope shared by every JSON endpoint.
//!
//! Success bodies look like `{"success": true, "message": "...", "data": ...}`.
//! Failures are rendered by [`crate::errors::AppError`] as
//! `{"success": false, "errorMessage": "..."}`.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

impl ApiResponse<Option<()>> {
    /// Success with an explicit `"data": null`.
    pub fn done(message: impl Into<String>) -> Self {
        Self::ok(message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_data_is_serialized() {
        let body = serde_json::to_value(ApiResponse::done("File deleted successfully.")).unwrap();
        assert_eq!(
            body,
            json!({"success": true, "message": "File deleted successfully.", "data": null})
        );
    }
}
