use crate::services::{
    functions::FunctionError, mailer::EmailError, storage::StorageError, users::DirectoryError,
    zip::ZipError,
};
use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{fmt, io};

/// Failure categories surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    PayloadTooLarge,
    InvalidObjectName,
    ObjectNotFound,
    RangeUnsatisfiable,
    MalformedArchive,
    InvalidLength,
    StorageUnavailable,
    LinkExpired,
    RemoteFunctionError,
    EmailSendFailed,
    UserNotFound,
    AuthProviderError,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest | ErrorKind::InvalidObjectName => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::ObjectNotFound | ErrorKind::UserNotFound => StatusCode::NOT_FOUND,
            ErrorKind::RangeUnsatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            ErrorKind::MalformedArchive | ErrorKind::InvalidLength => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::LinkExpired => StatusCode::GONE,
            ErrorKind::RemoteFunctionError
            | ErrorKind::EmailSendFailed
            | ErrorKind::AuthProviderError => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Error returned by every handler; renders `{"success": false, "errorMessage": ...}`.
#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.kind.status();
        tracing::warn!("request failed with {:?} ({}): {}", self.kind, status, self.message);

        let body = Json(json!({
            "success": false,
            "errorMessage": self.message,
        }));

        (status, body).into_response()
    }
}

/// Client-side upload failures: over the body limit, or a body that did not
/// parse.
fn upload_failure_kind(status: StatusCode) -> ErrorKind {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ErrorKind::PayloadTooLarge
    } else {
        ErrorKind::BadRequest
    }
}

/// Kind of a body stream error; multipart errors carry their own status.
fn body_failure_kind(err: &io::Error) -> ErrorKind {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<MultipartError>())
        .map_or(ErrorKind::BadRequest, |multipart| {
            upload_failure_kind(multipart.status())
        })
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let kind = match &err {
            StorageError::Body(inner) => body_failure_kind(inner),
            StorageError::ObjectNotFound(_) | StorageError::LinkNotFound => {
                ErrorKind::ObjectNotFound
            }
            StorageError::RangeUnsatisfiable { .. } => ErrorKind::RangeUnsatisfiable,
            StorageError::InvalidObjectName => ErrorKind::InvalidObjectName,
            StorageError::LinkExpired => ErrorKind::LinkExpired,
            StorageError::Unavailable(_) | StorageError::Sqlx(_) | StorageError::Io(_) => {
                ErrorKind::StorageUnavailable
            }
        };
        AppError::new(kind, err.to_string())
    }
}

impl From<ZipError> for AppError {
    fn from(err: ZipError) -> Self {
        match err {
            ZipError::Storage(inner) => inner.into(),
            ZipError::InvalidLength(_) => AppError::new(ErrorKind::InvalidLength, err.to_string()),
            ZipError::MalformedArchive(_) => {
                AppError::new(ErrorKind::MalformedArchive, err.to_string())
            }
        }
    }
}

impl From<FunctionError> for AppError {
    fn from(err: FunctionError) -> Self {
        match err {
            FunctionError::BadRequest(msg) => AppError::bad_request(msg),
            other => AppError::new(ErrorKind::RemoteFunctionError, other.to_string()),
        }
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        AppError::new(ErrorKind::EmailSendFailed, err.to_string())
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        let kind = match err {
            DirectoryError::NotFound(_) => ErrorKind::UserNotFound,
            DirectoryError::NotConfigured | DirectoryError::Transport(_) => {
                ErrorKind::AuthProviderError
            }
        };
        AppError::new(kind, err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(upload_failure_kind(err.status()), err.body_text())
    }
}
