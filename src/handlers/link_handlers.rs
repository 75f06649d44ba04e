//! Serves presigned links issued by the local store.

use crate::{
    errors::AppError,
    models::object::StoredObject,
    services::storage::{StorageError, local::LocalObjectStore},
};
use axum::{
    body::Body,
    extract::{Path, State, rejection::PathRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::info;
use uuid::Uuid;

/// `GET /links/{token}` — stream the linked object while the link is live.
pub async fn serve_link(
    State(store): State<Arc<LocalObjectStore>>,
    token: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(token) = token.map_err(|_| StorageError::LinkNotFound)?;

    let (object, file) = store.open_link(token).await?;
    info!("serving {} through link {}", object.name, token);

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    *response.status_mut() = StatusCode::OK;
    set_object_headers(response.headers_mut(), &object);
    Ok(response)
}

fn set_object_headers(headers: &mut HeaderMap, object: &StoredObject) {
    let content_type = object
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(object.size()));

    if let Some(etag) = object.etag.as_ref() {
        if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", etag)) {
            headers.insert(header::ETAG, value);
        }
    }

    // Stored names are UUIDs plus an extension, so they are safe to quote.
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", object.name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
}
