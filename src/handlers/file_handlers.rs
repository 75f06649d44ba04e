//! Plain file and zip archive uploads, presigned downloads and deletes.
//!
//! Uploads read the multipart field named `file` as a stream, so large
//! archives never sit in memory.

use crate::{
    errors::AppError,
    models::{envelope::ApiResponse, requests::FileNameReq},
    services::{
        storage::ByteStream,
        uploads::{upload_and_list, upload_file},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::{
        State,
        multipart::{Field, Multipart, MultipartRejection},
        rejection::JsonRejection,
    },
};
use futures::{StreamExt, TryStreamExt};
use std::io;
use tracing::info;

const FILE_FIELD: &str = "file";

fn field_stream(field: Field<'_>) -> ByteStream<'_> {
    field.map_err(io::Error::other).boxed()
}

fn missing_file() -> AppError {
    AppError::bad_request("No file uploaded")
}

/// `POST /upload-normal-file` — data is `[storedName]`.
pub async fn upload_normal_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<Vec<String>>, AppError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);

        let stored_name = upload_file(
            &*state.store,
            field_stream(field),
            original_name.as_deref(),
            content_type,
        )
        .await?;
        return Ok(ApiResponse::ok("File uploaded successfully", vec![stored_name]));
    }
    Err(missing_file())
}

/// `POST /upload-zip-file` — data is `[storedName, ...entryNames]`.
pub async fn upload_zip_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<Vec<String>>, AppError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);

        let (_, manifest) = upload_and_list(&*state.store, field_stream(field), content_type).await?;
        return Ok(ApiResponse::ok("File uploaded successfully", manifest));
    }
    Err(missing_file())
}

/// `POST /download-file` — presigned URL for an existing object.
pub async fn download_file(
    State(state): State<AppState>,
    payload: Result<Json<FileNameReq>, JsonRejection>,
) -> Result<ApiResponse<String>, AppError> {
    let Json(req) = payload?;

    let object = state.store.head(&req.file_name).await?;
    let url = state
        .store
        .presign_read(&object.name, state.presign_ttl)
        .await?;
    info!("issued download link for {}", object.name);
    Ok(ApiResponse::ok("", url))
}

/// `POST /delete-file`
pub async fn delete_file(
    State(state): State<AppState>,
    payload: Result<Json<FileNameReq>, JsonRejection>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let Json(req) = payload?;

    state.store.delete(&req.file_name).await?;
    info!("deleted {}", req.file_name);
    Ok(ApiResponse::done("File deleted successfully."))
}
