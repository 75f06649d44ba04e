//! Entries inside stored archives: extraction through the remote functions,
//! and deletes of what they published.

use crate::{
    errors::AppError,
    models::{
        envelope::ApiResponse,
        requests::{FileUrlReq, FolderUrlReq},
    },
    services::functions::ExtractionPayload,
    state::AppState,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

/// `POST /download-file-from-zip`
pub async fn download_file_from_zip(
    State(state): State<AppState>,
    payload: Result<Json<FileUrlReq>, JsonRejection>,
) -> Result<ApiResponse<String>, AppError> {
    let Json(req) = payload?;

    let request = ExtractionPayload::for_file(&req.file_url)?;
    let url = state.functions.invoke(&request).await?;
    info!("extracted {} from {}", req.file_url, request.archive_key);
    Ok(ApiResponse::ok("", url))
}

/// `POST /delete-file-from-zip` — removes the object published under `fileUrl`.
pub async fn delete_file_from_zip(
    State(state): State<AppState>,
    payload: Result<Json<FileUrlReq>, JsonRejection>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let Json(req) = payload?;

    state.store.delete(&req.file_url).await?;
    info!("deleted extracted file {}", req.file_url);
    Ok(ApiResponse::done("File deleted successfully."))
}

/// `POST /download-folder-from-zip`
pub async fn download_folder_from_zip(
    State(state): State<AppState>,
    payload: Result<Json<FolderUrlReq>, JsonRejection>,
) -> Result<ApiResponse<String>, AppError> {
    let Json(req) = payload?;

    let request = ExtractionPayload::for_folder(&req.folder_url)?;
    let url = state.functions.invoke(&request).await?;
    info!("extracted folder {} from {}", req.folder_url, request.archive_key);
    Ok(ApiResponse::ok("", url))
}

/// `POST /delete-folder-from-zip` — removes the `<folderUrl>.zip` bundle.
pub async fn delete_folder_from_zip(
    State(state): State<AppState>,
    payload: Result<Json<FolderUrlReq>, JsonRejection>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let Json(req) = payload?;

    let bundle = format!("{}.zip", req.folder_url);
    state.store.delete(&bundle).await?;
    info!("deleted extracted folder {}", bundle);
    Ok(ApiResponse::done("Folder deleted successfully."))
}
