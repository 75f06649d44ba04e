use crate::{
    errors::AppError,
    models::{envelope::ApiResponse, requests::EmailLookupReq},
    state::AppState,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

/// `POST /get-user-id-from-email`
pub async fn get_user_id_from_email(
    State(state): State<AppState>,
    payload: Result<Json<EmailLookupReq>, JsonRejection>,
) -> Result<ApiResponse<String>, AppError> {
    let Json(req) = payload?;

    let id = state.users.find_user_id(&req.email).await?;
    debug!("resolved {} to user {}", req.email, id);
    Ok(ApiResponse::ok("", id))
}
