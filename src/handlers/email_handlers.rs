//! Transactional emails for the registration and sharing flows.

use crate::{
    errors::AppError,
    models::{
        envelope::ApiResponse,
        requests::{ConfirmationMailReq, InvitationMailReq, RegistrationMailReq},
    },
    services::templates::Decision,
    state::AppState,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::info;

/// `POST /new-register-request-mail-to-admin`
pub async fn register_request_mail_to_admin(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationMailReq>, JsonRejection>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let Json(req) = payload?;

    let message = state.branding.registration_request(&req.name, &req.email);
    let id = state.mailer.send(&message).await?;
    info!("registration request for {} sent to admins ({})", req.email, id);
    Ok(ApiResponse::done("Email sent to admin successfully."))
}

/// `POST /send-emails-after-email-verification` — admin notice first, then
/// the user confirmation. A failed admin notice stops the user email.
pub async fn send_emails_after_verification(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationMailReq>, JsonRejection>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let Json(req) = payload?;

    for message in state.branding.verification_notices(&req.name, &req.email) {
        let id = state.mailer.send(&message).await?;
        info!("sent {:?} to {:?} ({})", message.subject, message.to, id);
    }
    Ok(ApiResponse::done("Email sent successfully."))
}

/// `POST /register-confirmation-mail-to-user`
pub async fn register_confirmation_mail_to_user(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmationMailReq>, JsonRejection>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let Json(req) = payload?;

    let decision = Decision::from_request(&req.decision);
    let message = state
        .branding
        .registration_decision(&req.email, req.name.as_deref(), decision);
    let id = state.mailer.send(&message).await?;
    info!("registration {:?} sent to {} ({})", decision, req.email, id);
    Ok(ApiResponse::done("Email sent successfully."))
}

/// `POST /send-invitation-email`
pub async fn send_invitation_email(
    State(state): State<AppState>,
    payload: Result<Json<InvitationMailReq>, JsonRejection>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let Json(req) = payload?;

    let message = state
        .branding
        .invitation(&req.email, &req.item_name, &req.item_type);
    let id = state.mailer.send(&message).await?;
    info!("invitation to {} {:?} sent to {} ({})", req.item_type, req.item_name, req.email, id);
    Ok(ApiResponse::done("Email sent successfully."))
}
