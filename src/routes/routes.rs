//! Route table.
//!
//! - **Files**: `POST /upload-normal-file`, `/upload-zip-file`, `/download-file`,
//!   `/delete-file`
//! - **Archive entries**: `POST /download-file-from-zip`, `/delete-file-from-zip`,
//!   `/download-folder-from-zip`, `/delete-folder-from-zip`
//! - **Email**: `POST /new-register-request-mail-to-admin`,
//!   `/send-emails-after-email-verification`, `/register-confirmation-mail-to-user`,
//!   `/send-invitation-email`
//! - **Users**: `POST /get-user-id-from-email`
//! - **Links**: `GET /links/{token}`, mounted only for the local store
//! - **Health**: `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        email_handlers::{
            register_confirmation_mail_to_user, register_request_mail_to_admin,
            send_emails_after_verification, send_invitation_email,
        },
        file_handlers::{delete_file, download_file, upload_normal_file, upload_zip_file},
        health_handlers::{healthz, readyz},
        link_handlers::serve_link,
        user_handlers::get_user_id_from_email,
        zip_handlers::{
            delete_file_from_zip, delete_folder_from_zip, download_file_from_zip,
            download_folder_from_zip,
        },
    },
    services::storage::local::LocalObjectStore,
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// JSON and multipart routes sharing `AppState`. Uploads accept bodies up to
/// `max_upload_bytes`.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    let uploads = Router::new()
        .route("/upload-normal-file", post(upload_normal_file))
        .route("/upload-zip-file", post(upload_zip_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(uploads)
        .route("/download-file", post(download_file))
        .route("/delete-file", post(delete_file))
        .route("/download-file-from-zip", post(download_file_from_zip))
        .route("/delete-file-from-zip", post(delete_file_from_zip))
        .route("/download-folder-from-zip", post(download_folder_from_zip))
        .route("/delete-folder-from-zip", post(delete_folder_from_zip))
        .route(
            "/new-register-request-mail-to-admin",
            post(register_request_mail_to_admin),
        )
        .route(
            "/send-emails-after-email-verification",
            post(send_emails_after_verification),
        )
        .route(
            "/register-confirmation-mail-to-user",
            post(register_confirmation_mail_to_user),
        )
        .route("/send-invitation-email", post(send_invitation_email))
        .route("/get-user-id-from-email", post(get_user_id_from_email))
}

/// Presigned link downloads served straight from the local store.
pub fn link_routes() -> Router<Arc<LocalObjectStore>> {
    Router::new().route("/links/{token}", get(serve_link))
}

/// The complete application: state applied, link routes mounted when a local
/// store is given, CORS and request tracing layered on top.
pub fn app(
    state: AppState,
    links: Option<Arc<LocalObjectStore>>,
    max_upload_bytes: usize,
    cors_origins: &[String],
) -> Router {
    let mut router = routes(max_upload_bytes).with_state(state);
    if let Some(store) = links {
        router = router.merge(link_routes().with_state(store));
    }
    if !cors_origins.is_empty() {
        router = router.layer(build_cors(cors_origins));
    }
    router.layer(TraceLayer::new_for_http())
}

fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|val| val == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let list = origins
            .iter()
            .filter_map(|val| HeaderValue::from_str(val).ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(list))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
