use crate::services::{
    functions::ArchiveFunctions, mailer::Mailer, storage::ObjectStore, templates::Branding,
    users::UserDirectory,
};
use std::{sync::Arc, time::Duration};

/// Clients shared by every handler, built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub functions: Arc<dyn ArchiveFunctions>,
    pub mailer: Arc<dyn Mailer>,
    pub users: Arc<dyn UserDirectory>,
    pub branding: Arc<Branding>,
    /// Lifetime of links issued by `/download-file`.
    pub presign_ttl: Duration,
}
