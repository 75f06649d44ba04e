//! In-process doubles for the outbound clients and a ready-made `AppState`.

use crate::{
    services::{
        functions::{ArchiveFunctions, ExtractionPayload, FunctionError},
        mailer::{EmailError, EmailMessage, Mailer},
        storage::memory::MemoryObjectStore,
        templates::Branding,
        users::{DirectoryError, UserDirectory},
    },
    state::AppState,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Records every payload and answers with a fixed URL, or fails.
#[derive(Default)]
pub struct StubFunctions {
    pub calls: Mutex<Vec<ExtractionPayload>>,
    pub fail: bool,
}

#[async_trait]
impl ArchiveFunctions for StubFunctions {
    async fn invoke(&self, payload: &ExtractionPayload) -> Result<String, FunctionError> {
        self.calls.lock().unwrap().push(payload.clone());
        if self.fail {
            return Err(FunctionError::Unsuccessful);
        }
        Ok(format!("https://cdn.example.com/{}", payload.archive_key))
    }
}

/// Records delivered messages. With `fail_after = Some(n)` every send after
/// the first `n` is rejected.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail_after: Option<usize>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_after.is_some_and(|limit| sent.len() >= limit) {
            return Err(EmailError::Rejected {
                status: 422,
                body: "rejected".into(),
            });
        }
        sent.push(message.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

#[derive(Default)]
pub struct StaticUsers {
    pub ids: HashMap<String, String>,
}

#[async_trait]
impl UserDirectory for StaticUsers {
    async fn find_user_id(&self, email: &str) -> Result<String, DirectoryError> {
        self.ids
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(email))
            .map(|(_, id)| id.clone())
            .ok_or_else(|| DirectoryError::NotFound(email.to_string()))
    }
}

pub fn branding() -> Branding {
    Branding {
        app_name: "Dashboard".into(),
        app_domain: "https://app.example.com".into(),
        admin_domain: "https://admin.example.com".into(),
        sender: "info@example.com".into(),
        admin_recipients: vec!["ops@example.com".into()],
    }
}

/// Handles to the doubles behind a test `AppState`.
pub struct Harness {
    pub state: AppState,
    pub store: MemoryObjectStore,
    pub functions: Arc<StubFunctions>,
    pub mailer: Arc<RecordingMailer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(StubFunctions::default(), RecordingMailer::default())
    }

    pub fn with(functions: StubFunctions, mailer: RecordingMailer) -> Self {
        let store = MemoryObjectStore::new();
        let functions = Arc::new(functions);
        let mailer = Arc::new(mailer);
        let users = StaticUsers {
            ids: HashMap::from([("ada@example.com".to_string(), "user-1".to_string())]),
        };

        let state = AppState {
            store: Arc::new(store.clone()),
            functions: functions.clone(),
            mailer: mailer.clone(),
            users: Arc::new(users),
            branding: Arc::new(branding()),
            presign_ttl: Duration::from_secs(900),
        };
        Self {
            state,
            store,
            functions,
            mailer,
        }
    }
}
