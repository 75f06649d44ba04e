//! Client for the remote functions that pull a single file or folder out of a
//! stored archive and publish it behind a download URL.
//!
//! The functions are deployed separately; this module only builds their
//! payload and interprets their `{success, data}` reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0} extraction function is not configured")]
    NotConfigured(&'static str),
    #[error("archive function call failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Something went wrong.")]
    Unsuccessful,
}

/// Body sent to an extraction function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionPayload {
    /// Stored archive name, `<key>.zip`.
    pub archive_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_folder: Option<String>,
}

impl ExtractionPayload {
    /// Payload for `fileUrl = "<key>/<path>"`. The full `fileUrl` is passed
    /// through as `required_file`.
    pub fn for_file(file_url: &str) -> Result<Self, FunctionError> {
        match file_url.split_once('/') {
            Some((key, path)) if !key.is_empty() && !path.is_empty() => Ok(Self {
                archive_key: format!("{}.zip", key),
                required_file: Some(file_url.to_string()),
                required_folder: None,
            }),
            _ => Err(FunctionError::BadRequest(
                "Missing zip file or specific file parameters".into(),
            )),
        }
    }

    /// Payload for `folderUrl = "<key>/<folder>"` or a bare `<key>`.
    pub fn for_folder(folder_url: &str) -> Result<Self, FunctionError> {
        let key = folder_url.split('/').next().unwrap_or_default();
        if key.is_empty() {
            return Err(FunctionError::BadRequest(
                "Missing zip file or specific folder parameters".into(),
            ));
        }
        Ok(Self {
            archive_key: format!("{}.zip", key),
            required_file: None,
            required_folder: Some(folder_url.to_string()),
        })
    }

    pub fn is_folder(&self) -> bool {
        self.required_folder.is_some()
    }
}

/// Reply of an extraction function.
#[derive(Debug, Deserialize)]
pub struct FunctionReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<String>,
}

impl FunctionReply {
    /// The download URL, or `Unsuccessful` when the function reported failure.
    pub fn into_url(self) -> Result<String, FunctionError> {
        match (self.success, self.data) {
            (true, Some(url)) => Ok(url),
            _ => Err(FunctionError::Unsuccessful),
        }
    }
}

#[async_trait]
pub trait ArchiveFunctions: Send + Sync {
    /// Run the file or folder function for `payload` and return its URL.
    async fn invoke(&self, payload: &ExtractionPayload) -> Result<String, FunctionError>;
}

/// Invokes functions exposed as plain HTTPS endpoints.
#[derive(Clone)]
pub struct HttpArchiveFunctions {
    client: reqwest::Client,
    file_url: Option<String>,
    folder_url: Option<String>,
    token: Option<String>,
}

impl HttpArchiveFunctions {
    pub fn new(
        client: reqwest::Client,
        file_url: Option<String>,
        folder_url: Option<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            file_url,
            folder_url,
            token,
        }
    }

    fn endpoint(&self, payload: &ExtractionPayload) -> Result<&str, FunctionError> {
        if payload.is_folder() {
            self.folder_url
                .as_deref()
                .ok_or(FunctionError::NotConfigured("folder"))
        } else {
            self.file_url
                .as_deref()
                .ok_or(FunctionError::NotConfigured("file"))
        }
    }
}

#[async_trait]
impl ArchiveFunctions for HttpArchiveFunctions {
    async fn invoke(&self, payload: &ExtractionPayload) -> Result<String, FunctionError> {
        let endpoint = self.endpoint(payload)?;
        debug!("invoking {} with {:?}", endpoint, payload);

        let mut request = self.client.post(endpoint).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let reply: FunctionReply = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        reply.into_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_payload_keeps_the_full_url() {
        let payload = ExtractionPayload::for_file("3f2a/docs/report.pdf").unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"archive_key": "3f2a.zip", "required_file": "3f2a/docs/report.pdf"})
        );
        assert!(!payload.is_folder());
    }

    #[test]
    fn folder_payload_accepts_a_bare_key() {
        let payload = ExtractionPayload::for_folder("3f2a").unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"archive_key": "3f2a.zip", "required_folder": "3f2a"})
        );
        assert!(payload.is_folder());
    }

    #[test]
    fn incomplete_urls_are_bad_requests() {
        for url in ["", "3f2a", "3f2a/", "/report.pdf"] {
            assert!(
                matches!(ExtractionPayload::for_file(url), Err(FunctionError::BadRequest(_))),
                "{url:?}"
            );
        }
        assert!(ExtractionPayload::for_folder("/images").is_err());
    }

    #[test]
    fn replies_resolve_to_urls() {
        let ok: FunctionReply =
            serde_json::from_value(json!({"success": true, "data": "https://x/y"})).unwrap();
        assert_eq!(ok.into_url().unwrap(), "https://x/y");

        let failed: FunctionReply =
            serde_json::from_value(json!({"success": false, "data": null})).unwrap();
        assert!(matches!(failed.into_url(), Err(FunctionError::Unsuccessful)));

        let empty: FunctionReply = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(empty.into_url().is_err());
    }

    #[tokio::test]
    async fn unconfigured_endpoints_fail_before_any_request() {
        let functions = HttpArchiveFunctions::new(reqwest::Client::new(), None, None, None);
        let payload = ExtractionPayload::for_folder("3f2a/images").unwrap();
        assert!(matches!(
            functions.invoke(&payload).await,
            Err(FunctionError::NotConfigured("folder"))
        ));
    }
}
