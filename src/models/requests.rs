//! JSON request bodies. Field names follow the camelCase wire format used by
//! the existing web clients.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNameReq {
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUrlReq {
    /// `<archive key>/<path inside the archive>`
    pub file_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderUrlReq {
    /// `<archive key>/<folder inside the archive>`
    pub folder_url: String,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationMailReq {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationMailReq {
    pub email: String,
    /// `"approve"` approves; any other value rejects.
    #[serde(rename = "type")]
    pub decision: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationMailReq {
    pub email: String,
    pub item_name: String,
    pub item_type: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailLookupReq {
    pub email: String,
}
