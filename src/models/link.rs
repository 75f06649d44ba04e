//! Time-limited read grant issued by the local store.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The columns of a `download_links` row needed to serve it; the row is keyed
/// by the random token embedded in the link URL.
#[derive(Clone, FromRow, Debug)]
pub struct DownloadLink {
    /// Object the link grants access to.
    pub object_name: String,

    pub expires_at: DateTime<Utc>,
}

impl DownloadLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
