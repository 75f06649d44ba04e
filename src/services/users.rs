//! User lookup against a Supabase-compatible auth admin API.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Users requested per admin API page.
const PAGE_SIZE: usize = 200;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no user registered with email `{0}`")]
    NotFound(String),
    #[error("auth provider is not configured")]
    NotConfigured,
    #[error("auth provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPage {
    #[serde(default)]
    users: Vec<AuthUser>,
}

/// Find the user in one page of results. Emails compare case-insensitively.
fn find_in_page<'a>(users: &'a [AuthUser], email: &str) -> Option<&'a AuthUser> {
    users.iter().find(|user| {
        user.email
            .as_deref()
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(email))
    })
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_id(&self, email: &str) -> Result<String, DirectoryError>;
}

#[derive(Clone)]
pub struct SupabaseUserDirectory {
    client: reqwest::Client,
    base_url: Option<String>,
    service_key: Option<String>,
}

impl SupabaseUserDirectory {
    pub fn new(
        client: reqwest::Client,
        base_url: Option<String>,
        service_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            service_key,
        }
    }
}

#[async_trait]
impl UserDirectory for SupabaseUserDirectory {
    /// Walk the admin user listing page by page until the email shows up or a
    /// short page marks the end.
    async fn find_user_id(&self, email: &str) -> Result<String, DirectoryError> {
        let (Some(base_url), Some(key)) = (self.base_url.as_deref(), self.service_key.as_deref())
        else {
            return Err(DirectoryError::NotConfigured);
        };
        let url = format!("{}/auth/v1/admin/users", base_url.trim_end_matches('/'));

        let mut page_number = 1usize;
        loop {
            let page: UserPage = self
                .client
                .get(&url)
                .query(&[("page", page_number), ("per_page", PAGE_SIZE)])
                .header("apikey", key)
                .bearer_auth(key)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            debug!("user page {} returned {} users", page_number, page.users.len());

            if let Some(user) = find_in_page(&page.users, email) {
                return Ok(user.id.clone());
            }
            if page.users.len() < PAGE_SIZE {
                return Err(DirectoryError::NotFound(email.to_string()));
            }
            page_number += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, email: Option<&str>) -> AuthUser {
        AuthUser {
            id: id.into(),
            email: email.map(Into::into),
        }
    }

    #[test]
    fn lookup_ignores_case_and_missing_emails() {
        let users = vec![
            user("1", None),
            user("2", Some("ada@example.com")),
            user("3", Some("Bob@Example.com")),
        ];
        assert_eq!(find_in_page(&users, "bob@example.com").unwrap().id, "3");
        assert_eq!(find_in_page(&users, "ADA@example.com").unwrap().id, "2");
        assert!(find_in_page(&users, "eve@example.com").is_none());
    }

    #[test]
    fn pages_tolerate_extra_fields() {
        let page: UserPage = serde_json::from_value(serde_json::json!({
            "users": [{"id": "u-1", "email": "a@b.c", "role": "authenticated"}],
            "aud": "authenticated"
        }))
        .unwrap();
        assert_eq!(page.users.len(), 1);
    }

    #[tokio::test]
    async fn unconfigured_directory_fails_fast() {
        let directory = SupabaseUserDirectory::new(reqwest::Client::new(), None, None);
        assert!(matches!(
            directory.find_user_id("a@b.c").await,
            Err(DirectoryError::NotConfigured)
        ));
    }
}
