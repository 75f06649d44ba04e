//! Data models shared by handlers and services.
//!
//! `object` and `link` map to SQLite rows via `sqlx::FromRow`; `envelope` and
//! `requests` describe the JSON wire format.

pub mod envelope;
pub mod link;
pub mod object;
pub mod requests;
