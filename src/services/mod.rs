pub mod functions;
pub mod mailer;
pub mod storage;
pub mod templates;
pub mod uploads;
pub mod users;
pub mod zip;
