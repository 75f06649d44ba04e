pub mod email_handlers;
pub mod file_handlers;
pub mod health_handlers;
pub mod link_handlers;
pub mod user_handlers;
pub mod zip_handlers;
