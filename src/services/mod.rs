pub mod mailer;
pub mod token_service;
pub mod user_service;
