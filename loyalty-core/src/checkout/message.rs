use shared::error::{AppError, ErrorCategory, ErrorCode};

pub const RETRY_MESSAGE: &str = "Connection error. Please try again.";
pub const LOGIN_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Message shown to the user for a failed checkout step
///
/// Gateway validation errors and onboarding problems are shown as-is;
/// transport and system failures collapse into a generic retry message.
pub fn user_message(err: &AppError) -> String {
    if err.requires_login() {
        return LOGIN_MESSAGE.to_string();
    }
    if err.code.category() == ErrorCategory::System || err.code == ErrorCode::Unknown {
        return RETRY_MESSAGE.to_string();
    }
    if err.message.trim().is_empty() {
        return err.code.message().to_string();
    }
    err.message.clone()
}
