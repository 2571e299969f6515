//! `AppError` and the JSON error body

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned by every fallible operation in the workspace
///
/// `message` is safe to show to the merchant. Upstream failures are logged
/// where they happen and never copied in here verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    /// Structured context (offending field, conflicting values, ...)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error carrying the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Missing or blank input field
    pub fn required(field: &str) -> Self {
        Self::with_message(ErrorCode::RequiredField, format!("{field} is required"))
            .with_detail("field", field)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{resource} not found"))
            .with_detail("resource", resource)
    }

    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn session_expired() -> Self {
        Self::new(ErrorCode::SessionExpired)
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidStateTransition, msg)
    }

    /// The user must log in again before retrying
    pub fn requires_login(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::NotAuthenticated | ErrorCode::TokenInvalid | ErrorCode::SessionExpired
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Response envelope
///
/// Errors always carry `code` and `message`; `data` is only set on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "Request failed with system error");
        }
        (self.http_status(), axum::Json(ApiResponse::<()>::error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::PlanNotFound);
        assert_eq!(err.message, ErrorCode::PlanNotFound.message());
        assert!(err.details.is_none());
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::with_message(ErrorCode::BalanceConflict, "Balance changed")
            .with_detail("quoted_redemption", "20.00")
            .with_detail("available_balance", "12.50");
        let details = err.details.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details["available_balance"], "12.50");
    }

    #[test]
    fn test_required_field() {
        let err = AppError::required("plan_id");
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert_eq!(err.message, "plan_id is required");
        assert_eq!(err.details.unwrap()["field"], "plan_id");
    }

    #[test]
    fn test_requires_login() {
        assert!(AppError::session_expired().requires_login());
        assert!(AppError::invalid_token("bad").requires_login());
        assert!(!AppError::new(ErrorCode::GatewayRejected).requires_login());
    }

    #[test]
    fn test_display_is_message() {
        let err = AppError::not_found("customer");
        assert_eq!(err.to_string(), "customer not found");
    }

    #[test]
    fn test_error_body() {
        let err = AppError::new(ErrorCode::MerchantNotRegistered);
        let body = serde_json::to_value(ApiResponse::<()>::error(&err)).unwrap();
        assert_eq!(body["code"], 3002);
        assert!(body.get("data").is_none());
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_success_body() {
        let body = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(body["code"], 0);
        assert_eq!(body["data"][1], 2);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::new(ErrorCode::BalanceConflict).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
