//! Error handling shared by every crate in the workspace
//!
//! An [`AppError`] pairs an [`ErrorCode`] with a user-facing message. The
//! HTTP layer turns it into an [`ApiResponse`] body with the status from
//! [`ErrorCode::http_status`].
//!
//! ```
//! use shared::error::{ApiResponse, AppError, ErrorCategory, ErrorCode};
//!
//! let err = AppError::required("plan_id");
//! assert_eq!(err.code.category(), ErrorCategory::General);
//!
//! let body = ApiResponse::<()>::error(&err);
//! assert_eq!(body.code, Some(ErrorCode::RequiredField.code()));
//! assert_eq!(body.message, "plan_id is required");
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
