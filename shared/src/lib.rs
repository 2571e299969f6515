//! Shared types for the loyalty dashboard
//!
//! Common types used across the core, the gateway client and the HTTP
//! surface: error types, money, Brazilian documents and persisted models.

pub mod document;
pub mod error;
pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use money::{Money, Percent};
pub use serde::{Deserialize, Serialize};
