//! Data models
//!
//! Shared between the core, the gateway client and the HTTP surface.
//! IDs are opaque strings; timestamps are UTC milliseconds.

pub mod customer;
pub mod merchant;
pub mod payment;
pub mod plan;
pub mod sale;
pub mod subscription;

// Re-exports
pub use customer::*;
pub use merchant::*;
pub use payment::*;
pub use plan::*;
pub use sale::*;
pub use subscription::*;
