//! Dashboard HTTP server
//!
//! Thin axum surface over the loyalty core: cashback sales, subscription
//! usage and plan changes, and plan checkout through the payment gateway.

pub mod api;
pub mod auth;
pub mod config;
pub mod state;
