//! Asaas payment gateway client
//!
//! Implements [`loyalty_core::gateway::PaymentGateway`] over the Asaas v3 REST API.

mod client;
mod config;
mod types;

pub use client::AsaasClient;
pub use config::{AsaasConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, sanitize_api_key};
