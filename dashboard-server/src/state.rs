//! Application state

use std::sync::Arc;

use asaas_client::AsaasClient;
use loyalty_core::checkout::CheckoutService;
use loyalty_core::gateway::PaymentGateway;
use loyalty_core::session::{SessionResolver, TokenSessionResolver};
use loyalty_core::store::MemoryStore;

use crate::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Checkout = CheckoutService<MemoryStore, dyn PaymentGateway, dyn SessionResolver>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub sessions: Arc<dyn SessionResolver>,
    pub checkout: Checkout,
}

impl AppState {
    pub fn new(
        store: Arc<MemoryStore>,
        gateway: Arc<dyn PaymentGateway>,
        sessions: Arc<dyn SessionResolver>,
    ) -> Self {
        let checkout = CheckoutService::new(store.clone(), gateway, sessions.clone());
        Self {
            store,
            sessions,
            checkout,
        }
    }

    /// Seeded store, Asaas gateway and the dashboard token resolver
    pub fn from_config(config: &Config) -> Result<Self, BoxError> {
        let store = match &config.seed_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read seed {path}: {e}"))?;
                let store = MemoryStore::from_json(&json)?;
                tracing::info!(path = %path, "In-memory store seeded");
                store
            }
            None => {
                tracing::warn!("SEED_PATH not set, starting with an empty store");
                MemoryStore::new()
            }
        };

        let gateway = AsaasClient::new(&config.asaas)?;
        tracing::info!(base_url = %gateway.base_url(), "Payment gateway configured");

        Ok(Self::new(
            Arc::new(store),
            Arc::new(gateway),
            Arc::new(TokenSessionResolver),
        ))
    }
}
