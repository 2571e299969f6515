//! Dashboard server configuration

use asaas_client::AsaasConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP port
    pub http_port: u16,
    /// JSON seed for the in-memory store
    pub seed_path: Option<String>,
    /// Payment gateway
    pub asaas: AsaasConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            seed_path: std::env::var("SEED_PATH").ok().filter(|s| !s.is_empty()),
            asaas: AsaasConfig::from_env(&environment)?,
            environment,
        })
    }
}
