//! Gateway client configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_BASE_URL: &str = "https://sandbox.asaas.com/api/v3";
pub const DEFAULT_USER_AGENT: &str = "mibe-loja-app/1.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct AsaasConfig {
    /// Sent as the `access_token` header
    pub api_key: String,
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

// Keeps the key out of logs
impl std::fmt::Debug for AsaasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsaasConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Production keys start with `$aact_`; env files often lose the `$`
pub fn sanitize_api_key(key: &str) -> String {
    let key = key.trim();
    if key.starts_with("aact_") {
        format!("${key}")
    } else {
        key.to_string()
    }
}

impl AsaasConfig {
    pub fn new(api_key: impl AsRef<str>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: sanitize_api_key(api_key.as_ref()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Load from `ASAAS_*` environment variables
    ///
    /// The API key is required outside development.
    pub fn from_env(environment: &str) -> Result<Self, BoxError> {
        let api_key = match std::env::var("ASAAS_API_KEY") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                if environment != "development" {
                    return Err(format!("ASAAS_API_KEY must be set in {environment} environment").into());
                }
                "dev-ASAAS_API_KEY-not-for-production".to_string()
            }
        };

        let base_url =
            std::env::var("ASAAS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = std::env::var("ASAAS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let user_agent =
            std::env::var("ASAAS_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            user_agent,
            ..Self::new(api_key, base_url).with_timeout(timeout_secs)
        })
    }
}
