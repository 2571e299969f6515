//! Session credentials
//!
//! A [`SessionToken`] is passed explicitly into every operation that needs
//! to know the merchant; nothing reads it from ambient state.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use thiserror::Error;

/// Opaque bearer credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Parse an `Authorization` header value (`Bearer <token>`)
    pub fn from_bearer(header: &str) -> Option<Self> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Merchant resolved from a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantSession {
    pub merchant_id: String,
    /// Unix millis
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Not authenticated")]
    Missing,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Session expired")]
    Expired,
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Missing => AppError::not_authenticated(),
            SessionError::Invalid(reason) => AppError::invalid_token(format!("Invalid token: {reason}")),
            SessionError::Expired => AppError::session_expired(),
        }
    }
}

pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &SessionToken, now: i64) -> Result<MerchantSession, SessionError>;
}

/// Claims carried by dashboard tokens: base64 of `{"companyId", "exp"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "companyId")]
    pub company_id: String,
    /// Unix millis
    pub exp: i64,
}

impl SessionClaims {
    pub fn encode(&self) -> SessionToken {
        // serializing two plain fields cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        SessionToken(STANDARD.encode(json))
    }

    pub fn decode(token: &SessionToken) -> Result<Self, SessionError> {
        let bytes = STANDARD
            .decode(token.as_str())
            .map_err(|_| SessionError::Invalid("not base64".into()))?;
        serde_json::from_slice(&bytes).map_err(|e| SessionError::Invalid(e.to_string()))
    }
}

/// Resolver for the dashboard's base64 JSON tokens
#[derive(Debug, Clone, Default)]
pub struct TokenSessionResolver;

impl SessionResolver for TokenSessionResolver {
    fn resolve(&self, token: &SessionToken, now: i64) -> Result<MerchantSession, SessionError> {
        let claims = SessionClaims::decode(token)?;
        if claims.company_id.is_empty() {
            return Err(SessionError::Invalid("missing companyId".into()));
        }
        if claims.exp < now {
            return Err(SessionError::Expired);
        }
        Ok(MerchantSession {
            merchant_id: claims.company_id,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_from_bearer() {
        assert_eq!(
            SessionToken::from_bearer("Bearer abc").map(|t| t.0),
            Some("abc".to_string())
        );
        assert!(SessionToken::from_bearer("Basic abc").is_none());
        assert!(SessionToken::from_bearer("Bearer ").is_none());
    }

    #[test]
    fn test_resolve_valid_token() {
        let token = SessionClaims {
            company_id: "m-1".into(),
            exp: 2_000,
        }
        .encode();

        let session = TokenSessionResolver.resolve(&token, 1_000).unwrap();
        assert_eq!(session.merchant_id, "m-1");
        assert_eq!(session.expires_at, 2_000);
    }

    #[test]
    fn test_resolve_expired() {
        let token = SessionClaims {
            company_id: "m-1".into(),
            exp: 999,
        }
        .encode();
        assert_eq!(
            TokenSessionResolver.resolve(&token, 1_000),
            Err(SessionError::Expired)
        );
    }

    #[test]
    fn test_resolve_garbage() {
        let err = TokenSessionResolver
            .resolve(&SessionToken::new("%%%"), 0)
            .unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));

        let not_json = SessionToken::new(STANDARD.encode("hello"));
        assert!(matches!(
            TokenSessionResolver.resolve(&not_json, 0),
            Err(SessionError::Invalid(_))
        ));
    }

    #[test]
    fn test_decodes_dashboard_token_shape() {
        let raw = STANDARD.encode(r#"{"companyId":"abc-123","exp":1717416000000}"#);
        let claims = SessionClaims::decode(&SessionToken::new(raw)).unwrap();
        assert_eq!(claims.company_id, "abc-123");
        assert_eq!(claims.exp, 1_717_416_000_000);
    }

    #[test]
    fn test_error_mapping() {
        let err: AppError = SessionError::Expired.into();
        assert_eq!(err.code, ErrorCode::SessionExpired);
        assert!(err.requires_login());
        let err: AppError = SessionError::Missing.into();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
    }
}
