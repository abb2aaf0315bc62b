use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{ServiceResult, account::AccountId};

/// Verified token payload: the account the token was issued for.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub sub: AccountId,
    pub email: String,
}

/// Bearer credential returned by register/login. `expires_at` is epoch
/// millis decoded from the token's own signed `exp` claim, so the two can
/// never disagree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub access_token: String,
    pub expires_at: i64,
}

pub type ArcTokenIssuer = Arc<Box<dyn TokenIssuer + Send + Sync + 'static>>;

pub trait TokenIssuer {
    fn generate_token(&self, sub: AccountId, email: &str) -> ServiceResult<AuthToken>;
    fn verify_token(&self, token: &str) -> ServiceResult<TokenClaims>;
}

#[derive(Default, Clone)]
pub struct MockTokenIssuer;

impl TokenIssuer for MockTokenIssuer {
    fn generate_token(&self, sub: AccountId, _email: &str) -> ServiceResult<AuthToken> {
        Ok(AuthToken {
            access_token: format!("Bearer test-token-{}", sub),
            expires_at: chrono::Utc::now().timestamp_millis() + 60_000,
        })
    }

    fn verify_token(&self, token: &str) -> ServiceResult<TokenClaims> {
        let sub = token
            .strip_prefix("Bearer test-token-")
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| crate::ServiceError::Unauthorized("Invalid token".into()))?;
        Ok(TokenClaims {
            sub,
            email: String::new(),
        })
    }
}
