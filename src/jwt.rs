use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use grid_wars_domain::{
    ServiceError, ServiceResult,
    token::{AuthToken, TokenClaims, TokenIssuer},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{api::response::ApiError, app::AppState};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    exp: usize,
}

pub struct JwtAuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: chrono::Duration,
}

impl JwtAuthService {
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl TokenIssuer for JwtAuthService {
    fn generate_token(&self, sub: Uuid, email: &str) -> ServiceResult<AuthToken> {
        let exp = (chrono::Utc::now() + self.ttl).timestamp() as usize;
        let claims = Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            exp,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("Failed to sign token: {e}")))?;
        Ok(AuthToken {
            access_token: format!("Bearer {token}"),
            // Expiry is derived from the signed claim, in milliseconds.
            expires_at: exp as i64 * 1000,
        })
    }

    fn verify_token(&self, token: &str) -> ServiceResult<TokenClaims> {
        let raw = token.strip_prefix("Bearer ").unwrap_or(token);
        let token_data = decode::<Claims>(raw, &self.decoding, &Validation::default())
            .map_err(|_| ServiceError::Unauthorized("Invalid token".to_string()))?;
        let sub = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid token".to_string()))?;
        Ok(TokenClaims {
            sub,
            email: token_data.claims.email,
        })
    }
}

/// Extracts and verifies the bearer token of the current request.
pub struct AuthUser(pub TokenClaims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| {
                ApiError::new(
                    ServiceError::Unauthorized("Missing authorization header".to_string()),
                    path.clone(),
                )
            })?;
        let claims = state
            .token_issuer
            .verify_token(bearer.token())
            .map_err(|e| ApiError::new(e, path.clone()))?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtAuthService {
        JwtAuthService::new(b"test-secret", chrono::Duration::hours(1))
    }

    #[test]
    fn test_token_roundtrip() {
        let service = service();
        let sub = Uuid::new_v4();
        let token = service.generate_token(sub, "a@b.com").unwrap();
        assert!(token.access_token.starts_with("Bearer "));

        let claims = service.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.email, "a@b.com");

        let raw = token.access_token.strip_prefix("Bearer ").unwrap();
        let claims = service.verify_token(raw).unwrap();
        assert_eq!(claims.sub, sub);
    }

    #[test]
    fn test_expiry_matches_signed_claim() {
        let service = service();
        let token = service.generate_token(Uuid::new_v4(), "a@b.com").unwrap();
        let raw = token.access_token.strip_prefix("Bearer ").unwrap();
        let decoding = DecodingKey::from_secret(b"test-secret");
        let data = decode::<Claims>(raw, &decoding, &Validation::default()).unwrap();
        assert_eq!(token.expires_at, data.claims.exp as i64 * 1000);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let token = service.generate_token(Uuid::new_v4(), "a@b.com").unwrap();
        let mut tampered = token.access_token.clone();
        tampered.push('x');
        assert!(service.verify_token(&tampered).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = service();
        let other = JwtAuthService::new(b"other-secret", chrono::Duration::hours(1));
        let token = service.generate_token(Uuid::new_v4(), "a@b.com").unwrap();
        assert!(other.verify_token(&token.access_token).is_err());
    }
}
