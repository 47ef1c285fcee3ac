//! Signed access/refresh token pairs (HS256 JWT).

use anyhow::anyhow;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        TokenIssuer {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    pub fn issue_pair(&self, user_id: i64) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenType::Access)?,
            refresh: self.issue(user_id, TokenType::Refresh)?,
        })
    }

    pub fn issue(&self, user_id: i64, token_type: TokenType) -> Result<String, AppError> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow!("failed to sign token: {e}")))
    }

    /// Checks signature, expiry and token type; returns the user id.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<i64, AppError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!("Rejected token: {e}");
                AppError::Unauthorized("Token is invalid or expired".to_string())
            })?;
        if data.claims.token_type != expected {
            return Err(AppError::Unauthorized("Token has wrong type".to_string()));
        }
        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| {
                AppError::Unauthorized(
                    "Token contained no recognizable user identification".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("secret", Duration::minutes(5), Duration::days(1))
    }

    #[test]
    fn test_pair_verifies_by_type() {
        let issuer = issuer();
        let pair = issuer.issue_pair(42).unwrap();
        assert_eq!(issuer.verify(&pair.access, TokenType::Access).unwrap(), 42);
        assert_eq!(issuer.verify(&pair.refresh, TokenType::Refresh).unwrap(), 42);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let issuer = issuer();
        let pair = issuer.issue_pair(42).unwrap();
        assert!(matches!(
            issuer.verify(&pair.refresh, TokenType::Access),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new("secret", Duration::minutes(-10), Duration::days(1));
        let token = issuer.issue(1, TokenType::Access).unwrap();
        assert!(issuer.verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let token = TokenIssuer::new("other", Duration::minutes(5), Duration::days(1))
            .issue(1, TokenType::Access)
            .unwrap();
        assert!(issuer().verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(issuer().verify("not.a.jwt", TokenType::Access).is_err());
    }
}
