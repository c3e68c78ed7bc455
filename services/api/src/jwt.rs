//! JWT issuing and validation
//!
//! Session tokens are stateless: a signed claim set binding the account's
//! username with issue and expiry timestamps. Validity is determined purely
//! by signature and expiry — there is no server-side session table.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::error::{ApiError, ApiResult};

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Token expiration time in seconds
    pub token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: signing secret; the service refuses to start without it
    /// - `JWT_TOKEN_EXPIRY`: token expiry in seconds (default: 86400)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_expiry = std::env::var("JWT_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        Ok(JwtConfig {
            secret,
            token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued for
    pub sub: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Reason a token failed validation
///
/// Both variants surface as the same generic response; the split exists for
/// logging and for the error taxonomy.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            token_expiry: config.token_expiry,
        }
    }

    /// Issue a token for a verified account identity
    pub fn issue(&self, username: &str) -> ApiResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| {
                tracing::error!("Failed to get current time: {}", e);
                ApiError::Internal
            })?
            .as_secs();

        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.token_expiry,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            ApiError::Internal
        })
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Get the token expiry time in seconds
    pub fn token_expiry(&self) -> u64 {
        self.token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-for-unit-tests".to_string(),
            token_expiry: 3600,
        })
    }

    #[test]
    fn test_issued_token_resolves_to_its_subject() {
        let service = service();
        let token = service.issue("alice12").unwrap();
        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.sub, "alice12");
        assert_ne!(claims.sub, "bob");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn test_expired_token_is_rejected_as_expired() {
        let service = service();

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        // Well past the default validation leeway.
        let claims = Claims {
            sub: "alice12".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-for-unit-tests".as_bytes()),
        )
        .unwrap();

        assert_eq!(service.validate(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_tampered_token_is_rejected_as_invalid() {
        let service = service();
        let token = service.issue("alice12").unwrap();

        // Swap in a forged payload while keeping the original signature.
        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.eyJzdWIiOiJtYWxsb3J5In0.{}", parts[0], parts[2]);

        assert_eq!(service.validate(&tampered).unwrap_err(), TokenError::Invalid);
        assert_eq!(service.validate("not.a.token").unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let service = service();
        let other = JwtService::new(JwtConfig {
            secret: "a-different-secret".to_string(),
            token_expiry: 3600,
        });

        let token = other.issue("alice12").unwrap();
        assert_eq!(service.validate(&token).unwrap_err(), TokenError::Invalid);
    }
}
