//! Access token service.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use verdant_common::{AppError, AppResult, config::AuthConfig};

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID as a string.
    pub sub: String,
    /// Expiration time (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
}

impl Claims {
    /// Create claims for `user_id` expiring after `expires_in`.
    #[must_use]
    pub fn new(user_id: i32, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// The user ID carried in the subject.
    pub fn user_id(&self) -> AppResult<i32> {
        self.sub
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid user ID".to_string()))
    }
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service signing with `secret`.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            ttl,
        }
    }

    /// Create a token service from the auth configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let ttl = i64::try_from(config.token_ttl_secs)
            .unwrap_or(i64::MAX)
            .min(i64::from(u32::MAX));
        Self::new(config.jwt_secret.as_bytes(), Duration::seconds(ttl))
    }

    /// Issue a token for a user.
    pub fn issue(&self, user_id: i32) -> AppResult<String> {
        self.encode(&Claims::new(user_id, self.ttl))
    }

    /// Sign arbitrary claims.
    pub fn encode(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret", Duration::minutes(15))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens.issue(42).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.user_id().unwrap(), 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token() {
        let tokens = service();
        let claims = Claims::new(1, Duration::hours(-2));
        let token = tokens.encode(&claims).unwrap();

        let err = tokens.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg == "Token has expired"));
    }

    #[test]
    fn test_wrong_secret() {
        let token = service().issue(1).unwrap();
        let other = TokenService::new(b"another-secret", Duration::minutes(15));

        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg == "Invalid token"));
    }

    #[test]
    fn test_garbage_token() {
        assert!(service().verify("not.a.token").is_err());
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "abc".to_string(),
            exp: 0,
            iat: 0,
        };
        let err = claims.user_id().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Invalid user ID"));
    }

    #[test]
    fn test_from_config_uses_ttl() {
        let config = AuthConfig {
            jwt_secret: "s3cret".to_string(),
            secret_key: "k".to_string(),
            token_ttl_secs: 60,
        };
        let tokens = TokenService::from_config(&config);
        let claims = tokens.verify(&tokens.issue(5).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 60);
    }
}
