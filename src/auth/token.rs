use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default token lifetime when none is configured.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// Errors produced while issuing or verifying tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The signature is valid but `exp` lies in the past.
    #[error("token has expired")]
    Expired,

    /// Malformed token, bad signature or otherwise unacceptable claims.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Encoding failed; not the caller's fault.
    #[error("failed to create token: {0}")]
    Create(String),
}

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Issues and verifies HS256 identity tokens.
///
/// Built once from configuration and shared read-only by every request.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact to the second.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Generates a token for `user_id` expiring `ttl` from now.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Create(format!("token lifetime {} is out of range", self.ttl)))?;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Create(e.to_string()))
    }

    /// Verifies the signature and expiry of `token` and returns its claims.
    ///
    /// Expired tokens are reported as [`TokenError::Expired`]; every other
    /// rejection is [`TokenError::Invalid`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration as StdDuration;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::days(DEFAULT_TOKEN_TTL_DAYS))
    }

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = service("test_secret_for_gen_verify");
        let user_id = Uuid::new_v4();
        let token = tokens.issue(user_id).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(
            claims.exp - claims.iat,
            Duration::days(DEFAULT_TOKEN_TTL_DAYS).num_seconds()
        );
    }

    #[test]
    fn test_token_expiration() {
        let tokens = TokenService::new("test_secret_for_expiration", Duration::seconds(1));
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        thread::sleep(StdDuration::from_secs(2));

        match tokens.verify(&token) {
            Err(TokenError::Expired) => {}
            other => panic!("expected an expired token, got {:?}", other),
        }
    }

    #[test]
    fn test_already_expired_claims_are_rejected() {
        let secret = "test_secret_for_expired_claims";
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: (past - Duration::hours(1)).timestamp(),
            exp: past.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(service(secret).verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = service("the_signing_secret").issue(Uuid::new_v4()).unwrap();

        match service("a_completely_different_secret").verify(&token) {
            Err(TokenError::Invalid(msg)) => assert!(msg.contains("InvalidSignature")),
            other => panic!("expected a signature failure, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert!(matches!(
            service("secret").verify("not.a.jwt"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_oversized_lifetime_is_an_error() {
        let ttl = Duration::try_days(100_000_000).unwrap();
        let tokens = TokenService::new("test_secret", ttl);

        assert!(matches!(
            tokens.issue(Uuid::new_v4()),
            Err(TokenError::Create(_))
        ));
    }
}
