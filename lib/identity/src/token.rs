//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the user id as `sub` plus `iat` and `exp`
//! in Unix seconds. Verification runs with zero leeway so a token is
//! rejected as expired the moment `exp` has passed.

use crate::config::AuthConfig;
use crate::error::AuthenticationError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use pantry_core::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the user ID.
    pub sub: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenSigner {
    /// Creates a signer from configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.token_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetime: config.token_lifetime(),
        }
    }

    /// Issues a token for `user_id` valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenIssueFailed` if the claims cannot be signed.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthenticationError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token for `user_id` as if it had been issued at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `TokenIssueFailed` if the expiry is out of range or the claims
    /// cannot be signed.
    pub fn issue_at(
        &self,
        user_id: UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthenticationError> {
        let expires_at = issued_at.checked_add_signed(self.lifetime).ok_or_else(|| {
            AuthenticationError::TokenIssueFailed {
                reason: "token expiry is out of range".to_string(),
            }
        })?;
        let claims = TokenClaims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(
            |e| AuthenticationError::TokenIssueFailed {
                reason: e.to_string(),
            },
        )
    }

    /// Verifies a token's signature and expiry and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenExpired` for an expired token and `InvalidToken` for
    /// anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthenticationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthenticationError::TokenExpired,
                _ => AuthenticationError::InvalidToken {
                    reason: e.to_string(),
                },
            })
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Response to a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserToken {
    /// The signed bearer token.
    pub token: String,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// # Errors
///
/// Returns `MissingCredential` if the header is absent, uses another scheme,
/// or carries an empty token.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthenticationError> {
    let header = header.ok_or(AuthenticationError::MissingCredential)?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthenticationError::MissingCredential)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthenticationError::MissingCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthenticationError::MissingCredential);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(&AuthConfig::new(secret))
    }

    #[test]
    fn issue_and_verify() {
        let signer = signer("test_secret_key");
        let user_id = UserId::new();

        let token = signer.issue(user_id).unwrap();
        let claims = signer.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn garbage_is_invalid_not_expired() {
        let result = signer("test_secret_key").verify("not.a.token");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidToken { .. })
        ));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = signer("secret1").issue(UserId::new()).unwrap();

        let result = signer("secret2").verify(&token);
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidToken { .. })
        ));
    }

    #[test]
    fn past_expiry_is_expired() {
        let signer = signer("test_secret_key");
        let token = signer
            .issue_at(UserId::new(), Utc::now() - Duration::days(2))
            .unwrap();

        assert_eq!(signer.verify(&token), Err(AuthenticationError::TokenExpired));
    }

    #[test]
    fn expired_token_with_wrong_secret_is_invalid() {
        // Signature is checked before expiry.
        let token = signer("secret1")
            .issue_at(UserId::new(), Utc::now() - Duration::days(2))
            .unwrap();

        let result = signer("secret2").verify(&token);
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidToken { .. })
        ));
    }

    #[test]
    fn short_lifetime_token_is_fresh() {
        let config = AuthConfig::new("test_secret_key")
            .with_token_lifetime_minutes(1)
            .unwrap();
        let signer = TokenSigner::new(&config);

        let claims = signer.verify(&signer.issue(UserId::new()).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn unrepresentable_expiry_fails_to_issue() {
        let result = signer("test_secret_key").issue_at(UserId::new(), DateTime::<Utc>::MAX_UTC);
        assert!(matches!(
            result,
            Err(AuthenticationError::TokenIssueFailed { .. })
        ));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")), Ok("abc.def"));
        assert_eq!(bearer_token(Some("bearer abc")), Ok("abc"));
        assert_eq!(
            bearer_token(None),
            Err(AuthenticationError::MissingCredential)
        );
        assert_eq!(
            bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(AuthenticationError::MissingCredential)
        );
        assert_eq!(
            bearer_token(Some("Bearer ")),
            Err(AuthenticationError::MissingCredential)
        );
    }
}
