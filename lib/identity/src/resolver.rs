//! Bearer credential to authenticated user.

use crate::auth::AuthenticatedUser;
use crate::config::AuthConfig;
use crate::directory::UserDirectory;
use crate::error::AuthenticationError;
use crate::token::{TokenSigner, UserToken, bearer_token};
use pantry_core::UserId;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Resolves bearer credentials to users and issues tokens at login.
///
/// Nothing is cached: every call verifies the token and reloads the user.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    signer: TokenSigner,
}

impl IdentityResolver {
    /// Creates a resolver from configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            signer: TokenSigner::new(config),
        }
    }

    /// Returns the token signer.
    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Verifies `credential` and loads the user it names.
    ///
    /// # Errors
    ///
    /// Returns `InvalidToken` for an undecodable token or a subject that is
    /// not a user id, `TokenExpired` for an expired token, `UserNotFound` if
    /// the subject has no user record, and `DirectoryFailed` if storage
    /// fails.
    #[instrument(skip_all)]
    pub async fn resolve<D>(
        &self,
        directory: &D,
        credential: &str,
    ) -> Result<AuthenticatedUser, AuthenticationError>
    where
        D: UserDirectory + ?Sized,
    {
        let claims = self.signer.verify(credential).inspect_err(|e| {
            debug!(error = %e, "rejected bearer credential");
        })?;

        let user_id =
            UserId::from_str(&claims.sub).map_err(|e| AuthenticationError::InvalidToken {
                reason: e.to_string(),
            })?;

        let user = directory
            .find_user(user_id)
            .await
            .map_err(|e| AuthenticationError::DirectoryFailed {
                details: e.to_string(),
            })?
            .ok_or_else(|| AuthenticationError::UserNotFound {
                subject: claims.sub.clone(),
            })?;

        debug!(user_id = %user.id(), "resolved bearer credential");
        Ok(AuthenticatedUser::new(user, claims))
    }

    /// Resolves the value of an `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` if there is no bearer token, otherwise as
    /// [`resolve`](Self::resolve).
    pub async fn resolve_header<D>(
        &self,
        directory: &D,
        header: Option<&str>,
    ) -> Result<AuthenticatedUser, AuthenticationError>
    where
        D: UserDirectory + ?Sized,
    {
        let token = bearer_token(header)?;
        self.resolve(directory, token).await
    }

    /// Issues a token for the user with `username`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown username.
    #[instrument(skip(self, directory))]
    pub async fn login<D>(
        &self,
        directory: &D,
        username: &str,
    ) -> Result<UserToken, AuthenticationError>
    where
        D: UserDirectory + ?Sized,
    {
        let user = directory
            .find_user_by_username(username)
            .await
            .map_err(|e| AuthenticationError::DirectoryFailed {
                details: e.to_string(),
            })?
            .ok_or(AuthenticationError::InvalidCredentials)?;

        let token = self.signer.issue(user.id())?;
        debug!(user_id = %user.id(), "issued token");
        Ok(UserToken { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::register_user;
    use crate::error::RegistrationError;
    use crate::user::User;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::sync::Mutex;

    /// In-memory user directory for testing.
    #[derive(Default)]
    struct MemoryDirectory {
        users: Mutex<HashMap<UserId, User>>,
    }

    #[async_trait]
    impl UserDirectory for MemoryDirectory {
        type Error = Infallible;

        async fn find_user(&self, id: UserId) -> Result<Option<User>, Infallible> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Infallible> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.username() == username)
                .cloned())
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Infallible> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email() == email)
                .cloned())
        }

        async fn insert_user(&self, user: &User) -> Result<(), Infallible> {
            self.users.lock().unwrap().insert(user.id(), user.clone());
            Ok(())
        }
    }

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(&AuthConfig::new("test_secret_key"))
    }

    #[tokio::test]
    async fn login_then_resolve() {
        let directory = MemoryDirectory::default();
        let ben = register_user(&directory, "ben", "ben@example.com")
            .await
            .unwrap();
        let resolver = resolver();

        let UserToken { token } = resolver.login(&directory, "ben").await.unwrap();
        let header = format!("Bearer {token}");
        let actor = resolver
            .resolve_header(&directory, Some(&header))
            .await
            .unwrap();

        assert_eq!(actor.user_id(), ben.id());
        assert_eq!(actor.user().username(), "ben");
    }

    #[tokio::test]
    async fn login_with_unknown_username_fails() {
        let directory = MemoryDirectory::default();

        let result = resolver().login(&directory, "nobody").await;
        assert_eq!(result, Err(AuthenticationError::InvalidCredentials));
    }

    #[tokio::test]
    async fn expired_and_malformed_credentials_are_distinct() {
        let directory = MemoryDirectory::default();
        let ben = register_user(&directory, "ben", "ben@example.com")
            .await
            .unwrap();
        let resolver = resolver();

        let expired = resolver
            .signer()
            .issue_at(ben.id(), Utc::now() - Duration::days(2))
            .unwrap();
        let expired_result = resolver.resolve(&directory, &expired).await.unwrap_err();
        assert_eq!(expired_result, AuthenticationError::TokenExpired);
        assert_eq!(expired_result.to_string(), "token has expired");

        let forged = IdentityResolver::new(&AuthConfig::new("other_secret"))
            .signer()
            .issue(ben.id())
            .unwrap();
        let forged_result = resolver.resolve(&directory, &forged).await.unwrap_err();
        assert!(matches!(
            forged_result,
            AuthenticationError::InvalidToken { .. }
        ));
        assert!(!forged_result.is_expired());
    }

    #[tokio::test]
    async fn deleted_subject_is_unauthenticated() {
        let directory = MemoryDirectory::default();
        let resolver = resolver();
        let ghost = UserId::new();
        let token = resolver.signer().issue(ghost).unwrap();

        let result = resolver.resolve(&directory, &token).await;
        assert_eq!(
            result.unwrap_err(),
            AuthenticationError::UserNotFound {
                subject: ghost.to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let directory = MemoryDirectory::default();

        let result = resolver().resolve_header(&directory, None).await;
        assert_eq!(result.unwrap_err(), AuthenticationError::MissingCredential);
    }

    #[tokio::test]
    async fn registration_rejects_duplicates() {
        let directory = MemoryDirectory::default();
        register_user(&directory, "ben", "ben@example.com")
            .await
            .unwrap();

        let same_name = register_user(&directory, "ben", "other@example.com").await;
        assert!(matches!(
            same_name,
            Err(RegistrationError::UsernameTaken { .. })
        ));

        let same_email = register_user(&directory, "benny", "ben@example.com").await;
        assert!(matches!(
            same_email,
            Err(RegistrationError::EmailTaken { .. })
        ));
    }

    #[tokio::test]
    async fn registration_validates_fields() {
        let directory = MemoryDirectory::default();

        let blank = register_user(&directory, "  ", "ben@example.com").await;
        assert!(matches!(blank, Err(RegistrationError::InvalidInput { .. })));

        let bad_email = register_user(&directory, "ben", "not-an-email").await;
        assert!(matches!(
            bad_email,
            Err(RegistrationError::InvalidInput { .. })
        ));
    }
}
