//! User storage seen from the identity layer.

use crate::error::RegistrationError;
use crate::user::User;
use async_trait::async_trait;
use pantry_core::UserId;
use tracing::{info, instrument};

/// Point lookups and inserts on the user table.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Error returned when storage cannot be read or written.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Finds a user by internal ID.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, Self::Error>;

    /// Finds a user by login name.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Self::Error>;

    /// Finds a user by email address.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Self::Error>;

    /// Stores a new user.
    async fn insert_user(&self, user: &User) -> Result<(), Self::Error>;

    /// Whether `error` is a uniqueness violation from `insert_user`.
    fn is_duplicate(&self, _error: &Self::Error) -> bool {
        false
    }
}

/// Registers a new user with a unique username and email.
///
/// # Errors
///
/// Returns `InvalidInput` for a blank username or an email without `@`,
/// `UsernameTaken`/`EmailTaken` for duplicates, and `DirectoryFailed` if
/// storage fails.
#[instrument(skip(directory))]
pub async fn register_user<D>(
    directory: &D,
    username: &str,
    email: &str,
) -> Result<User, RegistrationError>
where
    D: UserDirectory + ?Sized,
{
    let username = username.trim();
    let email = email.trim();

    if username.is_empty() {
        return Err(RegistrationError::InvalidInput {
            field: "username".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if !email.contains('@') {
        return Err(RegistrationError::InvalidInput {
            field: "email".to_string(),
            reason: "must be an email address".to_string(),
        });
    }

    let directory_failed = |e: D::Error| RegistrationError::DirectoryFailed {
        details: e.to_string(),
    };

    if directory
        .find_user_by_username(username)
        .await
        .map_err(directory_failed)?
        .is_some()
    {
        return Err(RegistrationError::UsernameTaken {
            username: username.to_string(),
        });
    }
    if directory
        .find_user_by_email(email)
        .await
        .map_err(directory_failed)?
        .is_some()
    {
        return Err(RegistrationError::EmailTaken {
            email: email.to_string(),
        });
    }

    let user = User::new(username.to_string(), email.to_string());
    if let Err(e) = directory.insert_user(&user).await {
        if !directory.is_duplicate(&e) {
            return Err(directory_failed(e));
        }
        // Another registration claimed the name or email after the checks above.
        let username_taken = directory
            .find_user_by_username(username)
            .await
            .map_err(directory_failed)?
            .is_some();
        return Err(if username_taken {
            RegistrationError::UsernameTaken {
                username: username.to_string(),
            }
        } else {
            RegistrationError::EmailTaken {
                email: email.to_string(),
            }
        });
    }

    info!(user_id = %user.id(), "registered user");
    Ok(user)
}
