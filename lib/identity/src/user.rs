//! User domain type and related structures.
//!
//! A User is the owner at the end of every ownership chain. Users are
//! identified internally by their `UserId`; the username is what they log
//! in with.

use chrono::{DateTime, Utc};
use pantry_core::UserId;
use serde::{Deserialize, Serialize};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal user ID.
    id: UserId,
    /// Unique login name.
    username: String,
    /// Unique email address.
    email: String,
    /// When the user record was created.
    created_at: DateTime<Utc>,
    /// When the user record was last updated.
    updated_at: DateTime<Utc>,
}

/// The public part of a user, embedded in catalog views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// The user's login name.
    pub username: String,
    /// The user's email address.
    pub email: String,
}

impl User {
    /// Creates a new user with a generated ID.
    #[must_use]
    pub fn new(username: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username,
            email,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a user with all fields specified.
    ///
    /// Use this when reconstituting a user from storage.
    #[must_use]
    pub fn with_all_fields(
        id: UserId,
        username: String,
        email: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            created_at,
            updated_at,
        }
    }

    /// Returns the user's internal ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns when the user was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the user was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the public summary of this user.
    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}
