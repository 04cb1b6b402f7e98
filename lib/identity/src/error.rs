//! Error types for the identity crate.
//!
//! - `AuthenticationError`: the caller could not be identified
//! - `RegistrationError`: a new user could not be created
//!
//! Every `AuthenticationError` is an "unauthenticated" outcome. None of them
//! say anything about what the caller may do once identified; that is the
//! authorizer's job.

use std::fmt;

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No bearer credential was presented.
    MissingCredential,
    /// The credential could not be decoded or its signature is wrong.
    InvalidToken { reason: String },
    /// The credential was valid but has expired.
    TokenExpired,
    /// The credential's subject does not match any user.
    UserNotFound { subject: String },
    /// Login failed: unknown username.
    InvalidCredentials,
    /// A token could not be signed.
    TokenIssueFailed { reason: String },
    /// The user directory could not be read.
    DirectoryFailed { details: String },
}

impl AuthenticationError {
    /// Returns true if this failure came from an expired credential.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::TokenExpired)
    }
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => {
                write!(f, "not authenticated")
            }
            Self::InvalidToken { reason } => {
                write!(f, "could not decode token: {reason}")
            }
            Self::TokenExpired => {
                write!(f, "token has expired")
            }
            Self::UserNotFound { subject } => {
                write!(f, "user not found for subject: {subject}")
            }
            Self::InvalidCredentials => {
                write!(f, "invalid username or password")
            }
            Self::TokenIssueFailed { reason } => {
                write!(f, "failed to issue token: {reason}")
            }
            Self::DirectoryFailed { details } => {
                write!(f, "user directory error: {details}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from user registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The username is already registered.
    UsernameTaken { username: String },
    /// The email address is already registered.
    EmailTaken { email: String },
    /// A required field is missing or malformed.
    InvalidInput { field: String, reason: String },
    /// The user directory could not be read or written.
    DirectoryFailed { details: String },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsernameTaken { username } => {
                write!(f, "username '{username}' is already registered")
            }
            Self::EmailTaken { email } => {
                write!(f, "email '{email}' is already registered")
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "invalid {field}: {reason}")
            }
            Self::DirectoryFailed { details } => {
                write!(f, "user directory error: {details}")
            }
        }
    }
}

impl std::error::Error for RegistrationError {}
