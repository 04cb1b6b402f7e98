//! Error types for the catalog crate.
//!
//! - `StoreError`: a storage backend could not complete a read or write
//! - `ValidationError`: a create payload or update patch was rejected
//! - `CatalogError`: the outcome of a catalog operation that did not succeed
//!
//! `CatalogError` keeps every refusal reason distinct. A caller must be able
//! to tell "you are not signed in" from "that does not exist" from "that is
//! not yours" from "the stored data is inconsistent".

use pantry_authz::{ChildRef, TopLevelRef};
use pantry_identity::{AuthenticationError, RegistrationError};
use std::fmt;

/// Errors from catalog storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint would be violated.
    Conflict { constraint: String },
    /// A stored row could not be decoded.
    Decode { details: String },
    /// The backend failed.
    Backend { details: String },
    /// An in-memory table lock was poisoned by a panicking writer.
    Poisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { constraint } => {
                write!(f, "unique constraint '{constraint}' violated")
            }
            Self::Decode { details } => {
                write!(f, "failed to decode stored row: {details}")
            }
            Self::Backend { details } => {
                write!(f, "storage error: {details}")
            }
            Self::Poisoned => write!(f, "storage lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

impl StoreError {
    /// Returns true if a uniqueness constraint was violated.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict {
                constraint: db.constraint().unwrap_or("unique").to_string(),
            },
            sqlx::Error::Decode(inner) => Self::Decode {
                details: inner.to_string(),
            },
            _ => Self::Backend {
                details: e.to_string(),
            },
        }
    }
}

/// A rejected payload or patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The patch is not a JSON object.
    NotAnObject,
    /// The field exists but may never be changed.
    ImmutableField { kind: String, field: String },
    /// The field is not part of the resource or has a value of the wrong type.
    InvalidField {
        kind: String,
        field: String,
        reason: String,
    },
    /// The field has a value of the right type that is not acceptable.
    InvalidValue { field: String, reason: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "patch must be a JSON object"),
            Self::ImmutableField { kind, field } => {
                write!(f, "field '{field}' of {kind} cannot be changed")
            }
            Self::InvalidField {
                kind,
                field,
                reason,
            } => {
                write!(f, "invalid field '{field}' for {kind}: {reason}")
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors from catalog operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The caller could not be identified.
    Unauthenticated(AuthenticationError),
    /// The resource does not exist.
    NotFound { resource: String },
    /// The caller does not own the resource.
    Forbidden { resource: String, reason: String },
    /// A stored child references a parent that does not exist.
    IntegrityFault {
        child: ChildRef,
        missing_parent: TopLevelRef,
    },
    /// The payload or patch was rejected.
    Validation(ValidationError),
    /// A unique title, name, username or email is already taken.
    Conflict { details: String },
    /// Storage failed.
    Storage { details: String },
}

impl CatalogError {
    /// Returns true if the caller was refused for not owning the resource.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Returns true if the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated(e) => write!(f, "{e}"),
            Self::NotFound { resource } => {
                write!(f, "{resource} not found")
            }
            Self::Forbidden { resource, reason } => {
                write!(f, "{reason} on {resource}")
            }
            Self::IntegrityFault {
                child,
                missing_parent,
            } => {
                write!(
                    f,
                    "integrity fault: {child} references missing {missing_parent}"
                )
            }
            Self::Validation(e) => write!(f, "{e}"),
            Self::Conflict { details } => write!(f, "conflict: {details}"),
            Self::Storage { details } => write!(f, "storage error: {details}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<AuthenticationError> for CatalogError {
    fn from(e: AuthenticationError) -> Self {
        match e {
            AuthenticationError::DirectoryFailed { details } => Self::Storage { details },
            other => Self::Unauthenticated(other),
        }
    }
}

impl From<RegistrationError> for CatalogError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::UsernameTaken { .. } | RegistrationError::EmailTaken { .. } => {
                Self::Conflict {
                    details: e.to_string(),
                }
            }
            RegistrationError::InvalidInput { field, reason } => {
                Self::Validation(ValidationError::InvalidValue { field, reason })
            }
            RegistrationError::DirectoryFailed { details } => Self::Storage { details },
        }
    }
}

impl From<ValidationError> for CatalogError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { .. } => Self::Conflict {
                details: e.to_string(),
            },
            other => Self::Storage {
                details: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_becomes_catalog_conflict() {
        let err: CatalogError = StoreError::Conflict {
            constraint: "recipes_title_key".to_string(),
        }
        .into();
        assert!(matches!(err, CatalogError::Conflict { .. }));
        assert!(err.to_string().contains("recipes_title_key"));
    }

    #[test]
    fn expired_credential_stays_unauthenticated() {
        let err: CatalogError = AuthenticationError::TokenExpired.into();
        assert_eq!(
            err,
            CatalogError::Unauthenticated(AuthenticationError::TokenExpired)
        );
    }

    #[test]
    fn forbidden_display() {
        let err = CatalogError::Forbidden {
            resource: "recipe:rcp_1".to_string(),
            reason: "operation forbidden".to_string(),
        };
        assert!(err.is_forbidden());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "operation forbidden on recipe:rcp_1");
    }
}
