//! Authorization error types.

use std::fmt;

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The actor does not own the resource.
    PermissionDenied {
        /// The resource that was accessed.
        resource: String,
        /// Why the mutation was refused.
        reason: String,
    },
    /// The resource does not exist.
    NotFound {
        /// The resource that was looked up.
        resource: String,
    },
    /// A child resource points at a parent that does not exist.
    IntegrityFault {
        /// The child whose ownership chain is broken.
        child: String,
        /// The parent the child references.
        missing_parent: String,
    },
    /// The storage lookup failed.
    LookupFailed {
        /// Error details.
        details: String,
    },
    /// Invalid resource or target.
    InvalidInput {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied { resource, reason } => {
                write!(f, "{} on resource '{}'", reason, resource)
            }
            Self::NotFound { resource } => {
                write!(f, "resource '{}' not found", resource)
            }
            Self::IntegrityFault {
                child,
                missing_parent,
            } => {
                write!(
                    f,
                    "ownership chain broken: '{}' references missing '{}'",
                    child, missing_parent
                )
            }
            Self::LookupFailed { details } => {
                write!(f, "ownership lookup failed: {}", details)
            }
            Self::InvalidInput { details } => {
                write!(f, "invalid authorization input: {}", details)
            }
        }
    }
}

impl std::error::Error for AuthzError {}
