//! The outcome of an ownership check.

use crate::error::AuthzError;
use crate::types::{ChildRef, ResourceRef, TopLevelRef};
use std::fmt;

/// Reason attached to every ownership denial.
pub const FORBIDDEN_REASON: &str = "operation forbidden";

/// Result of [`authorize_mutation`](crate::authorize_mutation).
///
/// `NotFound` and `Deny` are never merged: existence is decided before
/// ownership, and callers map the two to different responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The actor owns the resource.
    Allow,
    /// The actor is authenticated but does not own the resource.
    Deny {
        /// Why the mutation was refused.
        reason: String,
    },
    /// The target resource does not exist.
    NotFound {
        /// The resource that was looked up.
        resource: ResourceRef,
    },
    /// A stored child references a parent that does not exist.
    IntegrityFault {
        /// The child whose parent is missing.
        child: ChildRef,
        /// The parent the child references.
        missing_parent: TopLevelRef,
    },
}

impl Decision {
    /// Creates the standard ownership denial.
    #[must_use]
    pub fn forbidden() -> Self {
        Self::Deny {
            reason: FORBIDDEN_REASON.to_string(),
        }
    }

    /// Returns true if the mutation may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts the decision into an error for anything but `Allow`.
    ///
    /// `resource` names the target in the error message.
    pub fn require(self, resource: impl fmt::Display) -> Result<(), AuthzError> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny { reason } => Err(AuthzError::PermissionDenied {
                resource: resource.to_string(),
                reason,
            }),
            Self::NotFound { resource } => Err(AuthzError::NotFound {
                resource: resource.to_string(),
            }),
            Self::IntegrityFault {
                child,
                missing_parent,
            } => Err(AuthzError::IntegrityFault {
                child: child.to_string(),
                missing_parent: missing_parent.to_string(),
            }),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny { reason } => write!(f, "deny ({reason})"),
            Self::NotFound { resource } => write!(f, "not found ({resource})"),
            Self::IntegrityFault {
                child,
                missing_parent,
            } => write!(f, "integrity fault ({child} -> {missing_parent})"),
        }
    }
}
