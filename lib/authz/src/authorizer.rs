//! Ownership chain resolution and the mutation gate.

use crate::decision::Decision;
use crate::error::AuthzError;
use crate::lookup::OwnershipLookup;
use crate::types::{ChildRef, ResourceRef, Target, TopLevelRef};
use pantry_core::UserId;
use tracing::{debug, error, instrument};

/// Where an ownership chain ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerResolution {
    /// The chain ends at this user.
    Owned(UserId),
    /// The starting resource does not exist.
    Missing,
    /// The starting child exists but its parent does not.
    Orphaned {
        /// The child whose parent is missing.
        child: ChildRef,
        /// The parent it references.
        missing_parent: TopLevelRef,
    },
}

/// Walks a resource's ownership chain to its owning user.
///
/// Each nesting level costs exactly one lookup: a top-level resource is read
/// once for its owner, a child is read once for its parent and the parent is
/// then read for its owner.
pub async fn resolve_owner<L>(
    lookup: &L,
    resource: ResourceRef,
) -> pantry_core::Result<OwnerResolution, AuthzError>
where
    L: OwnershipLookup + ?Sized,
{
    let mut current = resource;
    let mut via: Option<ChildRef> = None;

    loop {
        match current {
            ResourceRef::TopLevel(top) => {
                let owner = lookup
                    .owner_of(top)
                    .await
                    .map_err(|e| AuthzError::LookupFailed {
                        details: e.to_string(),
                    })?;

                return Ok(match (owner, via) {
                    (Some(owner), _) => OwnerResolution::Owned(owner),
                    (None, None) => OwnerResolution::Missing,
                    (None, Some(child)) => OwnerResolution::Orphaned {
                        child,
                        missing_parent: top,
                    },
                });
            }
            ResourceRef::Child(child) => {
                let parent =
                    lookup
                        .parent_of(child)
                        .await
                        .map_err(|e| AuthzError::LookupFailed {
                            details: e.to_string(),
                        })?;

                let Some(parent) = parent else {
                    return Ok(OwnerResolution::Missing);
                };
                via = Some(child);
                current = ResourceRef::TopLevel(parent);
            }
        }
    }
}

/// Decides whether `actor` may create, update or delete `target`.
///
/// Existence is checked before ownership, so a missing target is always
/// `NotFound` whoever asks. Storage failures are returned as errors, never
/// as a decision.
///
/// # Errors
///
/// Returns `LookupFailed` if storage cannot be read, or `InvalidInput` if a
/// new-child target names a parent of the wrong kind.
#[instrument(skip_all, fields(actor = %actor, target = %target))]
pub async fn authorize_mutation<L>(
    lookup: &L,
    actor: UserId,
    target: &Target,
) -> pantry_core::Result<Decision, AuthzError>
where
    L: OwnershipLookup + ?Sized,
{
    let (resource, resolution) = match *target {
        Target::Existing(resource) => (resource, resolve_owner(lookup, resource).await?),
        Target::NewChild { kind, parent } => {
            if kind.parent_kind() != Some(parent.kind()) {
                return Err(AuthzError::InvalidInput {
                    details: format!("a {kind} cannot be created under a {}", parent.kind()),
                }
                .into());
            }
            let resource = ResourceRef::TopLevel(parent);
            (resource, resolve_owner(lookup, resource).await?)
        }
    };

    let decision = match resolution {
        OwnerResolution::Owned(owner) if owner == actor => Decision::Allow,
        OwnerResolution::Owned(_) => Decision::forbidden(),
        OwnerResolution::Missing => Decision::NotFound { resource },
        OwnerResolution::Orphaned {
            child,
            missing_parent,
        } => {
            error!(
                child = %child,
                missing_parent = %missing_parent,
                "ownership chain references a missing parent"
            );
            Decision::IntegrityFault {
                child,
                missing_parent,
            }
        }
    };

    debug!(decision = %decision, "ownership decision");
    Ok(decision)
}
