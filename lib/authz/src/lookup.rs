//! Storage lookups the authorizer depends on.

use crate::types::{ChildRef, TopLevelRef};
use async_trait::async_trait;
use pantry_core::UserId;

/// Point lookups along the ownership chain.
///
/// Implementations must read current storage state on every call; the
/// authorizer relies on this to never act on a stale owner.
#[async_trait]
pub trait OwnershipLookup: Send + Sync {
    /// Error returned when storage cannot be read.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the owning user of a top-level resource, or `None` if the
    /// resource does not exist.
    async fn owner_of(&self, resource: TopLevelRef) -> Result<Option<UserId>, Self::Error>;

    /// Returns the parent of a child resource, or `None` if the child does
    /// not exist.
    async fn parent_of(&self, resource: ChildRef) -> Result<Option<TopLevelRef>, Self::Error>;
}
