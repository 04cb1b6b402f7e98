//! Ownership-scoped authorization for pantry.
//!
//! Every mutating catalog operation is gated on a single question: is the
//! actor the user at the end of the resource's ownership chain? Top-level
//! resources (recipes, teas) carry their owner directly. Child resources
//! (steps, ingredients, comments) carry only a parent foreign key, so their
//! owner is found one hop further up.
//!
//! The authorizer is stateless. Storage is reached through an
//! [`OwnershipLookup`] handle passed into every call, and nothing is cached
//! between calls.

mod authorizer;
mod decision;
mod error;
mod lookup;
mod types;

pub use authorizer::{OwnerResolution, authorize_mutation, resolve_owner};
pub use decision::{Decision, FORBIDDEN_REASON};
pub use error::AuthzError;
pub use lookup::OwnershipLookup;
pub use types::{ChildRef, ResourceKind, ResourceRef, Target, TopLevelRef};
