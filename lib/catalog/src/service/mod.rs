//! The catalog service: reads for anyone, ownership-gated writes.
//!
//! Every create, update and delete runs the authorizer first, against the
//! target itself or, for a new child, against the parent named in the
//! payload. Updates then validate the patch, and only then write. Reads never
//! consult the authorizer.

mod recipes;
mod teas;

use crate::error::CatalogError;
use crate::store::CatalogStore;
use pantry_authz::{AuthzError, Decision, Target, authorize_mutation};
use pantry_identity::{
    AuthConfig, AuthenticatedUser, IdentityResolver, User, UserToken, register_user,
};
use rootcause::prelude::Report;
use tracing::{debug, error, instrument};

/// Recipe and tea catalogs over a storage handle.
#[derive(Debug)]
pub struct Catalog<S> {
    store: S,
    identity: IdentityResolver,
}

impl<S: CatalogStore> Catalog<S> {
    /// Creates a catalog over `store`, issuing and checking tokens per
    /// `auth`.
    #[must_use]
    pub fn new(store: S, auth: &AuthConfig) -> Self {
        Self {
            store,
            identity: IdentityResolver::new(auth),
        }
    }

    /// Returns the storage handle.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the identity resolver.
    #[must_use]
    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    /// Resolves an `Authorization` header value to the calling user.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` if the header is missing, the token is
    /// invalid or expired, or its user no longer exists.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedUser, CatalogError> {
        Ok(self
            .identity
            .resolve_header(&self.store, authorization)
            .await?)
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` for a taken username or email and `Validation` for
    /// malformed input.
    pub async fn register(&self, username: &str, email: &str) -> Result<User, CatalogError> {
        Ok(register_user(&self.store, username, email).await?)
    }

    /// Issues a bearer token for `username`.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` for an unknown username.
    pub async fn login(&self, username: &str) -> Result<UserToken, CatalogError> {
        Ok(self.identity.login(&self.store, username).await?)
    }

    /// Runs the ownership gate for a mutation.
    #[instrument(skip_all, fields(actor = %actor.user_id(), target = %target))]
    async fn authorize(
        &self,
        actor: &AuthenticatedUser,
        target: Target,
    ) -> Result<(), CatalogError> {
        let decision = authorize_mutation(&self.store, actor.user_id(), &target)
            .await
            .map_err(lookup_failed)?;

        match decision {
            Decision::Allow => Ok(()),
            Decision::Deny { reason } => {
                debug!(reason = %reason, "mutation refused");
                Err(CatalogError::Forbidden {
                    resource: target.to_string(),
                    reason,
                })
            }
            Decision::NotFound { resource } => Err(CatalogError::NotFound {
                resource: resource.to_string(),
            }),
            Decision::IntegrityFault {
                child,
                missing_parent,
            } => Err(CatalogError::IntegrityFault {
                child,
                missing_parent,
            }),
        }
    }
}

fn lookup_failed(report: Report<AuthzError>) -> CatalogError {
    error!(error = %report, "ownership lookup failed");
    CatalogError::Storage {
        details: report.to_string(),
    }
}

fn not_found(resource: impl std::fmt::Display) -> CatalogError {
    CatalogError::NotFound {
        resource: resource.to_string(),
    }
}
