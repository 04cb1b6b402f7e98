//! The authenticated caller.

use crate::token::TokenClaims;
use crate::user::User;
use pantry_core::UserId;

/// A caller whose bearer token was verified and whose user record exists.
///
/// Catalog mutations take this instead of a bare `UserId` so they cannot be
/// called without going through identity resolution first.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The user record, freshly loaded for this request.
    user: User,
    /// The verified token claims.
    claims: TokenClaims,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user context.
    #[must_use]
    pub fn new(user: User, claims: TokenClaims) -> Self {
        Self { user, claims }
    }

    /// Returns the authenticated user's ID.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user.id()
    }

    /// Returns the user record.
    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Returns the verified claims.
    #[must_use]
    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticated_user_has_user_info() {
        let user = User::new("ben".to_string(), "ben@example.com".to_string());
        let claims = TokenClaims {
            sub: user.id().to_string(),
            iat: 0,
            exp: 60,
        };

        let auth_user = AuthenticatedUser::new(user.clone(), claims);

        assert_eq!(auth_user.user_id(), user.id());
        assert_eq!(auth_user.user().username(), "ben");
        assert_eq!(auth_user.claims().sub, user.id().to_string());
    }
}
