//! Identity for pantry: users, bearer tokens, and credential resolution.
//!
//! This crate provides:
//! - The `User` type and the `UserDirectory` storage trait
//! - HS256 bearer tokens (`TokenSigner`) configured by `AuthConfig`
//! - `IdentityResolver`, which turns a bearer credential into an
//!   `AuthenticatedUser` or an `AuthenticationError`
//!
//! Authentication only answers "who is calling". Whether that caller may
//! change a given resource is decided by `pantry-authz`.
//!
//! # Example
//!
//! ```
//! use pantry_identity::{AuthConfig, AuthenticationError, TokenSigner};
//! use pantry_core::UserId;
//!
//! let signer = TokenSigner::new(&AuthConfig::new("s3cret"));
//! let token = signer.issue(UserId::new()).unwrap();
//! assert!(signer.verify(&token).is_ok());
//! assert!(matches!(
//!     signer.verify("garbage"),
//!     Err(AuthenticationError::InvalidToken { .. })
//! ));
//! ```

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod resolver;
pub mod token;
pub mod user;

// Re-export main types at crate root
pub use auth::AuthenticatedUser;
pub use config::AuthConfig;
pub use directory::{UserDirectory, register_user};
pub use error::{AuthenticationError, RegistrationError};
pub use resolver::IdentityResolver;
pub use token::{TokenClaims, TokenSigner, UserToken, bearer_token};
pub use user::{User, UserSummary};
