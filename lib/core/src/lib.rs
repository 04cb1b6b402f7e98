//! Core domain types and utilities for the pantry catalogs.
//!
//! This crate provides the strongly-typed identifiers and the shared
//! `Result` alias used by the identity, authorization and catalog crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CommentId, IngredientId, ParseIdError, RecipeId, StepId, TeaId, UserId};
