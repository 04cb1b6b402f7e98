//! Recipe and tea catalogs for pantry.
//!
//! Anyone may read. Creating a recipe or tea makes the caller its owner, and
//! from then on only that owner may change or delete it or anything beneath
//! it: steps and ingredients belong to a recipe, comments to a tea.
//!
//! # Example
//!
//! ```
//! use pantry_catalog::{Catalog, InMemoryCatalogStore, NewRecipe};
//! use pantry_identity::AuthConfig;
//!
//! # tokio_test_block(async {
//! let catalog = Catalog::new(InMemoryCatalogStore::new(), &AuthConfig::new("s3cret"));
//! catalog.register("alice", "alice@example.com").await.unwrap();
//! let token = catalog.login("alice").await.unwrap().token;
//! let alice = catalog
//!     .authenticate(Some(&format!("Bearer {token}")))
//!     .await
//!     .unwrap();
//!
//! let recipe = catalog
//!     .create_recipe(
//!         &alice,
//!         NewRecipe {
//!             title: "Soup".to_string(),
//!             recipe_type: "starter".to_string(),
//!             cuisine_tags: "any".to_string(),
//!             serves: 4,
//!             notes: String::new(),
//!         },
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(catalog.get_recipe(recipe.id).await.unwrap().user.username, "alice");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod patch;
pub mod postgres;
pub mod service;
pub mod store;

// Re-export main types at crate root
pub use config::StoreConfig;
pub use error::{CatalogError, StoreError, ValidationError};
pub use memory::InMemoryCatalogStore;
pub use model::{
    Comment, Ingredient, NewComment, NewIngredient, NewRecipe, NewStep, NewTea, Recipe,
    RecipeView, Step, Tea, TeaView,
};
pub use patch::{CommentPatch, IngredientPatch, RecipePatch, StepPatch, TeaPatch};
pub use postgres::PgCatalogStore;
pub use service::Catalog;
pub use store::CatalogStore;
