//! Storage seen from the catalog.

use crate::error::StoreError;
use crate::model::{Comment, Ingredient, Recipe, Step, Tea};
use async_trait::async_trait;
use pantry_authz::OwnershipLookup;
use pantry_core::{CommentId, IngredientId, RecipeId, StepId, TeaId};
use pantry_identity::UserDirectory;

/// Point lookups, listings and writes for every catalog table.
///
/// A store also answers the authorizer's ownership lookups and the identity
/// resolver's user lookups, so one handle serves a whole catalog call.
///
/// Stores do not check ownership or parent existence; the catalog does that
/// before it writes. Uniqueness of recipe titles, tea names, usernames and
/// emails is enforced by the store and reported as `StoreError::Conflict`.
#[async_trait]
pub trait CatalogStore:
    OwnershipLookup<Error = StoreError> + UserDirectory<Error = StoreError>
{
    /// Lists all recipes.
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Finds a recipe by ID.
    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, StoreError>;

    /// Stores a new recipe.
    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), StoreError>;

    /// Overwrites an existing recipe's mutable fields.
    /// Returns false if it no longer exists.
    async fn update_recipe(&self, recipe: &Recipe) -> Result<bool, StoreError>;

    /// Deletes a recipe together with its steps and ingredients.
    ///
    /// Returns false if the recipe did not exist.
    async fn delete_recipe(&self, id: RecipeId) -> Result<bool, StoreError>;

    /// Lists all steps.
    async fn list_steps(&self) -> Result<Vec<Step>, StoreError>;

    /// Lists the steps of one recipe.
    async fn steps_of(&self, recipe: RecipeId) -> Result<Vec<Step>, StoreError>;

    /// Finds a step by ID.
    async fn get_step(&self, id: StepId) -> Result<Option<Step>, StoreError>;

    /// Stores a new step.
    async fn insert_step(&self, step: &Step) -> Result<(), StoreError>;

    /// Overwrites an existing step's mutable fields.
    /// Returns false if it no longer exists.
    async fn update_step(&self, step: &Step) -> Result<bool, StoreError>;

    /// Deletes a step. Returns false if it did not exist.
    async fn delete_step(&self, id: StepId) -> Result<bool, StoreError>;

    /// Lists all ingredients.
    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError>;

    /// Lists the ingredients of one recipe.
    async fn ingredients_of(&self, recipe: RecipeId) -> Result<Vec<Ingredient>, StoreError>;

    /// Finds an ingredient by ID.
    async fn get_ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError>;

    /// Stores a new ingredient.
    async fn insert_ingredient(&self, ingredient: &Ingredient) -> Result<(), StoreError>;

    /// Overwrites an existing ingredient's mutable fields.
    /// Returns false if it no longer exists.
    async fn update_ingredient(&self, ingredient: &Ingredient) -> Result<bool, StoreError>;

    /// Deletes an ingredient. Returns false if it did not exist.
    async fn delete_ingredient(&self, id: IngredientId) -> Result<bool, StoreError>;

    /// Lists all teas.
    async fn list_teas(&self) -> Result<Vec<Tea>, StoreError>;

    /// Finds a tea by ID.
    async fn get_tea(&self, id: TeaId) -> Result<Option<Tea>, StoreError>;

    /// Stores a new tea.
    async fn insert_tea(&self, tea: &Tea) -> Result<(), StoreError>;

    /// Overwrites an existing tea's mutable fields.
    /// Returns false if it no longer exists.
    async fn update_tea(&self, tea: &Tea) -> Result<bool, StoreError>;

    /// Deletes a tea together with its comments.
    ///
    /// Returns false if the tea did not exist.
    async fn delete_tea(&self, id: TeaId) -> Result<bool, StoreError>;

    /// Lists all comments.
    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError>;

    /// Lists the comments on one tea.
    async fn comments_of(&self, tea: TeaId) -> Result<Vec<Comment>, StoreError>;

    /// Finds a comment by ID.
    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError>;

    /// Stores a new comment.
    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError>;

    /// Overwrites an existing comment's content.
    /// Returns false if it no longer exists.
    async fn update_comment(&self, comment: &Comment) -> Result<bool, StoreError>;

    /// Deletes a comment. Returns false if it did not exist.
    async fn delete_comment(&self, id: CommentId) -> Result<bool, StoreError>;
}
