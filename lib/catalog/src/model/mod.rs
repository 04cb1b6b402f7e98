//! Catalog records, create payloads and read views.

pub mod recipe;
pub mod tea;

pub use recipe::{Ingredient, NewIngredient, NewRecipe, NewStep, Recipe, RecipeView, Step};
pub use tea::{Comment, NewComment, NewTea, Tea, TeaView};
