//! Recipes and the steps and ingredients that belong to them.

use pantry_core::{IngredientId, RecipeId, StepId, UserId};
use pantry_identity::UserSummary;
use serde::{Deserialize, Serialize};

/// A recipe record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe ID.
    pub id: RecipeId,
    /// Unique title.
    pub title: String,
    /// Kind of dish, e.g. "dessert".
    pub recipe_type: String,
    /// Free-form cuisine tags.
    pub cuisine_tags: String,
    /// Number of people the recipe serves.
    pub serves: i32,
    /// Free-form notes.
    pub notes: String,
    /// The owning user. Set at creation and never changed.
    pub user_id: UserId,
}

impl Recipe {
    /// Creates a recipe owned by `owner` with a generated ID.
    #[must_use]
    pub fn new(new: NewRecipe, owner: UserId) -> Self {
        Self {
            id: RecipeId::new(),
            title: new.title,
            recipe_type: new.recipe_type,
            cuisine_tags: new.cuisine_tags,
            serves: new.serves,
            notes: new.notes,
            user_id: owner,
        }
    }
}

/// Payload for creating a recipe. The owner comes from the caller, never
/// from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRecipe {
    pub title: String,
    pub recipe_type: String,
    pub cuisine_tags: String,
    pub serves: i32,
    pub notes: String,
}

/// A step of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step ID.
    pub id: StepId,
    /// Position of the step within its recipe.
    pub step_order: i32,
    /// What to do.
    pub step_details: String,
    /// The recipe this step belongs to.
    pub recipe_id: RecipeId,
}

impl Step {
    /// Creates a step with a generated ID.
    #[must_use]
    pub fn new(new: NewStep) -> Self {
        Self {
            id: StepId::new(),
            step_order: new.step_order,
            step_details: new.step_details,
            recipe_id: new.recipe_id,
        }
    }
}

/// Payload for creating a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewStep {
    pub step_order: i32,
    pub step_details: String,
    pub recipe_id: RecipeId,
}

/// An ingredient of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient ID.
    pub id: IngredientId,
    /// Ingredient name.
    pub name: String,
    /// Free-form amount, e.g. "2 cups".
    pub quantity: String,
    /// The recipe this ingredient belongs to.
    pub recipe_id: RecipeId,
}

impl Ingredient {
    /// Creates an ingredient with a generated ID.
    #[must_use]
    pub fn new(new: NewIngredient) -> Self {
        Self {
            id: IngredientId::new(),
            name: new.name,
            quantity: new.quantity,
            recipe_id: new.recipe_id,
        }
    }
}

/// Payload for creating an ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewIngredient {
    pub name: String,
    pub quantity: String,
    pub recipe_id: RecipeId,
}

/// A recipe as returned to readers: the record plus its owner and children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeView {
    #[serde(flatten)]
    pub recipe: Recipe,
    /// The owning user.
    pub user: UserSummary,
    /// Steps ordered by `step_order`.
    pub steps: Vec<Step>,
    pub ingredients: Vec<Ingredient>,
}

impl RecipeView {
    /// Assembles a view, ordering the steps.
    #[must_use]
    pub fn new(
        recipe: Recipe,
        user: UserSummary,
        mut steps: Vec<Step>,
        ingredients: Vec<Ingredient>,
    ) -> Self {
        steps.sort_by_key(|s| s.step_order);
        Self {
            recipe,
            user,
            steps,
            ingredients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pancakes() -> NewRecipe {
        NewRecipe {
            title: "Pancakes".to_string(),
            recipe_type: "breakfast".to_string(),
            cuisine_tags: "american".to_string(),
            serves: 4,
            notes: "Rest the batter.".to_string(),
        }
    }

    #[test]
    fn new_recipe_takes_owner_from_caller() {
        let owner = UserId::new();
        let recipe = Recipe::new(pancakes(), owner);

        assert_eq!(recipe.user_id, owner);
        assert_eq!(recipe.title, "Pancakes");
    }

    #[test]
    fn create_payload_cannot_carry_owner() {
        let json = serde_json::json!({
            "title": "Pancakes",
            "recipe_type": "breakfast",
            "cuisine_tags": "american",
            "serves": 4,
            "notes": "",
            "user_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV"
        });

        assert!(serde_json::from_value::<NewRecipe>(json).is_err());
    }

    #[test]
    fn view_orders_steps() {
        let recipe = Recipe::new(pancakes(), UserId::new());
        let step = |order: i32| {
            Step::new(NewStep {
                step_order: order,
                step_details: format!("step {order}"),
                recipe_id: recipe.id,
            })
        };
        let user = UserSummary {
            username: "ben".to_string(),
            email: "ben@example.com".to_string(),
        };

        let view = RecipeView::new(recipe.clone(), user, vec![step(3), step(1), step(2)], vec![]);

        let orders: Vec<i32> = view.steps.iter().map(|s| s.step_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn view_serializes_flat() {
        let recipe = Recipe::new(pancakes(), UserId::new());
        let user = UserSummary {
            username: "ben".to_string(),
            email: "ben@example.com".to_string(),
        };
        let view = RecipeView::new(recipe, user, vec![], vec![]);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["title"], "Pancakes");
        assert_eq!(json["user"]["username"], "ben");
        assert!(json["steps"].as_array().unwrap().is_empty());
    }
}
