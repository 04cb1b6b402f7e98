//! Partial updates checked by serde.
//!
//! A patch is a JSON object naming only the fields to change. Each patch
//! struct denies unknown fields and refuses `null`, so a patch is either
//! applied whole or not at all. Identity fields are rejected first with
//! their own error.

use crate::error::ValidationError;
use crate::model::{Comment, Ingredient, Recipe, Step, Tea};
use pantry_authz::ResourceKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Fields that identify a resource or tie it to its owner or parent.
const IMMUTABLE_FIELDS: &[&str] = &["id", "user_id", "recipe_id", "tea_id"];

/// Deserializes a field that may be absent but never `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn parse<P: DeserializeOwned>(kind: ResourceKind, patch: &Value) -> Result<P, ValidationError> {
    let object = patch.as_object().ok_or(ValidationError::NotAnObject)?;

    if let Some(field) = object
        .keys()
        .find(|field| IMMUTABLE_FIELDS.contains(&field.as_str()))
    {
        return Err(ValidationError::ImmutableField {
            kind: kind.to_string(),
            field: field.clone(),
        });
    }

    P::deserialize(patch).map_err(|e| ValidationError::InvalidField {
        kind: kind.to_string(),
        field: offending_field::<P>(object).unwrap_or_default(),
        reason: e.to_string(),
    })
}

/// Finds the first field that fails to deserialize on its own.
fn offending_field<P: DeserializeOwned>(object: &Map<String, Value>) -> Option<String> {
    object
        .iter()
        .find(|(field, value)| {
            let single = Map::from_iter([((*field).clone(), (*value).clone())]);
            P::deserialize(Value::Object(single)).is_err()
        })
        .map(|(field, _)| field.clone())
}

/// Validated changes to a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipePatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub recipe_type: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub cuisine_tags: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub serves: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<String>,
}

impl RecipePatch {
    /// Validates a JSON patch as a recipe patch.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending field.
    pub fn from_json(patch: &Value) -> Result<Self, ValidationError> {
        parse(ResourceKind::Recipe, patch)
    }

    /// Applies the changes, leaving absent fields untouched.
    pub fn apply(self, recipe: &mut Recipe) {
        if let Some(title) = self.title {
            recipe.title = title;
        }
        if let Some(recipe_type) = self.recipe_type {
            recipe.recipe_type = recipe_type;
        }
        if let Some(cuisine_tags) = self.cuisine_tags {
            recipe.cuisine_tags = cuisine_tags;
        }
        if let Some(serves) = self.serves {
            recipe.serves = serves;
        }
        if let Some(notes) = self.notes {
            recipe.notes = notes;
        }
    }
}

/// Validated changes to a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepPatch {
    #[serde(default, deserialize_with = "present")]
    pub step_order: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub step_details: Option<String>,
}

impl StepPatch {
    /// Validates a JSON patch as a step patch.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending field.
    pub fn from_json(patch: &Value) -> Result<Self, ValidationError> {
        parse(ResourceKind::Step, patch)
    }

    /// Applies the changes, leaving absent fields untouched.
    pub fn apply(self, step: &mut Step) {
        if let Some(step_order) = self.step_order {
            step.step_order = step_order;
        }
        if let Some(step_details) = self.step_details {
            step.step_details = step_details;
        }
    }
}

/// Validated changes to an ingredient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngredientPatch {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub quantity: Option<String>,
}

impl IngredientPatch {
    /// Validates a JSON patch as an ingredient patch.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending field.
    pub fn from_json(patch: &Value) -> Result<Self, ValidationError> {
        parse(ResourceKind::Ingredient, patch)
    }

    /// Applies the changes, leaving absent fields untouched.
    pub fn apply(self, ingredient: &mut Ingredient) {
        if let Some(name) = self.name {
            ingredient.name = name;
        }
        if let Some(quantity) = self.quantity {
            ingredient.quantity = quantity;
        }
    }
}

/// Validated changes to a tea.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeaPatch {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub in_stock: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<f64>,
}

impl TeaPatch {
    /// Validates a JSON patch as a tea patch.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending field.
    pub fn from_json(patch: &Value) -> Result<Self, ValidationError> {
        parse(ResourceKind::Tea, patch)
    }

    /// Applies the changes, leaving absent fields untouched.
    pub fn apply(self, tea: &mut Tea) {
        if let Some(name) = self.name {
            tea.name = name;
        }
        if let Some(in_stock) = self.in_stock {
            tea.in_stock = in_stock;
        }
        if let Some(rating) = self.rating {
            tea.rating = rating;
        }
    }
}

/// Validated changes to a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentPatch {
    #[serde(default, deserialize_with = "present")]
    pub content: Option<String>,
}

impl CommentPatch {
    /// Validates a JSON patch as a comment patch.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending field.
    pub fn from_json(patch: &Value) -> Result<Self, ValidationError> {
        parse(ResourceKind::Comment, patch)
    }

    /// Applies the changes, leaving absent fields untouched.
    pub fn apply(self, comment: &mut Comment) {
        if let Some(content) = self.content {
            comment.content = content;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewRecipe;
    use pantry_core::UserId;
    use serde_json::json;

    fn recipe() -> Recipe {
        Recipe::new(
            NewRecipe {
                title: "Pancakes".to_string(),
                recipe_type: "breakfast".to_string(),
                cuisine_tags: "american".to_string(),
                serves: 4,
                notes: String::new(),
            },
            UserId::new(),
        )
    }

    #[test]
    fn partial_patch_touches_only_named_fields() {
        let mut recipe = recipe();
        let before = recipe.clone();

        RecipePatch::from_json(&json!({ "serves": 6 }))
            .unwrap()
            .apply(&mut recipe);

        assert_eq!(recipe.serves, 6);
        assert_eq!(recipe.title, before.title);
        assert_eq!(recipe.user_id, before.user_id);
    }

    #[test]
    fn owner_and_parent_fields_are_immutable() {
        for field in ["id", "user_id"] {
            let mut patch = Map::new();
            patch.insert(field.to_string(), json!("x"));
            let result = RecipePatch::from_json(&Value::Object(patch));
            assert!(matches!(
                result,
                Err(ValidationError::ImmutableField { .. })
            ));
        }

        let result = StepPatch::from_json(&json!({ "recipe_id": "x" }));
        assert!(matches!(
            result,
            Err(ValidationError::ImmutableField { .. })
        ));

        let result = CommentPatch::from_json(&json!({ "tea_id": "x" }));
        assert!(matches!(
            result,
            Err(ValidationError::ImmutableField { .. })
        ));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = TeaPatch::from_json(&json!({ "name": "sencha", "colour": "green" }));
        let Err(ValidationError::InvalidField { kind, field, .. }) = &result else {
            panic!("expected an invalid field, got {result:?}");
        };
        assert_eq!(kind, "tea");
        assert_eq!(field, "colour");
    }

    #[test]
    fn wrong_types_are_rejected() {
        let cases = [
            RecipePatch::from_json(&json!({ "serves": "four" })).map(drop),
            RecipePatch::from_json(&json!({ "serves": 2.5 })).map(drop),
            RecipePatch::from_json(&json!({ "serves": 10_000_000_000_i64 })).map(drop),
            TeaPatch::from_json(&json!({ "in_stock": "yes" })).map(drop),
            CommentPatch::from_json(&json!({ "content": null })).map(drop),
        ];
        for (result, expected) in cases
            .into_iter()
            .zip(["serves", "serves", "serves", "in_stock", "content"])
        {
            let field = match &result {
                Err(ValidationError::InvalidField { field, .. }) => field.as_str(),
                other => panic!("expected an invalid field, got {other:?}"),
            };
            assert_eq!(field, expected);
        }
    }

    #[test]
    fn bad_field_is_named_among_good_ones() {
        let result = StepPatch::from_json(&json!({ "step_details": "Whisk", "step_order": true }));
        assert!(matches!(
            result,
            Err(ValidationError::InvalidField { ref field, .. }) if field == "step_order"
        ));
    }

    #[test]
    fn integer_rating_is_a_number() {
        let patch = TeaPatch::from_json(&json!({ "rating": 5 })).unwrap();
        assert_eq!(patch.rating, Some(5.0));
    }

    #[test]
    fn non_object_is_rejected() {
        assert_eq!(
            IngredientPatch::from_json(&json!(["name"])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut recipe = recipe();
        let before = recipe.clone();

        RecipePatch::from_json(&json!({})).unwrap().apply(&mut recipe);
        assert_eq!(recipe, before);
    }

    #[test]
    fn identity_field_wins_over_unknown_field() {
        let result = TeaPatch::from_json(&json!({ "colour": "green", "user_id": "x" }));
        assert!(matches!(
            result,
            Err(ValidationError::ImmutableField { ref field, .. }) if field == "user_id"
        ));
    }
}
