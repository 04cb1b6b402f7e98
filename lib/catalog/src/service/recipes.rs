//! Recipes, steps and ingredients.

use super::{Catalog, not_found};
use crate::error::CatalogError;
use crate::model::{Ingredient, NewIngredient, NewRecipe, NewStep, Recipe, RecipeView, Step};
use crate::patch::{IngredientPatch, RecipePatch, StepPatch};
use crate::store::CatalogStore;
use pantry_authz::{ResourceRef, Target};
use pantry_core::{IngredientId, RecipeId, StepId};
use pantry_identity::{AuthenticatedUser, UserDirectory};
use serde_json::Value;
use tracing::{error, info, instrument};

impl<S: CatalogStore> Catalog<S> {
    /// Lists every recipe with its owner, steps and ingredients.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if storage fails.
    pub async fn list_recipes(&self) -> Result<Vec<RecipeView>, CatalogError> {
        let recipes = self.store.list_recipes().await?;
        let mut views = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            views.push(self.recipe_view(recipe).await?);
        }
        Ok(views)
    }

    /// Returns one recipe with its owner, steps and ingredients.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the recipe does not exist.
    pub async fn get_recipe(&self, id: RecipeId) -> Result<RecipeView, CatalogError> {
        let recipe = self
            .store
            .get_recipe(id)
            .await?
            .ok_or_else(|| not_found(ResourceRef::recipe(id)))?;
        self.recipe_view(recipe).await
    }

    async fn recipe_view(&self, recipe: Recipe) -> Result<RecipeView, CatalogError> {
        let Some(owner) = self.store.find_user(recipe.user_id).await? else {
            error!(recipe_id = %recipe.id, user_id = %recipe.user_id, "recipe owner is missing");
            return Err(CatalogError::Storage {
                details: format!("owner {} of recipe {} is missing", recipe.user_id, recipe.id),
            });
        };
        let steps = self.store.steps_of(recipe.id).await?;
        let ingredients = self.store.ingredients_of(recipe.id).await?;
        Ok(RecipeView::new(recipe, owner.summary(), steps, ingredients))
    }

    /// Creates a recipe owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the title is taken.
    #[instrument(skip_all, fields(actor = %actor.user_id(), title = %new.title))]
    pub async fn create_recipe(
        &self,
        actor: &AuthenticatedUser,
        new: NewRecipe,
    ) -> Result<Recipe, CatalogError> {
        let recipe = Recipe::new(new, actor.user_id());
        self.store.insert_recipe(&recipe).await?;
        info!(recipe_id = %recipe.id, "created recipe");
        Ok(recipe)
    }

    /// Applies a partial update to a recipe owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, `Validation` or `Conflict`, checked in
    /// that order.
    #[instrument(skip_all, fields(actor = %actor.user_id(), recipe_id = %id))]
    pub async fn update_recipe(
        &self,
        actor: &AuthenticatedUser,
        id: RecipeId,
        patch: &Value,
    ) -> Result<Recipe, CatalogError> {
        self.authorize(actor, ResourceRef::recipe(id).into()).await?;
        let patch = RecipePatch::from_json(patch)?;

        let mut recipe = self
            .store
            .get_recipe(id)
            .await?
            .ok_or_else(|| not_found(ResourceRef::recipe(id)))?;
        patch.apply(&mut recipe);
        if !self.store.update_recipe(&recipe).await? {
            return Err(not_found(ResourceRef::recipe(id)));
        }
        Ok(recipe)
    }

    /// Deletes a recipe owned by `actor` along with its steps and
    /// ingredients.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Forbidden`.
    #[instrument(skip_all, fields(actor = %actor.user_id(), recipe_id = %id))]
    pub async fn delete_recipe(
        &self,
        actor: &AuthenticatedUser,
        id: RecipeId,
    ) -> Result<(), CatalogError> {
        self.authorize(actor, ResourceRef::recipe(id).into()).await?;
        if !self.store.delete_recipe(id).await? {
            return Err(not_found(ResourceRef::recipe(id)));
        }
        info!("deleted recipe");
        Ok(())
    }

    /// Lists every step of every recipe.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if storage fails.
    pub async fn list_steps(&self) -> Result<Vec<Step>, CatalogError> {
        Ok(self.store.list_steps().await?)
    }

    /// Returns one step.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the step does not exist.
    pub async fn get_step(&self, id: StepId) -> Result<Step, CatalogError> {
        self.store
            .get_step(id)
            .await?
            .ok_or_else(|| not_found(ResourceRef::step(id)))
    }

    /// Adds a step to a recipe owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the recipe does not exist and `Forbidden` if it
    /// belongs to someone else.
    #[instrument(skip_all, fields(actor = %actor.user_id(), recipe_id = %new.recipe_id))]
    pub async fn create_step(
        &self,
        actor: &AuthenticatedUser,
        new: NewStep,
    ) -> Result<Step, CatalogError> {
        self.authorize(actor, Target::new_step(new.recipe_id)).await?;
        let step = Step::new(new);
        self.store.insert_step(&step).await?;
        info!(step_id = %step.id, "created step");
        Ok(step)
    }

    /// Applies a partial update to a step of a recipe owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `IntegrityFault`, `Forbidden` or `Validation`.
    #[instrument(skip_all, fields(actor = %actor.user_id(), step_id = %id))]
    pub async fn update_step(
        &self,
        actor: &AuthenticatedUser,
        id: StepId,
        patch: &Value,
    ) -> Result<Step, CatalogError> {
        self.authorize(actor, ResourceRef::step(id).into()).await?;
        let patch = StepPatch::from_json(patch)?;

        let mut step = self.get_step(id).await?;
        patch.apply(&mut step);
        if !self.store.update_step(&step).await? {
            return Err(not_found(ResourceRef::step(id)));
        }
        Ok(step)
    }

    /// Deletes a step of a recipe owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `IntegrityFault` or `Forbidden`.
    #[instrument(skip_all, fields(actor = %actor.user_id(), step_id = %id))]
    pub async fn delete_step(
        &self,
        actor: &AuthenticatedUser,
        id: StepId,
    ) -> Result<(), CatalogError> {
        self.authorize(actor, ResourceRef::step(id).into()).await?;
        if !self.store.delete_step(id).await? {
            return Err(not_found(ResourceRef::step(id)));
        }
        info!("deleted step");
        Ok(())
    }

    /// Lists every ingredient of every recipe.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if storage fails.
    pub async fn list_ingredients(&self) -> Result<Vec<Ingredient>, CatalogError> {
        Ok(self.store.list_ingredients().await?)
    }

    /// Returns one ingredient.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ingredient does not exist.
    pub async fn get_ingredient(&self, id: IngredientId) -> Result<Ingredient, CatalogError> {
        self.store
            .get_ingredient(id)
            .await?
            .ok_or_else(|| not_found(ResourceRef::ingredient(id)))
    }

    /// Adds an ingredient to a recipe owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the recipe does not exist and `Forbidden` if it
    /// belongs to someone else.
    #[instrument(skip_all, fields(actor = %actor.user_id(), recipe_id = %new.recipe_id))]
    pub async fn create_ingredient(
        &self,
        actor: &AuthenticatedUser,
        new: NewIngredient,
    ) -> Result<Ingredient, CatalogError> {
        self.authorize(actor, Target::new_ingredient(new.recipe_id)).await?;
        let ingredient = Ingredient::new(new);
        self.store.insert_ingredient(&ingredient).await?;
        info!(ingredient_id = %ingredient.id, "created ingredient");
        Ok(ingredient)
    }

    /// Applies a partial update to an ingredient of a recipe owned by
    /// `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `IntegrityFault`, `Forbidden` or `Validation`.
    #[instrument(skip_all, fields(actor = %actor.user_id(), ingredient_id = %id))]
    pub async fn update_ingredient(
        &self,
        actor: &AuthenticatedUser,
        id: IngredientId,
        patch: &Value,
    ) -> Result<Ingredient, CatalogError> {
        self.authorize(actor, ResourceRef::ingredient(id).into()).await?;
        let patch = IngredientPatch::from_json(patch)?;

        let mut ingredient = self.get_ingredient(id).await?;
        patch.apply(&mut ingredient);
        if !self.store.update_ingredient(&ingredient).await? {
            return Err(not_found(ResourceRef::ingredient(id)));
        }
        Ok(ingredient)
    }

    /// Deletes an ingredient of a recipe owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `IntegrityFault` or `Forbidden`.
    #[instrument(skip_all, fields(actor = %actor.user_id(), ingredient_id = %id))]
    pub async fn delete_ingredient(
        &self,
        actor: &AuthenticatedUser,
        id: IngredientId,
    ) -> Result<(), CatalogError> {
        self.authorize(actor, ResourceRef::ingredient(id).into()).await?;
        if !self.store.delete_ingredient(id).await? {
            return Err(not_found(ResourceRef::ingredient(id)));
        }
        info!("deleted ingredient");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{catalog, new_recipe, sign_in};
    use super::*;
    use crate::error::ValidationError;
    use serde_json::json;

    #[tokio::test]
    async fn recipe_view_includes_owner_and_ordered_children() {
        let catalog = catalog();
        let alice = sign_in(&catalog, "alice").await;
        let recipe = catalog
            .create_recipe(&alice, new_recipe("Crepes"))
            .await
            .unwrap();
        for order in [2, 1] {
            catalog
                .create_step(
                    &alice,
                    NewStep {
                        step_order: order,
                        step_details: format!("step {order}"),
                        recipe_id: recipe.id,
                    },
                )
                .await
                .unwrap();
        }
        catalog
            .create_ingredient(
                &alice,
                NewIngredient {
                    name: "flour".to_string(),
                    quantity: "250g".to_string(),
                    recipe_id: recipe.id,
                },
            )
            .await
            .unwrap();

        let view = catalog.get_recipe(recipe.id).await.unwrap();
        assert_eq!(view.user.username, "alice");
        assert_eq!(view.steps[0].step_order, 1);
        assert_eq!(view.steps[1].step_order, 2);
        assert_eq!(view.ingredients.len(), 1);

        let all = catalog.list_recipes().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].recipe.id, recipe.id);
    }

    #[tokio::test]
    async fn deleting_a_recipe_cascades() {
        let catalog = catalog();
        let alice = sign_in(&catalog, "alice").await;
        let recipe = catalog
            .create_recipe(&alice, new_recipe("Crepes"))
            .await
            .unwrap();
        let step = catalog
            .create_step(
                &alice,
                NewStep {
                    step_order: 1,
                    step_details: "whisk".to_string(),
                    recipe_id: recipe.id,
                },
            )
            .await
            .unwrap();
        let ingredient = catalog
            .create_ingredient(
                &alice,
                NewIngredient {
                    name: "egg".to_string(),
                    quantity: "2".to_string(),
                    recipe_id: recipe.id,
                },
            )
            .await
            .unwrap();

        catalog.delete_recipe(&alice, recipe.id).await.unwrap();

        assert!(catalog.get_step(step.id).await.unwrap_err().is_not_found());
        assert!(
            catalog
                .get_ingredient(ingredient.id)
                .await
                .unwrap_err()
                .is_not_found()
        );
        assert!(catalog.list_steps().await.unwrap().is_empty());
        assert!(catalog.list_ingredients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn children_cannot_be_added_to_someone_elses_recipe() {
        let catalog = catalog();
        let alice = sign_in(&catalog, "alice").await;
        let bob = sign_in(&catalog, "bob").await;
        let recipe = catalog
            .create_recipe(&alice, new_recipe("Crepes"))
            .await
            .unwrap();

        let step = catalog
            .create_step(
                &bob,
                NewStep {
                    step_order: 1,
                    step_details: "eat them all".to_string(),
                    recipe_id: recipe.id,
                },
            )
            .await;
        assert!(step.unwrap_err().is_forbidden());

        let ingredient = catalog
            .create_ingredient(
                &bob,
                NewIngredient {
                    name: "sand".to_string(),
                    quantity: "1 cup".to_string(),
                    recipe_id: RecipeId::new(),
                },
            )
            .await;
        assert!(ingredient.unwrap_err().is_not_found());
        assert!(catalog.list_steps().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_patch_leaves_recipe_unchanged() {
        let catalog = catalog();
        let alice = sign_in(&catalog, "alice").await;
        let recipe = catalog
            .create_recipe(&alice, new_recipe("Crepes"))
            .await
            .unwrap();

        let result = catalog
            .update_recipe(
                &alice,
                recipe.id,
                &json!({ "title": "Galettes", "user_id": "someone" }),
            )
            .await;
        assert!(matches!(
            result,
            Err(CatalogError::Validation(ValidationError::ImmutableField { .. }))
        ));

        let stored = catalog.get_recipe(recipe.id).await.unwrap();
        assert_eq!(stored.recipe, recipe);
    }

    #[tokio::test]
    async fn ownership_is_checked_before_the_patch() {
        let catalog = catalog();
        let alice = sign_in(&catalog, "alice").await;
        let bob = sign_in(&catalog, "bob").await;
        let recipe = catalog
            .create_recipe(&alice, new_recipe("Crepes"))
            .await
            .unwrap();

        let result = catalog
            .update_recipe(&bob, recipe.id, &json!({ "bogus": true }))
            .await;
        assert!(result.unwrap_err().is_forbidden());
    }

    #[tokio::test]
    async fn step_cannot_be_moved_to_another_recipe() {
        let catalog = catalog();
        let alice = sign_in(&catalog, "alice").await;
        let crepes = catalog
            .create_recipe(&alice, new_recipe("Crepes"))
            .await
            .unwrap();
        let waffles = catalog
            .create_recipe(&alice, new_recipe("Waffles"))
            .await
            .unwrap();
        let step = catalog
            .create_step(
                &alice,
                NewStep {
                    step_order: 1,
                    step_details: "whisk".to_string(),
                    recipe_id: crepes.id,
                },
            )
            .await
            .unwrap();

        let result = catalog
            .update_step(
                &alice,
                step.id,
                &json!({ "recipe_id": waffles.id.to_string() }),
            )
            .await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));

        let updated = catalog
            .update_step(&alice, step.id, &json!({ "step_order": 3 }))
            .await
            .unwrap();
        assert_eq!(updated.step_order, 3);
        assert_eq!(updated.recipe_id, crepes.id);
    }

    #[tokio::test]
    async fn renaming_to_a_taken_title_conflicts() {
        let catalog = catalog();
        let alice = sign_in(&catalog, "alice").await;
        catalog
            .create_recipe(&alice, new_recipe("Crepes"))
            .await
            .unwrap();
        let waffles = catalog
            .create_recipe(&alice, new_recipe("Waffles"))
            .await
            .unwrap();

        let result = catalog
            .update_recipe(&alice, waffles.id, &json!({ "title": "Crepes" }))
            .await;
        assert!(matches!(result, Err(CatalogError::Conflict { .. })));

        let duplicate = catalog.create_recipe(&alice, new_recipe("Crepes")).await;
        assert!(matches!(duplicate, Err(CatalogError::Conflict { .. })));
    }

    #[tokio::test]
    async fn owner_can_edit_and_remove_ingredients() {
        let catalog = catalog();
        let alice = sign_in(&catalog, "alice").await;
        let recipe = catalog
            .create_recipe(&alice, new_recipe("Crepes"))
            .await
            .unwrap();
        let ingredient = catalog
            .create_ingredient(
                &alice,
                NewIngredient {
                    name: "milk".to_string(),
                    quantity: "500ml".to_string(),
                    recipe_id: recipe.id,
                },
            )
            .await
            .unwrap();

        let updated = catalog
            .update_ingredient(&alice, ingredient.id, &json!({ "quantity": "1l" }))
            .await
            .unwrap();
        assert_eq!(updated.quantity, "1l");
        assert_eq!(updated.name, "milk");

        catalog
            .delete_ingredient(&alice, ingredient.id)
            .await
            .unwrap();
        let again = catalog.delete_ingredient(&alice, ingredient.id).await;
        assert!(again.unwrap_err().is_not_found());
    }
}
