//! In-memory catalog storage.
//!
//! Every table lives behind one `RwLock`, so a cascade delete is atomic with
//! respect to concurrent calls. Foreign keys are not enforced: a child may be
//! stored under a parent that does not exist, which is how tests reproduce
//! corrupted data.

use crate::error::StoreError;
use crate::model::{Comment, Ingredient, Recipe, Step, Tea};
use crate::store::CatalogStore;
use async_trait::async_trait;
use pantry_authz::{ChildRef, OwnershipLookup, TopLevelRef};
use pantry_core::{CommentId, IngredientId, RecipeId, StepId, TeaId, UserId};
use pantry_identity::{User, UserDirectory};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    recipes: Vec<Recipe>,
    steps: Vec<Step>,
    ingredients: Vec<Ingredient>,
    teas: Vec<Tea>,
    comments: Vec<Comment>,
}

/// Catalog storage held in process memory.
///
/// Rows are returned in insertion order. Each instance is independent, so
/// tests get isolated storage by creating their own.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }
}

fn conflict(constraint: &str) -> StoreError {
    StoreError::Conflict {
        constraint: constraint.to_string(),
    }
}

/// Replaces the row matching `same`, returning whether one was replaced.
fn replace<T: Clone>(rows: &mut [T], row: &T, same: impl Fn(&T) -> bool) -> bool {
    match rows.iter_mut().find(|r| same(r)) {
        Some(existing) => {
            *existing = row.clone();
            true
        }
        None => false,
    }
}

/// Removes the row matching `same`, returning whether one was removed.
fn remove<T>(rows: &mut Vec<T>, same: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|r| !same(r));
    rows.len() != before
}

#[async_trait]
impl OwnershipLookup for InMemoryCatalogStore {
    type Error = StoreError;

    async fn owner_of(&self, resource: TopLevelRef) -> Result<Option<UserId>, StoreError> {
        let tables = self.read()?;
        Ok(match resource {
            TopLevelRef::Recipe(id) => tables
                .recipes
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.user_id),
            TopLevelRef::Tea(id) => tables.teas.iter().find(|t| t.id == id).map(|t| t.user_id),
        })
    }

    async fn parent_of(&self, resource: ChildRef) -> Result<Option<TopLevelRef>, StoreError> {
        let tables = self.read()?;
        Ok(match resource {
            ChildRef::Step(id) => tables
                .steps
                .iter()
                .find(|s| s.id == id)
                .map(|s| TopLevelRef::Recipe(s.recipe_id)),
            ChildRef::Ingredient(id) => tables
                .ingredients
                .iter()
                .find(|i| i.id == id)
                .map(|i| TopLevelRef::Recipe(i.recipe_id)),
            ChildRef::Comment(id) => tables
                .comments
                .iter()
                .find(|c| c.id == id)
                .map(|c| TopLevelRef::Tea(c.tea_id)),
        })
    }
}

#[async_trait]
impl UserDirectory for InMemoryCatalogStore {
    type Error = StoreError;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.iter().find(|u| u.id() == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.username() == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|u| u.email() == email)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.username() == user.username()) {
            return Err(conflict("users_username_key"));
        }
        if tables.users.iter().any(|u| u.email() == user.email()) {
            return Err(conflict("users_email_key"));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    fn is_duplicate(&self, error: &StoreError) -> bool {
        error.is_conflict()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.read()?.recipes.clone())
    }

    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, StoreError> {
        Ok(self.read()?.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.recipes.iter().any(|r| r.title == recipe.title) {
            return Err(conflict("recipes_title_key"));
        }
        tables.recipes.push(recipe.clone());
        Ok(())
    }

    async fn update_recipe(&self, recipe: &Recipe) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables
            .recipes
            .iter()
            .any(|r| r.id != recipe.id && r.title == recipe.title)
        {
            return Err(conflict("recipes_title_key"));
        }
        Ok(replace(&mut tables.recipes, recipe, |r| r.id == recipe.id))
    }

    async fn delete_recipe(&self, id: RecipeId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let removed = remove(&mut tables.recipes, |r| r.id == id);
        if removed {
            tables.steps.retain(|s| s.recipe_id != id);
            tables.ingredients.retain(|i| i.recipe_id != id);
        }
        Ok(removed)
    }

    async fn list_steps(&self) -> Result<Vec<Step>, StoreError> {
        Ok(self.read()?.steps.clone())
    }

    async fn steps_of(&self, recipe: RecipeId) -> Result<Vec<Step>, StoreError> {
        Ok(self
            .read()?
            .steps
            .iter()
            .filter(|s| s.recipe_id == recipe)
            .cloned()
            .collect())
    }

    async fn get_step(&self, id: StepId) -> Result<Option<Step>, StoreError> {
        Ok(self.read()?.steps.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_step(&self, step: &Step) -> Result<(), StoreError> {
        self.write()?.steps.push(step.clone());
        Ok(())
    }

    async fn update_step(&self, step: &Step) -> Result<bool, StoreError> {
        Ok(replace(&mut self.write()?.steps, step, |s| s.id == step.id))
    }

    async fn delete_step(&self, id: StepId) -> Result<bool, StoreError> {
        Ok(remove(&mut self.write()?.steps, |s| s.id == id))
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError> {
        Ok(self.read()?.ingredients.clone())
    }

    async fn ingredients_of(&self, recipe: RecipeId) -> Result<Vec<Ingredient>, StoreError> {
        Ok(self
            .read()?
            .ingredients
            .iter()
            .filter(|i| i.recipe_id == recipe)
            .cloned()
            .collect())
    }

    async fn get_ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError> {
        Ok(self.read()?.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn insert_ingredient(&self, ingredient: &Ingredient) -> Result<(), StoreError> {
        self.write()?.ingredients.push(ingredient.clone());
        Ok(())
    }

    async fn update_ingredient(&self, ingredient: &Ingredient) -> Result<bool, StoreError> {
        Ok(replace(&mut self.write()?.ingredients, ingredient, |i| i.id == ingredient.id))
    }

    async fn delete_ingredient(&self, id: IngredientId) -> Result<bool, StoreError> {
        Ok(remove(&mut self.write()?.ingredients, |i| i.id == id))
    }

    async fn list_teas(&self) -> Result<Vec<Tea>, StoreError> {
        Ok(self.read()?.teas.clone())
    }

    async fn get_tea(&self, id: TeaId) -> Result<Option<Tea>, StoreError> {
        Ok(self.read()?.teas.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_tea(&self, tea: &Tea) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.teas.iter().any(|t| t.name == tea.name) {
            return Err(conflict("teas_name_key"));
        }
        tables.teas.push(tea.clone());
        Ok(())
    }

    async fn update_tea(&self, tea: &Tea) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        if tables
            .teas
            .iter()
            .any(|t| t.id != tea.id && t.name == tea.name)
        {
            return Err(conflict("teas_name_key"));
        }
        Ok(replace(&mut tables.teas, tea, |t| t.id == tea.id))
    }

    async fn delete_tea(&self, id: TeaId) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let removed = remove(&mut tables.teas, |t| t.id == id);
        if removed {
            tables.comments.retain(|c| c.tea_id != id);
        }
        Ok(removed)
    }

    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError> {
        Ok(self.read()?.comments.clone())
    }

    async fn comments_of(&self, tea: TeaId) -> Result<Vec<Comment>, StoreError> {
        Ok(self
            .read()?
            .comments
            .iter()
            .filter(|c| c.tea_id == tea)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        Ok(self.read()?.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        self.write()?.comments.push(comment.clone());
        Ok(())
    }

    async fn update_comment(&self, comment: &Comment) -> Result<bool, StoreError> {
        Ok(replace(&mut self.write()?.comments, comment, |c| c.id == comment.id))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool, StoreError> {
        Ok(remove(&mut self.write()?.comments, |c| c.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewComment, NewIngredient, NewRecipe, NewStep, NewTea};

    fn recipe(title: &str, owner: UserId) -> Recipe {
        Recipe::new(
            NewRecipe {
                title: title.to_string(),
                recipe_type: "main".to_string(),
                cuisine_tags: "italian".to_string(),
                serves: 2,
                notes: String::new(),
            },
            owner,
        )
    }

    #[tokio::test]
    async fn deleting_a_recipe_removes_its_children() {
        let store = InMemoryCatalogStore::new();
        let owner = UserId::new();
        let keep = recipe("Risotto", owner);
        let gone = recipe("Lasagne", owner);
        store.insert_recipe(&keep).await.unwrap();
        store.insert_recipe(&gone).await.unwrap();

        for r in [&keep, &gone] {
            store
                .insert_step(&Step::new(NewStep {
                    step_order: 1,
                    step_details: "boil".to_string(),
                    recipe_id: r.id,
                }))
                .await
                .unwrap();
            store
                .insert_ingredient(&Ingredient::new(NewIngredient {
                    name: "salt".to_string(),
                    quantity: "a pinch".to_string(),
                    recipe_id: r.id,
                }))
                .await
                .unwrap();
        }

        assert!(store.delete_recipe(gone.id).await.unwrap());

        assert!(store.steps_of(gone.id).await.unwrap().is_empty());
        assert!(store.ingredients_of(gone.id).await.unwrap().is_empty());
        assert_eq!(store.steps_of(keep.id).await.unwrap().len(), 1);
        assert_eq!(store.ingredients_of(keep.id).await.unwrap().len(), 1);
        assert!(!store.delete_recipe(gone.id).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_tea_removes_its_comments() {
        let store = InMemoryCatalogStore::new();
        let tea = Tea::new(
            NewTea {
                name: "sencha".to_string(),
                in_stock: true,
                rating: 4.0,
            },
            UserId::new(),
        );
        store.insert_tea(&tea).await.unwrap();
        store
            .insert_comment(&Comment::new(NewComment {
                content: "grassy".to_string(),
                tea_id: tea.id,
            }))
            .await
            .unwrap();

        assert!(store.delete_tea(tea.id).await.unwrap());
        assert!(store.list_comments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_titles_conflict() {
        let store = InMemoryCatalogStore::new();
        let owner = UserId::new();
        store.insert_recipe(&recipe("Soup", owner)).await.unwrap();
        let mut other = recipe("Stew", owner);
        store.insert_recipe(&other).await.unwrap();

        let duplicate = store.insert_recipe(&recipe("Soup", owner)).await;
        assert!(matches!(duplicate, Err(StoreError::Conflict { .. })));

        other.title = "Soup".to_string();
        let rename = store.update_recipe(&other).await;
        assert!(matches!(rename, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn updating_a_missing_row_reports_false() {
        let store = InMemoryCatalogStore::new();
        let soup = recipe("Soup", UserId::new());
        let step = Step::new(NewStep {
            step_order: 1,
            step_details: "simmer".to_string(),
            recipe_id: soup.id,
        });

        assert!(!store.update_recipe(&soup).await.unwrap());
        assert!(!store.update_step(&step).await.unwrap());
        assert_eq!(store.get_step(step.id).await.unwrap(), None);

        store.insert_recipe(&soup).await.unwrap();
        store.insert_step(&step).await.unwrap();
        assert!(store.update_recipe(&soup).await.unwrap());
        assert!(store.update_step(&step).await.unwrap());

        assert!(store.delete_step(step.id).await.unwrap());
        assert!(!store.update_step(&step).await.unwrap());
    }

    #[tokio::test]
    async fn ownership_lookups_follow_foreign_keys() {
        let store = InMemoryCatalogStore::new();
        let owner = UserId::new();
        let soup = recipe("Soup", owner);
        store.insert_recipe(&soup).await.unwrap();
        let step = Step::new(NewStep {
            step_order: 1,
            step_details: "simmer".to_string(),
            recipe_id: soup.id,
        });
        store.insert_step(&step).await.unwrap();

        assert_eq!(
            store.owner_of(TopLevelRef::Recipe(soup.id)).await.unwrap(),
            Some(owner)
        );
        assert_eq!(
            store.parent_of(ChildRef::Step(step.id)).await.unwrap(),
            Some(TopLevelRef::Recipe(soup.id))
        );
        assert_eq!(
            store.owner_of(TopLevelRef::Tea(TeaId::new())).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn duplicate_users_conflict() {
        let store = InMemoryCatalogStore::new();
        store
            .insert_user(&User::new("ben".to_string(), "ben@example.com".to_string()))
            .await
            .unwrap();

        let result = store
            .insert_user(&User::new("ben".to_string(), "b2@example.com".to_string()))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert!(store.is_duplicate(&result.unwrap_err()));
    }
}
