//! PostgreSQL catalog storage.
//!
//! Expects the schema in `migrations/` to be applied. Cascading deletes of
//! steps, ingredients and comments are done by the schema's
//! `ON DELETE CASCADE` foreign keys.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::model::{Comment, Ingredient, Recipe, Step, Tea};
use crate::store::CatalogStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pantry_authz::{ChildRef, OwnershipLookup, TopLevelRef};
use pantry_core::{CommentId, IngredientId, RecipeId, StepId, TeaId, UserId};
use pantry_identity::{User, UserDirectory};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{info, instrument};

/// Parses a stored id column.
fn parse_id<T>(column: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: Display,
{
    T::from_str(value).map_err(|e| {
        sqlx::Error::Decode(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("invalid {column} '{value}': {e}"),
        )))
    })
}

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, sqlx::Error> {
        Ok(User::with_all_fields(
            parse_id("user id", &self.id)?,
            self.username,
            self.email,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Row type for recipe queries.
#[derive(FromRow)]
struct RecipeRow {
    id: String,
    title: String,
    recipe_type: String,
    cuisine_tags: String,
    serves: i32,
    notes: String,
    user_id: String,
}

impl RecipeRow {
    fn try_into_recipe(self) -> Result<Recipe, sqlx::Error> {
        Ok(Recipe {
            id: parse_id("recipe id", &self.id)?,
            title: self.title,
            recipe_type: self.recipe_type,
            cuisine_tags: self.cuisine_tags,
            serves: self.serves,
            notes: self.notes,
            user_id: parse_id("user id", &self.user_id)?,
        })
    }
}

/// Row type for step queries.
#[derive(FromRow)]
struct StepRow {
    id: String,
    step_order: i32,
    step_details: String,
    recipe_id: String,
}

impl StepRow {
    fn try_into_step(self) -> Result<Step, sqlx::Error> {
        Ok(Step {
            id: parse_id("step id", &self.id)?,
            step_order: self.step_order,
            step_details: self.step_details,
            recipe_id: parse_id("recipe id", &self.recipe_id)?,
        })
    }
}

/// Row type for ingredient queries.
#[derive(FromRow)]
struct IngredientRow {
    id: String,
    name: String,
    quantity: String,
    recipe_id: String,
}

impl IngredientRow {
    fn try_into_ingredient(self) -> Result<Ingredient, sqlx::Error> {
        Ok(Ingredient {
            id: parse_id("ingredient id", &self.id)?,
            name: self.name,
            quantity: self.quantity,
            recipe_id: parse_id("recipe id", &self.recipe_id)?,
        })
    }
}

/// Row type for tea queries.
#[derive(FromRow)]
struct TeaRow {
    id: String,
    name: String,
    in_stock: bool,
    rating: f64,
    user_id: String,
}

impl TeaRow {
    fn try_into_tea(self) -> Result<Tea, sqlx::Error> {
        Ok(Tea {
            id: parse_id("tea id", &self.id)?,
            name: self.name,
            in_stock: self.in_stock,
            rating: self.rating,
            user_id: parse_id("user id", &self.user_id)?,
        })
    }
}

/// Row type for comment queries.
#[derive(FromRow)]
struct CommentRow {
    id: String,
    content: String,
    tea_id: String,
}

impl CommentRow {
    fn try_into_comment(self) -> Result<Comment, sqlx::Error> {
        Ok(Comment {
            id: parse_id("comment id", &self.id)?,
            content: self.content,
            tea_id: parse_id("tea id", &self.tea_id)?,
        })
    }
}

/// Catalog storage backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Wraps an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the database cannot be reached.
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        info!("connected to catalog database");
        Ok(Self::new(pool))
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl OwnershipLookup for PgCatalogStore {
    type Error = StoreError;

    async fn owner_of(&self, resource: TopLevelRef) -> Result<Option<UserId>, StoreError> {
        let owner: Option<String> = match resource {
            TopLevelRef::Recipe(id) => {
                sqlx::query_scalar("SELECT user_id FROM recipes WHERE id = $1")
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await?
            }
            TopLevelRef::Tea(id) => {
                sqlx::query_scalar("SELECT user_id FROM teas WHERE id = $1")
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        match owner {
            Some(owner) => Ok(Some(parse_id("user id", &owner)?)),
            None => Ok(None),
        }
    }

    async fn parent_of(&self, resource: ChildRef) -> Result<Option<TopLevelRef>, StoreError> {
        let (sql, id) = match resource {
            ChildRef::Step(id) => ("SELECT recipe_id FROM steps WHERE id = $1", id.to_string()),
            ChildRef::Ingredient(id) => (
                "SELECT recipe_id FROM ingredients WHERE id = $1",
                id.to_string(),
            ),
            ChildRef::Comment(id) => ("SELECT tea_id FROM comments WHERE id = $1", id.to_string()),
        };

        let parent: Option<String> = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(parent) = parent else {
            return Ok(None);
        };
        let parent = match resource {
            ChildRef::Step(_) | ChildRef::Ingredient(_) => {
                TopLevelRef::Recipe(parse_id("recipe id", &parent)?)
            }
            ChildRef::Comment(_) => TopLevelRef::Tea(parse_id("tea id", &parent)?),
        };
        Ok(Some(parent))
    }
}

#[async_trait]
impl UserDirectory for PgCatalogStore {
    type Error = StoreError;

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, username, email, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.username())
        .bind(user.email())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn is_duplicate(&self, error: &StoreError) -> bool {
        error.is_conflict()
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let rows: Vec<RecipeRow> = sqlx::query_as(
            r#"
            SELECT id, title, recipe_type, cuisine_tags, serves, notes, user_id
            FROM recipes
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(RecipeRow::try_into_recipe)
            .collect::<Result<_, _>>()?)
    }

    async fn get_recipe(&self, id: RecipeId) -> Result<Option<Recipe>, StoreError> {
        let row: Option<RecipeRow> = sqlx::query_as(
            r#"
            SELECT id, title, recipe_type, cuisine_tags, serves, notes, user_id
            FROM recipes
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_recipe()?)),
            None => Ok(None),
        }
    }

    async fn insert_recipe(&self, recipe: &Recipe) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, title, recipe_type, cuisine_tags, serves, notes, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(recipe.id.to_string())
        .bind(&recipe.title)
        .bind(&recipe.recipe_type)
        .bind(&recipe.cuisine_tags)
        .bind(recipe.serves)
        .bind(&recipe.notes)
        .bind(recipe.user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_recipe(&self, recipe: &Recipe) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET title = $2, recipe_type = $3, cuisine_tags = $4, serves = $5, notes = $6
            WHERE id = $1
            "#,
        )
        .bind(recipe.id.to_string())
        .bind(&recipe.title)
        .bind(&recipe.recipe_type)
        .bind(&recipe.cuisine_tags)
        .bind(recipe.serves)
        .bind(&recipe.notes)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_recipe(&self, id: RecipeId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_steps(&self) -> Result<Vec<Step>, StoreError> {
        let rows: Vec<StepRow> = sqlx::query_as(
            r#"
            SELECT id, step_order, step_details, recipe_id
            FROM steps
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(StepRow::try_into_step)
            .collect::<Result<_, _>>()?)
    }

    async fn steps_of(&self, recipe: RecipeId) -> Result<Vec<Step>, StoreError> {
        let rows: Vec<StepRow> = sqlx::query_as(
            r#"
            SELECT id, step_order, step_details, recipe_id
            FROM steps
            WHERE recipe_id = $1
            ORDER BY step_order, created_at
            "#,
        )
        .bind(recipe.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(StepRow::try_into_step)
            .collect::<Result<_, _>>()?)
    }

    async fn get_step(&self, id: StepId) -> Result<Option<Step>, StoreError> {
        let row: Option<StepRow> = sqlx::query_as(
            r#"
            SELECT id, step_order, step_details, recipe_id
            FROM steps
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_step()?)),
            None => Ok(None),
        }
    }

    async fn insert_step(&self, step: &Step) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO steps (id, step_order, step_details, recipe_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(step.id.to_string())
        .bind(step.step_order)
        .bind(&step.step_details)
        .bind(step.recipe_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_step(&self, step: &Step) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE steps
            SET step_order = $2, step_details = $3
            WHERE id = $1
            "#,
        )
        .bind(step.id.to_string())
        .bind(step.step_order)
        .bind(&step.step_details)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_step(&self, id: StepId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM steps WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError> {
        let rows: Vec<IngredientRow> = sqlx::query_as(
            r#"
            SELECT id, name, quantity, recipe_id
            FROM ingredients
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(IngredientRow::try_into_ingredient)
            .collect::<Result<_, _>>()?)
    }

    async fn ingredients_of(&self, recipe: RecipeId) -> Result<Vec<Ingredient>, StoreError> {
        let rows: Vec<IngredientRow> = sqlx::query_as(
            r#"
            SELECT id, name, quantity, recipe_id
            FROM ingredients
            WHERE recipe_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(recipe.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(IngredientRow::try_into_ingredient)
            .collect::<Result<_, _>>()?)
    }

    async fn get_ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError> {
        let row: Option<IngredientRow> = sqlx::query_as(
            r#"
            SELECT id, name, quantity, recipe_id
            FROM ingredients
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_ingredient()?)),
            None => Ok(None),
        }
    }

    async fn insert_ingredient(&self, ingredient: &Ingredient) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ingredients (id, name, quantity, recipe_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(ingredient.id.to_string())
        .bind(&ingredient.name)
        .bind(&ingredient.quantity)
        .bind(ingredient.recipe_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_ingredient(&self, ingredient: &Ingredient) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE ingredients
            SET name = $2, quantity = $3
            WHERE id = $1
            "#,
        )
        .bind(ingredient.id.to_string())
        .bind(&ingredient.name)
        .bind(&ingredient.quantity)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_ingredient(&self, id: IngredientId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_teas(&self) -> Result<Vec<Tea>, StoreError> {
        let rows: Vec<TeaRow> = sqlx::query_as(
            r#"
            SELECT id, name, in_stock, rating, user_id
            FROM teas
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(TeaRow::try_into_tea)
            .collect::<Result<_, _>>()?)
    }

    async fn get_tea(&self, id: TeaId) -> Result<Option<Tea>, StoreError> {
        let row: Option<TeaRow> = sqlx::query_as(
            r#"
            SELECT id, name, in_stock, rating, user_id
            FROM teas
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_tea()?)),
            None => Ok(None),
        }
    }

    async fn insert_tea(&self, tea: &Tea) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO teas (id, name, in_stock, rating, user_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(tea.id.to_string())
        .bind(&tea.name)
        .bind(tea.in_stock)
        .bind(tea.rating)
        .bind(tea.user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_tea(&self, tea: &Tea) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE teas
            SET name = $2, in_stock = $3, rating = $4
            WHERE id = $1
            "#,
        )
        .bind(tea.id.to_string())
        .bind(&tea.name)
        .bind(tea.in_stock)
        .bind(tea.rating)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_tea(&self, id: TeaId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM teas WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self) -> Result<Vec<Comment>, StoreError> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            r#"
            SELECT id, content, tea_id
            FROM comments
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(CommentRow::try_into_comment)
            .collect::<Result<_, _>>()?)
    }

    async fn comments_of(&self, tea: TeaId) -> Result<Vec<Comment>, StoreError> {
        let rows: Vec<CommentRow> = sqlx::query_as(
            r#"
            SELECT id, content, tea_id
            FROM comments
            WHERE tea_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(tea.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(CommentRow::try_into_comment)
            .collect::<Result<_, _>>()?)
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError> {
        let row: Option<CommentRow> = sqlx::query_as(
            r#"
            SELECT id, content, tea_id
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_comment()?)),
            None => Ok(None),
        }
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, content, tea_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(comment.id.to_string())
        .bind(&comment.content)
        .bind(comment.tea_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_comment(&self, comment: &Comment) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE comments SET content = $2 WHERE id = $1")
            .bind(comment.id.to_string())
            .bind(&comment.content)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_ids_round_trip_through_display() {
        let id = RecipeId::new();
        let parsed: RecipeId = parse_id("recipe id", &id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn corrupt_id_is_a_decode_error() {
        let result: Result<TeaId, _> = parse_id("tea id", "not-an-id");
        let err = StoreError::from(result.unwrap_err());
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn rows_decode_into_records() {
        let owner = UserId::new();
        let row = TeaRow {
            id: TeaId::new().to_string(),
            name: "oolong".to_string(),
            in_stock: false,
            rating: 3.5,
            user_id: owner.to_string(),
        };

        let tea = row.try_into_tea().unwrap();
        assert_eq!(tea.user_id, owner);
        assert_eq!(tea.name, "oolong");
    }
}
