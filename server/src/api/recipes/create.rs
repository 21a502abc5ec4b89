use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use utoipa::ToSchema;

use potluck_core::short_link::generate_short_link;

use crate::api::recipes::get::{fetch_recipe_response, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::models::{NewRecipe, NewRecipeIngredient, NewRecipeTag};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientAmount {
    /// Ingredient id, see /api/ingredients
    pub id: i64,
    /// Amount in the ingredient's measurement unit
    pub amount: i32,
}

/// Body of both recipe create and update. Update replaces the full tag and
/// ingredient-line sets with the ones given here.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    /// Opaque image reference (upload handling happens elsewhere)
    pub image: String,
    /// Cooking time in minutes
    pub cooking_time: i32,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Check everything that can be checked without touching the database.
/// Runs before any write so a bad payload never leaves partial state.
pub fn validate_payload(payload: &RecipePayload) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name cannot be empty".to_string()));
    }
    if payload.text.trim().is_empty() {
        return Err(ApiError::Validation(
            "Description cannot be empty".to_string(),
        ));
    }
    if payload.cooking_time < 1 {
        return Err(ApiError::Validation(
            "Cooking time must be at least 1 minute".to_string(),
        ));
    }

    if payload.tags.is_empty() {
        return Err(ApiError::Validation(
            "At least one tag is required".to_string(),
        ));
    }
    let unique_tags: HashSet<i64> = payload.tags.iter().copied().collect();
    if unique_tags.len() != payload.tags.len() {
        return Err(ApiError::Validation("Tags must not repeat".to_string()));
    }

    if payload.ingredients.is_empty() {
        return Err(ApiError::Validation(
            "At least one ingredient is required".to_string(),
        ));
    }
    let unique_ingredients: HashSet<i64> = payload.ingredients.iter().map(|i| i.id).collect();
    if unique_ingredients.len() != payload.ingredients.len() {
        return Err(ApiError::Validation(
            "Ingredients must not repeat".to_string(),
        ));
    }
    if payload.ingredients.iter().any(|i| i.amount < 1) {
        return Err(ApiError::Validation(
            "Ingredient amount must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Verify that every referenced tag and ingredient id exists.
pub fn verify_references(
    conn: &mut PgConnection,
    payload: &RecipePayload,
) -> Result<(), ApiError> {
    let ingredient_ids: Vec<i64> = payload.ingredients.iter().map(|i| i.id).collect();

    let found_tags: i64 = tags::table
        .filter(tags::id.eq_any(&payload.tags))
        .count()
        .get_result(conn)?;
    if found_tags != payload.tags.len() as i64 {
        return Err(ApiError::Validation(
            "One or more tags do not exist".to_string(),
        ));
    }

    let found_ingredients: i64 = ingredients::table
        .filter(ingredients::id.eq_any(&ingredient_ids))
        .count()
        .get_result(conn)?;
    if found_ingredients != ingredient_ids.len() as i64 {
        return Err(ApiError::Validation(
            "One or more ingredients do not exist".to_string(),
        ));
    }

    Ok(())
}

/// Insert the recipe's ingredient lines and tag links.
pub fn insert_lines_and_tags(
    conn: &mut PgConnection,
    recipe_id: i64,
    payload: &RecipePayload,
) -> Result<(), ApiError> {
    let lines: Vec<NewRecipeIngredient> = payload
        .ingredients
        .iter()
        .map(|i| NewRecipeIngredient {
            recipe_id,
            ingredient_id: i.id,
            amount: i.amount,
        })
        .collect();

    diesel::insert_into(recipe_ingredients::table)
        .values(&lines)
        .execute(conn)?;

    let links: Vec<NewRecipeTag> = payload
        .tags
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();

    diesel::insert_into(recipe_tags::table)
        .values(&links)
        .execute(conn)?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = RecipePayload,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Short link collision", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    validate_payload(&payload)?;

    let mut conn = get_conn(&pool)?;

    // The short link is generated exactly once, at first persistence. The
    // unique constraint on recipes.short_url backs this up under races.
    let now_ms = Utc::now().timestamp_millis() as u64;
    let short_url = generate_short_link(now_ms, user.id as u64, payload.cooking_time as u64)?;

    let recipe_id = conn.transaction(|conn| {
        verify_references(conn, &payload)?;

        let new_recipe = NewRecipe {
            author_id: user.id,
            name: &payload.name,
            text: &payload.text,
            cooking_time: payload.cooking_time,
            image: &payload.image,
            short_url: &short_url,
        };

        let recipe_id: i64 = diesel::insert_into(recipes::table)
            .values(&new_recipe)
            .returning(recipes::id)
            .get_result(conn)?;

        insert_lines_and_tags(conn, recipe_id, &payload)?;

        Ok::<i64, ApiError>(recipe_id)
    })?;

    let response = fetch_recipe_response(&mut conn, user.id, recipe_id)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RecipePayload {
        RecipePayload {
            name: "Borscht".to_string(),
            text: "Simmer until deep red.".to_string(),
            image: "recipes/borscht.jpg".to_string(),
            cooking_time: 90,
            tags: vec![1, 2],
            ingredients: vec![
                IngredientAmount { id: 1, amount: 400 },
                IngredientAmount { id: 2, amount: 2 },
            ],
        }
    }

    #[test]
    fn test_valid_payload_passes() {
        assert!(validate_payload(&payload()).is_ok());
    }

    #[test]
    fn test_empty_tags_rejected() {
        let mut p = payload();
        p.tags.clear();
        assert!(matches!(
            validate_payload(&p),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let mut p = payload();
        p.tags = vec![1, 1];
        assert!(matches!(
            validate_payload(&p),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_ingredients_rejected() {
        let mut p = payload();
        p.ingredients.clear();
        assert!(matches!(
            validate_payload(&p),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_ingredients_rejected() {
        let mut p = payload();
        p.ingredients = vec![
            IngredientAmount { id: 1, amount: 1 },
            IngredientAmount { id: 1, amount: 2 },
        ];
        assert!(matches!(
            validate_payload(&p),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_cooking_time_rejected() {
        let mut p = payload();
        p.cooking_time = 0;
        assert!(matches!(
            validate_payload(&p),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut p = payload();
        p.ingredients[0].amount = 0;
        assert!(matches!(
            validate_payload(&p),
            Err(ApiError::Validation(_))
        ));
    }
}
