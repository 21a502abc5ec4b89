use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

use crate::api::recipes::create::{insert_lines_and_tags, validate_payload, verify_references, RecipePayload};
use crate::api::recipes::get::{fetch_recipe_response, RecipeResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::schema::{recipe_ingredients, recipe_tags, recipes};

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    request_body = RecipePayload,
    responses(
        (status = 200, description = "Recipe updated successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<RecipeResponse>, ApiError> {
    validate_payload(&payload)?;

    let mut conn = get_conn(&pool)?;

    conn.transaction(|conn| {
        // Only the author can edit; a foreign recipe reads as absent.
        recipes::table
            .filter(recipes::id.eq(id))
            .filter(recipes::author_id.eq(user.id))
            .select(recipes::id)
            .first::<i64>(conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

        verify_references(conn, &payload)?;

        // short_url is deliberately not touched: the token is assigned once
        // at creation and stays stable for the life of the recipe.
        diesel::update(recipes::table.find(id))
            .set((
                recipes::name.eq(&payload.name),
                recipes::text.eq(&payload.text),
                recipes::cooking_time.eq(payload.cooking_time),
                recipes::image.eq(&payload.image),
            ))
            .execute(conn)?;

        // Replace the full line and tag sets: clear then recreate, all
        // inside this transaction so readers never see a partial recipe.
        diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(id)))
            .execute(conn)?;
        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(id))).execute(conn)?;

        insert_lines_and_tags(conn, id, &payload)?;

        Ok::<(), ApiError>(())
    })?;

    let response = fetch_recipe_response(&mut conn, user.id, id)?;
    Ok(Json(response))
}
