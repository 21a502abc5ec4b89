use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::api::ErrorResponse;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::models::Ingredient;
use crate::schema::ingredients;
use crate::AppState;

/// Returns the router for /api/ingredients endpoints (mounted at /api/ingredients)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients))
        .route("/{id}", get(get_ingredient))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive name prefix to search for
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "Matching ingredients", body = [IngredientResponse])
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListIngredientsParams>,
) -> Result<Json<Vec<IngredientResponse>>, ApiError> {
    let mut conn = get_conn(&pool)?;

    let mut query = ingredients::table.into_boxed();

    if let Some(name) = params.name.filter(|n| !n.is_empty()) {
        // Escape LIKE metacharacters so "100%" matches literally
        let escaped = name.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        query = query.filter(ingredients::name.ilike(format!("{}%", escaped)));
    }

    let matches: Vec<Ingredient> = query
        .order(ingredients::name.asc())
        .select(Ingredient::as_select())
        .load(&mut conn)?;

    Ok(Json(
        matches.into_iter().map(IngredientResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(
        ("id" = i64, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn get_ingredient(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<Json<IngredientResponse>, ApiError> {
    let mut conn = get_conn(&pool)?;

    let ingredient: Ingredient = ingredients::table
        .find(id)
        .select(Ingredient::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Ingredient not found".to_string()))?;

    Ok(Json(ingredient.into()))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_ingredients, get_ingredient),
    components(schemas(IngredientResponse))
)]
pub struct ApiDoc;
