use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::tags::TagResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbConn, DbPool};
use crate::error::ApiError;
use crate::membership::{self, MembershipKind};
use crate::models::{Recipe, Tag, User};
use crate::schema::{follows, ingredients, recipe_ingredients, recipe_tags, recipes, tags, users};
use crate::types::UserProfile;

/// One ingredient line of the recipe, joined with the ingredient record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientLine {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe read model.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub author: UserProfile,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<RecipeIngredientLine>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub short_url: String,
    pub pub_date: DateTime<Utc>,
}

/// Assemble the full read model for one recipe as seen by `viewer_id`.
///
/// Shared by the get/create/update handlers so a mutation responds with the
/// same shape a subsequent GET would return.
pub fn fetch_recipe_response(
    conn: &mut DbConn,
    viewer_id: i64,
    recipe_id: i64,
) -> Result<RecipeResponse, ApiError> {
    let (recipe, author): (Recipe, User) = recipes::table
        .inner_join(users::table)
        .filter(recipes::id.eq(recipe_id))
        .select((Recipe::as_select(), User::as_select()))
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    let recipe_tags_list: Vec<Tag> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq(recipe_id))
        .order(tags::name.asc())
        .select(Tag::as_select())
        .load(conn)?;

    let lines: Vec<(i64, String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(recipe_id))
        .order(ingredients::name.asc())
        .select((
            ingredients::id,
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(conn)?;

    let is_favorited = membership::member_ids(conn, viewer_id, MembershipKind::Favorite, &[recipe_id])?
        .contains(&recipe_id);
    let is_in_shopping_cart =
        membership::member_ids(conn, viewer_id, MembershipKind::Cart, &[recipe_id])?
            .contains(&recipe_id);

    let is_subscribed: bool = diesel::select(diesel::dsl::exists(
        follows::table
            .filter(follows::user_id.eq(viewer_id))
            .filter(follows::author_id.eq(author.id)),
    ))
    .get_result(conn)?;

    Ok(RecipeResponse {
        id: recipe.id,
        author: UserProfile::new(&author, is_subscribed),
        tags: recipe_tags_list.into_iter().map(TagResponse::from).collect(),
        ingredients: lines
            .into_iter()
            .map(|(id, name, measurement_unit, amount)| RecipeIngredientLine {
                id,
                name,
                measurement_unit,
                amount,
            })
            .collect(),
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        short_url: recipe.short_url,
        pub_date: recipe.pub_date,
    })
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut conn = get_conn(&pool)?;
    let response = fetch_recipe_response(&mut conn, user.id, id)?;
    Ok(Json(response))
}
