use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::membership::{self, MembershipKind};
use crate::types::ShortRecipe;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "shopping_cart",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Recipe added to the shopping cart", body = ShortRecipe),
        (status = 400, description = "Recipe is already in the shopping cart", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ShortRecipe>), ApiError> {
    let mut conn = get_conn(&pool)?;
    let recipe = membership::add(&mut conn, user.id, id, MembershipKind::Cart)?;
    Ok((StatusCode::CREATED, Json(ShortRecipe::from(&recipe))))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "shopping_cart",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe removed from the shopping cart"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe is not in the shopping cart", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn(&pool)?;
    membership::remove(&mut conn, user.id, id, MembershipKind::Cart)?;
    Ok(StatusCode::NO_CONTENT)
}
