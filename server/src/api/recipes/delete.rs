use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use diesel::prelude::*;
use std::sync::Arc;

use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::schema::recipes;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn(&pool)?;

    // Ingredient lines, tag links, favorites and cart entries go with the
    // recipe via ON DELETE CASCADE.
    let deleted = diesel::delete(
        recipes::table
            .filter(recipes::id.eq(id))
            .filter(recipes::author_id.eq(user.id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Recipe not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
