use axum::{
    extract::{Path, State},
    response::Redirect,
};
use diesel::prelude::*;
use std::sync::Arc;

use crate::api::ErrorResponse;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::schema::recipes;

#[utoipa::path(
    get,
    path = "/s/{token}",
    tag = "short_links",
    params(
        ("token" = String, Path, description = "Short-link token")
    ),
    responses(
        (status = 307, description = "Redirect to the full recipe page"),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    )
)]
pub async fn resolve_short_link(
    State(pool): State<Arc<DbPool>>,
    Path(token): Path<String>,
) -> Result<Redirect, ApiError> {
    let mut conn = get_conn(&pool)?;

    let recipe_id: i64 = recipes::table
        .filter(recipes::short_url.eq(&token))
        .select(recipes::id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Short link not found".to_string()))?;

    Ok(Redirect::temporary(&format!("/recipes/{}", recipe_id)))
}
