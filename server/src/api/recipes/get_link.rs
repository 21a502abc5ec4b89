use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::schema::recipes;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Public short link for the recipe", body = ShortLinkResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_link(
    AuthUser(_user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<Json<ShortLinkResponse>, ApiError> {
    let mut conn = get_conn(&pool)?;

    let short_url: String = recipes::table
        .find(id)
        .select(recipes::short_url)
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    Ok(Json(ShortLinkResponse {
        short_link: format!("/s/{}", short_url),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_uses_dashed_key() {
        let value = serde_json::to_value(ShortLinkResponse {
            short_link: "/s/abc123".to_string(),
        })
        .unwrap();

        assert_eq!(value["short-link"], "/s/abc123");
    }
}
