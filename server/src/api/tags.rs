use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::api::ErrorResponse;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::models::Tag;
use crate::schema::tags;
use crate::AppState;

/// Returns the router for /api/tags endpoints (mounted at /api/tags)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{id}", get(get_tag))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            slug: tag.slug,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    responses(
        (status = 200, description = "All tags", body = [TagResponse])
    )
)]
pub async fn list_tags(State(pool): State<Arc<DbPool>>) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let mut conn = get_conn(&pool)?;

    let all_tags: Vec<Tag> = tags::table
        .order((tags::name.asc(), tags::slug.asc()))
        .select(Tag::as_select())
        .load(&mut conn)?;

    Ok(Json(all_tags.into_iter().map(TagResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    tag = "tags",
    params(
        ("id" = i64, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    )
)]
pub async fn get_tag(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<Json<TagResponse>, ApiError> {
    let mut conn = get_conn(&pool)?;

    let tag: Tag = tags::table
        .find(id)
        .select(Tag::as_select())
        .first(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    Ok(Json(tag.into()))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_tags, get_tag),
    components(schemas(TagResponse))
)]
pub struct ApiDoc;
