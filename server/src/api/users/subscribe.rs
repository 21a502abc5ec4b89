use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

use crate::api::users::subscriptions::{build_feed, FeedEntry};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::models::{NewFollow, Recipe, User};
use crate::schema::{follows, recipes, users};

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = i64, Path, description = "Author's user ID")
    ),
    responses(
        (status = 201, description = "Subscribed; returns the author's feed entry", body = FeedEntry),
        (status = 400, description = "Already subscribed, or subscribing to yourself", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<FeedEntry>), ApiError> {
    // Checked before touching the database; the follows table carries the
    // same rule as a CHECK constraint.
    if user.id == id {
        return Err(ApiError::SelfFollow);
    }

    let mut conn = get_conn(&pool)?;

    let author = conn.transaction(|conn| {
        let author: User = users::table
            .find(id)
            .select(User::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let already_following: bool = diesel::select(diesel::dsl::exists(
            follows::table
                .filter(follows::user_id.eq(user.id))
                .filter(follows::author_id.eq(id)),
        ))
        .get_result(conn)?;

        if already_following {
            return Err(ApiError::Duplicate("Already subscribed".to_string()));
        }

        diesel::insert_into(follows::table)
            .values(&NewFollow {
                user_id: user.id,
                author_id: id,
            })
            .execute(conn)?;

        Ok::<User, ApiError>(author)
    })?;

    let author_recipes: Vec<Recipe> = recipes::table
        .filter(recipes::author_id.eq(author.id))
        .order(recipes::pub_date.desc())
        .select(Recipe::as_select())
        .load(&mut conn)?;

    let entry = build_feed(vec![author], author_recipes, None)
        .pop()
        .ok_or(ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = i64, Path, description = "Author's user ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Subscription not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut conn = get_conn(&pool)?;

    let deleted = diesel::delete(
        follows::table
            .filter(follows::user_id.eq(user.id))
            .filter(follows::author_id.eq(id)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("Subscription not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
