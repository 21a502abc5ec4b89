use axum::{
    extract::{Query, State},
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::models::{Recipe, User};
use crate::schema::{follows, recipes, users};
use crate::types::ShortRecipe;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscriptionsParams {
    /// Cap on recipes returned per author. `recipes_count` always reports
    /// the full count. Absent or non-positive returns every recipe.
    pub recipes_limit: Option<i64>,
}

/// One followed author with their recipes, newest first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedEntry {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<ShortRecipe>,
    pub recipes_count: i64,
}

/// Group recipes (already ordered newest first) under their authors
/// (already ordered by username) into feed entries.
///
/// `recipes_count` is taken before the limit is applied, so it reports the
/// author's full recipe count no matter how deep the truncation cuts.
pub fn build_feed(
    authors: Vec<User>,
    recipes_by_date: Vec<Recipe>,
    recipes_limit: Option<i64>,
) -> Vec<FeedEntry> {
    let mut per_author: HashMap<i64, Vec<ShortRecipe>> = HashMap::new();
    let mut counts: HashMap<i64, i64> = HashMap::new();

    for recipe in &recipes_by_date {
        *counts.entry(recipe.author_id).or_insert(0) += 1;
        per_author
            .entry(recipe.author_id)
            .or_default()
            .push(ShortRecipe::from(recipe));
    }

    let cap = recipes_limit.filter(|l| *l > 0);

    authors
        .into_iter()
        .map(|author| {
            let mut author_recipes = per_author.remove(&author.id).unwrap_or_default();
            if let Some(cap) = cap {
                author_recipes.truncate(cap as usize);
            }

            FeedEntry {
                recipes_count: counts.get(&author.id).copied().unwrap_or(0),
                id: author.id,
                username: author.username,
                email: author.email,
                first_name: author.first_name,
                last_name: author.last_name,
                is_subscribed: true,
                recipes: author_recipes,
            }
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(SubscriptionsParams),
    responses(
        (status = 200, description = "Followed authors with their recipes", body = [FeedEntry]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<SubscriptionsParams>,
) -> Result<Json<Vec<FeedEntry>>, ApiError> {
    let mut conn = get_conn(&pool)?;

    let authors: Vec<User> = follows::table
        .inner_join(users::table.on(users::id.eq(follows::author_id)))
        .filter(follows::user_id.eq(user.id))
        .order(users::username.asc())
        .select(User::as_select())
        .load(&mut conn)?;

    let author_ids: Vec<i64> = authors.iter().map(|a| a.id).collect();

    // One query for every followed author's recipes; grouping happens in
    // memory instead of one query per author.
    let all_recipes: Vec<Recipe> = recipes::table
        .filter(recipes::author_id.eq_any(&author_ids))
        .order(recipes::pub_date.desc())
        .select(Recipe::as_select())
        .load(&mut conn)?;

    Ok(Json(build_feed(authors, all_recipes, params.recipes_limit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn author(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            password_hash: String::new(),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    fn recipe(id: i64, author_id: i64, name: &str, published_at: i64) -> Recipe {
        Recipe {
            id,
            author_id,
            name: name.to_string(),
            text: String::new(),
            cooking_time: 10,
            image: String::new(),
            pub_date: Utc.timestamp_opt(published_at, 0).unwrap(),
            short_url: format!("tok{id}"),
        }
    }

    #[test]
    fn test_limit_truncates_recipes_but_not_count() {
        // P1 published later than P2; the query hands recipes over newest
        // first, so the capped list must keep P1.
        let authors = vec![author(1, "xenia")];
        let all = vec![
            recipe(11, 1, "P1", 2_000),
            recipe(10, 1, "P2", 1_000),
        ];

        let feed = build_feed(authors, all, Some(1));
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].recipes.len(), 1);
        assert_eq!(feed[0].recipes[0].name, "P1");
        assert_eq!(feed[0].recipes_count, 2);
    }

    #[test]
    fn test_non_positive_limit_returns_everything() {
        let authors = vec![author(1, "xenia")];
        let all = vec![recipe(11, 1, "P1", 2_000), recipe(10, 1, "P2", 1_000)];

        for limit in [None, Some(0), Some(-5)] {
            let feed = build_feed(authors.clone(), all.clone(), limit);
            assert_eq!(feed[0].recipes.len(), 2);
            assert_eq!(feed[0].recipes_count, 2);
        }
    }

    #[test]
    fn test_author_order_is_preserved() {
        // The query orders authors by username; grouping must not reorder.
        let authors = vec![author(2, "anna"), author(1, "boris")];
        let feed = build_feed(authors, Vec::new(), None);

        assert_eq!(feed[0].username, "anna");
        assert_eq!(feed[1].username, "boris");
    }

    #[test]
    fn test_author_without_recipes_gets_empty_entry() {
        let authors = vec![author(1, "xenia")];
        let feed = build_feed(authors, Vec::new(), Some(3));

        assert_eq!(feed[0].recipes.len(), 0);
        assert_eq!(feed[0].recipes_count, 0);
    }

    #[test]
    fn test_recipes_are_grouped_per_author() {
        let authors = vec![author(1, "anna"), author(2, "boris")];
        let all = vec![
            recipe(30, 2, "B1", 3_000),
            recipe(20, 1, "A1", 2_000),
            recipe(10, 2, "B2", 1_000),
        ];

        let feed = build_feed(authors, all, None);
        assert_eq!(feed[0].recipes.len(), 1);
        assert_eq!(feed[1].recipes.len(), 2);
        assert_eq!(feed[1].recipes[0].name, "B1");
        assert_eq!(feed[1].recipes[1].name, "B2");
    }
}
