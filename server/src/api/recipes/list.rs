use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::membership::{self, MembershipKind};
use crate::models::Recipe;
use crate::schema::{memberships, recipe_tags, recipes, tags, users};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecipesParams {
    /// Number of items to return (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
    /// Filter by author id
    pub author: Option<i64>,
    /// Comma-separated tag slugs; a recipe matches if it carries any of them
    pub tags: Option<String>,
    /// Only recipes the caller has favorited
    pub is_favorited: Option<bool>,
    /// Only recipes in the caller's shopping cart
    pub is_in_shopping_cart: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
    pub author_id: i64,
    pub author_username: String,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total_count: i64,
}

/// Split the comma-separated tag filter into clean slugs.
fn parse_tag_slugs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the filtered recipes query. Called twice per request: once for the
/// page of rows, once for the untruncated count.
fn filtered_recipes<'a>(
    viewer_id: i64,
    params: &ListRecipesParams,
) -> recipes::BoxedQuery<'a, Pg> {
    let mut query = recipes::table.into_boxed();

    if let Some(author) = params.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    if let Some(ref raw) = params.tags {
        let slugs = parse_tag_slugs(raw);
        if !slugs.is_empty() {
            query = query.filter(
                recipes::id.eq_any(
                    recipe_tags::table
                        .inner_join(tags::table)
                        .filter(tags::slug.eq_any(slugs))
                        .select(recipe_tags::recipe_id),
                ),
            );
        }
    }

    if params.is_favorited == Some(true) {
        query = query.filter(
            recipes::id.eq_any(
                memberships::table
                    .filter(memberships::user_id.eq(viewer_id))
                    .filter(memberships::kind.eq(MembershipKind::Favorite.as_str()))
                    .select(memberships::recipe_id),
            ),
        );
    }

    if params.is_in_shopping_cart == Some(true) {
        query = query.filter(
            recipes::id.eq_any(
                memberships::table
                    .filter(memberships::user_id.eq(viewer_id))
                    .filter(memberships::kind.eq(MembershipKind::Cart.as_str()))
                    .select(memberships::recipe_id),
            ),
        );
    }

    query
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Recipes, newest first", body = ListRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_recipes(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListRecipesParams>,
) -> Result<Json<ListRecipesResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut conn = get_conn(&pool)?;

    let total_count: i64 = filtered_recipes(user.id, &params)
        .count()
        .get_result(&mut conn)?;

    let page: Vec<Recipe> = filtered_recipes(user.id, &params)
        .order(recipes::pub_date.desc())
        .limit(limit)
        .offset(offset)
        .select(Recipe::as_select())
        .load(&mut conn)?;

    let recipe_ids: Vec<i64> = page.iter().map(|r| r.id).collect();

    // Caller-dependent flags and joined rows are fetched per response, not
    // per recipe.
    let favorited = membership::member_ids(&mut conn, user.id, MembershipKind::Favorite, &recipe_ids)?;
    let in_cart = membership::member_ids(&mut conn, user.id, MembershipKind::Cart, &recipe_ids)?;

    let author_ids: Vec<i64> = page
        .iter()
        .map(|r| r.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let usernames: HashMap<i64, String> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select((users::id, users::username))
        .load::<(i64, String)>(&mut conn)?
        .into_iter()
        .collect();

    let mut slugs_by_recipe: HashMap<i64, Vec<String>> = HashMap::new();
    let tag_rows: Vec<(i64, String)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .order(tags::slug.asc())
        .select((recipe_tags::recipe_id, tags::slug))
        .load(&mut conn)?;
    for (recipe_id, slug) in tag_rows {
        slugs_by_recipe.entry(recipe_id).or_default().push(slug);
    }

    let summaries = page
        .into_iter()
        .map(|recipe| RecipeSummary {
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            author_username: usernames.get(&recipe.author_id).cloned().unwrap_or_default(),
            tags: slugs_by_recipe.remove(&recipe.id).unwrap_or_default(),
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
            author_id: recipe.author_id,
            pub_date: recipe.pub_date,
        })
        .collect();

    Ok(Json(ListRecipesResponse {
        recipes: summaries,
        total_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_tag_filter() {
        assert!(parse_tag_slugs("").is_empty());
        assert!(parse_tag_slugs(" , ,").is_empty());
    }

    #[test]
    fn test_parse_single_slug() {
        assert_eq!(parse_tag_slugs("dinner"), vec!["dinner"]);
    }

    #[test]
    fn test_parse_multiple_slugs_with_whitespace() {
        assert_eq!(
            parse_tag_slugs("dinner, quick ,breakfast"),
            vec!["dinner", "quick", "breakfast"]
        );
    }
}
