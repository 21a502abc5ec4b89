use axum::{extract::State, http::header, response::IntoResponse};
use diesel::prelude::*;
use std::sync::Arc;

use potluck_core::shopping_list::{aggregate, IngredientLine, ShoppingListEntry};

use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::membership::{self, MembershipKind};
use crate::schema::{ingredients, recipe_ingredients};

/// Render consolidated entries as the plain-text file the user downloads.
fn render_shopping_list(entries: &[ShoppingListEntry]) -> String {
    let mut body = String::from("Shopping list\n\n");
    for entry in entries {
        body.push_str(&format!(
            "{} ({}) - {}\n",
            entry.name, entry.measurement_unit, entry.total_amount
        ));
    }
    body
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "shopping_cart",
    responses(
        (status = 200, description = "Consolidated shopping list as a text file", content_type = "text/plain"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = get_conn(&pool)?;

    let cart = membership::list_recipes(&mut conn, user.id, MembershipKind::Cart)?;
    let recipe_ids: Vec<i64> = cart.iter().map(|r| r.id).collect();

    // Every ingredient line of every recipe in the cart. An empty cart
    // yields an empty list, not an error.
    let lines: Vec<(String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(&mut conn)?;

    let entries = aggregate(lines.into_iter().map(
        |(name, measurement_unit, amount)| IngredientLine {
            name,
            measurement_unit,
            amount: i64::from(amount),
        },
    ));

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        render_shopping_list(&entries),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render_shopping_list(&[]), "Shopping list\n\n");
    }

    #[test]
    fn test_render_lines() {
        let entries = vec![
            ShoppingListEntry {
                name: "Salt".to_string(),
                measurement_unit: "g".to_string(),
                total_amount: 15,
            },
            ShoppingListEntry {
                name: "Sugar".to_string(),
                measurement_unit: "g".to_string(),
                total_amount: 20,
            },
        ];

        let body = render_shopping_list(&entries);
        assert_eq!(body, "Shopping list\n\nSalt (g) - 15\nSugar (g) - 20\n");
    }
}
