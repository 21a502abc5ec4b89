//! Favorite and shopping-cart membership over recipes.
//!
//! Favorites and the cart are the same relation structurally, so both live
//! in one table discriminated by `kind`. The (user, recipe, kind) pair is
//! unique at the database level; the precondition checks here exist to
//! produce precise error messages rather than raw constraint violations.

use std::collections::HashSet;

use diesel::prelude::*;

use crate::db::DbConn;
use crate::error::ApiError;
use crate::models::{NewMembership, Recipe};
use crate::schema::{memberships, recipes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipKind {
    Favorite,
    Cart,
}

impl MembershipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipKind::Favorite => "favorite",
            MembershipKind::Cart => "cart",
        }
    }

    fn display_name(self) -> &'static str {
        match self {
            MembershipKind::Favorite => "favorites",
            MembershipKind::Cart => "the shopping cart",
        }
    }
}

/// Add a recipe to the user's favorites or shopping cart.
///
/// Fails with `NotFound` if the recipe does not exist and with `Duplicate`
/// if the pair is already present. A concurrent insert of the same pair
/// loses the race at the unique index and surfaces as `Conflict`.
pub fn add(
    conn: &mut DbConn,
    user_id: i64,
    recipe_id: i64,
    kind: MembershipKind,
) -> Result<Recipe, ApiError> {
    conn.transaction(|conn| {
        let recipe: Recipe = recipes::table
            .find(recipe_id)
            .select(Recipe::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

        let already_member: bool = diesel::select(diesel::dsl::exists(
            memberships::table
                .filter(memberships::user_id.eq(user_id))
                .filter(memberships::recipe_id.eq(recipe_id))
                .filter(memberships::kind.eq(kind.as_str())),
        ))
        .get_result(conn)?;

        if already_member {
            return Err(ApiError::Duplicate(format!(
                "Recipe is already in {}",
                kind.display_name()
            )));
        }

        diesel::insert_into(memberships::table)
            .values(&NewMembership {
                user_id,
                recipe_id,
                kind: kind.as_str(),
            })
            .execute(conn)?;

        Ok(recipe)
    })
}

/// Remove a recipe from the user's favorites or shopping cart.
pub fn remove(
    conn: &mut DbConn,
    user_id: i64,
    recipe_id: i64,
    kind: MembershipKind,
) -> Result<(), ApiError> {
    let deleted = diesel::delete(
        memberships::table
            .filter(memberships::user_id.eq(user_id))
            .filter(memberships::recipe_id.eq(recipe_id))
            .filter(memberships::kind.eq(kind.as_str())),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound(format!(
            "Recipe is not in {}",
            kind.display_name()
        )));
    }

    Ok(())
}

/// All recipes in the user's set of the given kind.
pub fn list_recipes(
    conn: &mut DbConn,
    user_id: i64,
    kind: MembershipKind,
) -> Result<Vec<Recipe>, ApiError> {
    Ok(recipes::table
        .inner_join(memberships::table)
        .filter(memberships::user_id.eq(user_id))
        .filter(memberships::kind.eq(kind.as_str()))
        .select(Recipe::as_select())
        .load(conn)?)
}

/// Which of `recipe_ids` are in the user's set of the given kind.
///
/// Batched so a list response costs one query per kind instead of one
/// existence query per recipe.
pub fn member_ids(
    conn: &mut DbConn,
    user_id: i64,
    kind: MembershipKind,
    recipe_ids: &[i64],
) -> Result<HashSet<i64>, ApiError> {
    let ids: Vec<i64> = memberships::table
        .filter(memberships::user_id.eq(user_id))
        .filter(memberships::kind.eq(kind.as_str()))
        .filter(memberships::recipe_id.eq_any(recipe_ids))
        .select(memberships::recipe_id)
        .load(conn)?;

    Ok(ids.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminators_are_distinct() {
        assert_ne!(
            MembershipKind::Favorite.as_str(),
            MembershipKind::Cart.as_str()
        );
    }

    #[test]
    fn test_kind_strings_fit_column() {
        // The kind column is VARCHAR(16).
        assert!(MembershipKind::Favorite.as_str().len() <= 16);
        assert!(MembershipKind::Cart.as_str().len() <= 16);
    }
}
