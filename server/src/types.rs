//! Response shapes shared across API modules.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Recipe, User};

/// Compact recipe representation used by membership responses and the
/// subscription feed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortRecipe {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&Recipe> for ShortRecipe {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }
}

/// User representation with the caller-dependent subscription flag.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserProfile {
    pub fn new(user: &User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}
