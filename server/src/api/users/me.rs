use axum::Json;

use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::types::UserProfile;

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The authenticated user", body = UserProfile),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    // is_subscribed is always false for the caller's own profile.
    Json(UserProfile::new(&user, false))
}
