use axum::{extract::State, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::ErrorResponse;
use crate::auth::{create_session, verify_password};
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::models::User;
use crate::schema::users;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in successfully", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut conn = get_conn(&pool)?;

    let user: Option<User> = users::table
        .filter(users::email.eq(&req.email))
        .select(User::as_select())
        .first(&mut conn)
        .optional()?;

    // Same response for unknown email and wrong password.
    let user = user.ok_or_else(|| {
        ApiError::Unauthorized("Invalid email or password".to_string())
    })?;

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let token = create_session(&mut conn, user.id)?;

    Ok(Json(LoginResponse { token }))
}
