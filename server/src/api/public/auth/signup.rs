use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::ErrorResponse;
use crate::auth::{create_session, hash_password};
use crate::db::{get_conn, DbPool};
use crate::error::ApiError;
use crate::models::{NewUser, User};
use crate::schema::users;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignupResponse {
    pub user_id: i64,
    pub token: String,
}

fn validate(req: &SignupRequest) -> Result<(), ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::Validation("Username cannot be empty".to_string()));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::Validation("Password cannot be empty".to_string()));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username or email already taken", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    validate(&req)?;

    let mut conn = get_conn(&pool)?;

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::Internal
    })?;

    let new_user = NewUser {
        username: &req.username,
        email: &req.email,
        first_name: &req.first_name,
        last_name: &req.last_name,
        password_hash: &password_hash,
    };

    let user: User = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
    {
        Ok(u) => u,
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            return Err(ApiError::Conflict(
                "Username or email already taken".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    let token = create_session(&mut conn, user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            token,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SignupRequest {
        SignupRequest {
            username: "chef".to_string(),
            email: "chef@example.com".to_string(),
            first_name: "Julia".to_string(),
            last_name: "Child".to_string(),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(validate(&request()).is_ok());
    }

    #[test]
    fn test_blank_username_rejected() {
        let mut req = request();
        req.username = "  ".to_string();
        assert!(matches!(validate(&req), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_mailless_email_rejected() {
        let mut req = request();
        req.email = "not-an-email".to_string();
        assert!(matches!(validate(&req), Err(ApiError::Validation(_))));
    }
}
