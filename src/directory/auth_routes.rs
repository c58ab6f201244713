use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{error, info, warn};
use serde::Deserialize;
use std::sync::Arc;

use crate::core::shared::models::{NewUser, Role, User};
use crate::core::shared::{ApiError, AppState};
use crate::storage::StoreError;

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    #[serde(alias = "facultyId")]
    pub faculty_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates a signup, hashes the password and stores the account.
pub async fn register_user(state: &AppState, req: SignupRequest) -> Result<User, ApiError> {
    let (Some(username), Some(email), Some(password)) = (
        present(req.username),
        present(req.email),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Validation(
            "Missing required fields: username, email, and password are required".into(),
        ));
    };

    let role: Role = req
        .role
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .parse()
        .map_err(|_| ApiError::Validation("Invalid role. Must be 'student' or 'faculty'".into()))?;

    let (student_id, faculty_id) = match role {
        Role::Student => {
            let id = present(req.student_id).ok_or_else(|| {
                ApiError::Validation("Student ID is required for student accounts".into())
            })?;
            (Some(id), None)
        }
        Role::Faculty => {
            let id = present(req.faculty_id).ok_or_else(|| {
                ApiError::Validation("Faculty ID is required for faculty accounts".into())
            })?;
            (None, Some(id))
        }
    };

    state
        .passwords
        .validate(&password)
        .map_err(|issue| ApiError::Validation(issue.message()))?;

    let passwords = Arc::clone(&state.passwords);
    let password_hash = tokio::task::spawn_blocking(move || passwords.hash(&password))
        .await
        .map_err(|e| ApiError::internal("Password hashing task failed", e))?
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    let user = state
        .store
        .create_user(NewUser {
            username,
            email,
            password_hash,
            role,
            student_id,
            faculty_id,
        })
        .await
        .map_err(|e| {
            if let StoreError::Conflict(reason) = &e {
                warn!("[SIGNUP] Rejected: {reason}");
            }
            ApiError::from(e)
        })?;

    info!("[SIGNUP] Registered {} as {}", user.username, user.role);
    Ok(user)
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let user = register_user(&state, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User registered successfully",
            "user": user,
        })),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    let (Some(username), Some(password)) =
        (present(req.username), req.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::Validation("Username and password are required".into()));
    };

    let invalid = || ApiError::Unauthorized("Invalid username or password".into());

    let Some(user) = state.store.find_user_by_username(&username).await? else {
        info!("[LOGIN] Unknown username {username}");
        return Err(invalid());
    };

    let passwords = Arc::clone(&state.passwords);
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || passwords.verify(&password, &hash))
        .await
        .map_err(|e| ApiError::internal("Password verification task failed", e))?
        .map_err(|e| {
            error!("[LOGIN] Stored hash for {} is unusable", user.username);
            ApiError::internal("Failed to verify password", e)
        })?;

    if !verified {
        info!("[LOGIN] Wrong password for {}", user.username);
        return Err(invalid());
    }

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| ApiError::internal("Failed to issue session token", e))?;

    info!("[LOGIN] {} signed in", user.username);
    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "user": user,
        "token": token,
    })))
}
