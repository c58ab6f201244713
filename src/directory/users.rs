use axum::{extract::State, response::Json};
use std::sync::Arc;

use crate::core::shared::models::{Role, User};
use crate::core::shared::{ApiError, AppState};

async fn users_with_role(
    state: &AppState,
    role: Option<Role>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.store.list_users(role).await?;
    Ok(Json(users))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, ApiError> {
    users_with_role(&state, None).await
}

pub async fn list_students(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    users_with_role(&state, Some(Role::Student)).await
}

pub async fn list_faculty(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    users_with_role(&state, Some(Role::Faculty)).await
}
