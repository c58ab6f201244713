//! Projects, subtasks, grading and progress.

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::core::shared::AppState;
use crate::core::urls::ApiUrls;

pub mod handlers;
pub mod types;

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::PROJECTS, get(handlers::list_projects))
        .route(ApiUrls::PROJECT_CREATE, post(handlers::create_project))
        .route(ApiUrls::PROJECT_ASSIGN, post(handlers::assign_project))
        .route(ApiUrls::PROJECT_STATUS, put(handlers::update_project_status))
        .route(ApiUrls::PROJECT_SUBTASKS, get(handlers::list_subtasks))
        .route(ApiUrls::PROJECT_PROGRESS, get(handlers::project_progress))
        .route(ApiUrls::STUDENT_PROJECTS, get(handlers::list_student_projects))
        .route(ApiUrls::SUBTASK_CREATE, post(handlers::create_subtask))
        .route(ApiUrls::SUBTASK_STATUS, put(handlers::update_subtask_status))
        .route(ApiUrls::SUBTASK_EVALUATE, put(handlers::evaluate_subtask))
}
