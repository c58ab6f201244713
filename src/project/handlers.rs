use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use log::{info, warn};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{
    parse_due_date, parse_status, parse_uuid, required, CreateProjectRequest,
    CreateSubtaskRequest, EvaluateSubtaskRequest, UpdateProjectStatusRequest,
    UpdateSubtaskStatusRequest,
};
use crate::core::shared::models::{
    Evaluation, NewProject, NewSubtask, Project, ProjectStatus, ProjectWithOwner, Subtask,
    SubtaskStatus,
};
use crate::core::shared::{ApiError, AppState};
use crate::progress::{compute_progress, ProgressSummary};

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type PathId = Result<Path<Uuid>, PathRejection>;

fn created<T: serde::Serialize>(message: String, data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({ "message": message, "data": data })))
}

fn updated<T: serde::Serialize>(message: &str, data: T) -> Json<serde_json::Value> {
    Json(json!({ "message": message, "data": data }))
}

fn new_project(req: CreateProjectRequest) -> Result<(NewProject, Option<String>), ApiError> {
    let student_id = parse_uuid(&required(req.student_id, "student_id")?, "student_id")?;
    let project = NewProject {
        student_id,
        title: required(req.title, "title")?,
        description: req.description.unwrap_or_default(),
        due_date: parse_due_date(req.due_date)?,
    };
    let faculty_id = req.faculty_id.filter(|id| !id.trim().is_empty());
    Ok((project, faculty_id))
}

async fn insert_project(
    state: &AppState,
    project: NewProject,
    faculty_id: Option<String>,
) -> Result<impl IntoResponse, ApiError> {
    match faculty_id {
        Some(faculty_id) => {
            let faculty_id = parse_uuid(faculty_id.trim(), "faculty_id")?;
            let (project, student) = state.store.assign_project(faculty_id, project).await?;
            info!(
                "[PROJECT] Faculty {faculty_id} assigned '{}' to {}",
                project.title, student.username
            );
            Ok(created(
                format!("Project assigned to {} successfully", student.username),
                project,
            ))
        }
        None => {
            let project = state.store.create_project(project).await?;
            info!("[PROJECT] Created '{}' for student {}", project.title, project.student_id);
            Ok(created("Project created successfully".to_string(), project))
        }
    }
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let (project, faculty_id) = new_project(req)?;
    insert_project(&state, project, faculty_id).await
}

pub async fn assign_project(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let (project, faculty_id) = new_project(req)?;
    let faculty_id = faculty_id.ok_or_else(|| ApiError::Validation("faculty_id is required".into()))?;
    insert_project(&state, project, Some(faculty_id)).await
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProjectWithOwner>>, ApiError> {
    Ok(Json(state.store.list_all_projects().await?))
}

pub async fn list_student_projects(
    State(state): State<Arc<AppState>>,
    path: PathId,
) -> Result<Json<Vec<Project>>, ApiError> {
    let Path(student_id) = path?;
    Ok(Json(state.store.list_projects_by_student(student_id).await?))
}

pub async fn update_project_status(
    State(state): State<Arc<AppState>>,
    path: PathId,
    payload: JsonBody<UpdateProjectStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Path(project_id) = path?;
    let Json(req) = payload?;
    let status: ProjectStatus = parse_status(req.status)?;

    let project = state
        .store
        .update_project_status(project_id, status)
        .await
        .inspect_err(|e| warn!("[PROJECT] Status change on {project_id} to {status} refused: {e}"))?;
    info!("[PROJECT] {project_id} is now {status}");
    Ok(updated("Project status updated successfully", project))
}

pub async fn list_subtasks(
    State(state): State<Arc<AppState>>,
    path: PathId,
) -> Result<Json<Vec<Subtask>>, ApiError> {
    let Path(project_id) = path?;
    Ok(Json(state.store.list_subtasks_by_project(project_id).await?))
}

pub async fn create_subtask(
    State(state): State<Arc<AppState>>,
    payload: JsonBody<CreateSubtaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let subtask = NewSubtask {
        project_id: parse_uuid(&required(req.project_id, "project_id")?, "project_id")?,
        title: required(req.title, "title")?,
        description: req.description.unwrap_or_default(),
        due_date: parse_due_date(req.due_date)?,
    };

    let subtask = state.store.create_subtask(subtask).await?;
    info!("[SUBTASK] Added '{}' to project {}", subtask.title, subtask.project_id);
    Ok(created("Subtask added successfully".to_string(), subtask))
}

pub async fn update_subtask_status(
    State(state): State<Arc<AppState>>,
    path: PathId,
    payload: JsonBody<UpdateSubtaskStatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Path(subtask_id) = path?;
    let Json(req) = payload?;
    let status: SubtaskStatus = parse_status(req.status)?;

    let subtask = state
        .store
        .update_subtask_status(subtask_id, status, req.description)
        .await?;
    info!("[SUBTASK] {subtask_id} is now {status}");
    Ok(updated("Subtask status updated successfully", subtask))
}

pub async fn evaluate_subtask(
    State(state): State<Arc<AppState>>,
    path: PathId,
    payload: JsonBody<EvaluateSubtaskRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Path(subtask_id) = path?;
    let Json(req) = payload?;

    let marks = req
        .marks
        .ok_or_else(|| ApiError::Validation("marks is required".into()))?;
    if !marks.is_finite() || marks < 0.0 {
        return Err(ApiError::Validation("marks must be a non-negative number".into()));
    }
    let evaluation = Evaluation {
        marks,
        feedback: req.feedback.filter(|f| !f.trim().is_empty()),
        status: parse_status(req.status)?,
    };

    let subtask = state.store.evaluate_subtask(subtask_id, evaluation).await?;
    info!("[EVALUATE] Subtask {subtask_id} graded {marks}");
    Ok(updated("Subtask evaluated successfully", subtask))
}

pub async fn project_progress(
    State(state): State<Arc<AppState>>,
    path: PathId,
) -> Result<Json<ProgressSummary>, ApiError> {
    let Path(project_id) = path?;
    let subtasks = state.store.list_subtasks_by_project(project_id).await?;
    Ok(Json(compute_progress(&subtasks)))
}
