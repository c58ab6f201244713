use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::shared::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct CreateProjectRequest {
    pub student_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub faculty_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSubtaskRequest {
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSubtaskStatusRequest {
    pub status: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateSubtaskRequest {
    pub marks: Option<f64>,
    pub feedback: Option<String>,
    pub status: Option<String>,
}

pub fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}

pub fn parse_uuid(value: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::Validation(format!("{field} must be a valid UUID")))
}

/// `YYYY-MM-DD`; blank means no due date.
pub fn parse_due_date(value: Option<String>) -> Result<Option<NaiveDate>, ApiError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::Validation(format!("Invalid due_date '{raw}', expected YYYY-MM-DD"))),
    }
}

pub fn parse_status<S: FromStr>(value: Option<String>) -> Result<S, ApiError>
where
    S::Err: std::fmt::Display,
{
    required(value, "status")?
        .parse()
        .map_err(|e: S::Err| ApiError::Validation(format!("Invalid status: {e}")))
}
