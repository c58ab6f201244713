//! Domain records shared by the stores and the HTTP layer.
//!
//! Status values are closed enumerations. Each one knows which transitions it
//! accepts; stores consult [`ProjectStatus::can_transition_to`] and
//! [`SubtaskStatus::can_transition_to`] before mutating a record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Re-asserting the current status is always accepted.
    pub fn can_transition_to(&self, next: Self) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Active, Self::Completed)
                | (Self::Active, Self::Cancelled)
                | (Self::Completed, Self::Active)
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("project status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubtaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl SubtaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Re-asserting the current status is always accepted. A completed
    /// subtask may only go back to in-progress.
    pub fn can_transition_to(&self, next: Self) -> bool {
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Completed)
                | (Self::InProgress, Self::Pending)
                | (Self::InProgress, Self::Completed)
                | (Self::Completed, Self::InProgress)
        )
    }
}

impl fmt::Display for SubtaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownVariant::new("subtask status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A registered account. The password hash never leaves the process: it is
/// skipped on serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub faculty_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub faculty_id: Option<String>,
}

impl NewUser {
    pub fn into_user(self, id: Uuid, created_at: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            student_id: self.student_id,
            faculty_id: self.faculty_id,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub student_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

impl NewProject {
    pub fn into_project(self, id: Uuid, created_at: DateTime<Utc>) -> Project {
        Project {
            id,
            student_id: self.student_id,
            title: self.title,
            description: self.description,
            status: ProjectStatus::default(),
            due_date: self.due_date,
            created_at,
            updated_at: None,
        }
    }
}

/// Owner columns attached to a project listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectOwner {
    pub username: String,
    pub student_id: Option<String>,
}

/// A project with its owner, `users` is null when the owner row is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectWithOwner {
    #[serde(flatten)]
    pub project: Project,
    pub users: Option<ProjectOwner>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subtask {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: SubtaskStatus,
    pub marks: Option<f64>,
    pub feedback: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSubtask {
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

impl NewSubtask {
    pub fn into_subtask(self, id: Uuid, created_at: DateTime<Utc>) -> Subtask {
        Subtask {
            id,
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            status: SubtaskStatus::default(),
            marks: None,
            feedback: None,
            due_date: self.due_date,
            created_at,
            evaluated_at: None,
            updated_at: None,
        }
    }
}

/// Grading applied by faculty to a subtask.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub marks: f64,
    pub feedback: Option<String>,
    pub status: SubtaskStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!("in-progress".parse::<SubtaskStatus>(), Ok(SubtaskStatus::InProgress));
        assert_eq!(SubtaskStatus::InProgress.as_str(), "in-progress");
        assert_eq!(
            serde_json::to_value(SubtaskStatus::InProgress).unwrap(),
            serde_json::json!("in-progress")
        );
        assert_eq!("cancelled".parse::<ProjectStatus>(), Ok(ProjectStatus::Cancelled));
        assert!("archived".parse::<ProjectStatus>().is_err());
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_project_transitions() {
        assert!(ProjectStatus::Active.can_transition_to(ProjectStatus::Completed));
        assert!(ProjectStatus::Active.can_transition_to(ProjectStatus::Cancelled));
        assert!(ProjectStatus::Completed.can_transition_to(ProjectStatus::Active));
        assert!(ProjectStatus::Cancelled.can_transition_to(ProjectStatus::Cancelled));
        assert!(!ProjectStatus::Cancelled.can_transition_to(ProjectStatus::Active));
        assert!(!ProjectStatus::Completed.can_transition_to(ProjectStatus::Cancelled));
    }

    #[test]
    fn test_subtask_transitions() {
        assert!(SubtaskStatus::Pending.can_transition_to(SubtaskStatus::Completed));
        assert!(SubtaskStatus::InProgress.can_transition_to(SubtaskStatus::Pending));
        assert!(SubtaskStatus::Completed.can_transition_to(SubtaskStatus::InProgress));
        assert!(!SubtaskStatus::Completed.can_transition_to(SubtaskStatus::Pending));
    }

    #[test]
    fn test_user_serialization_omits_password() {
        let user = NewUser {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Student,
            student_id: Some("STU100".into()),
            faculty_id: None,
        }
        .into_user(Uuid::new_v4(), Utc::now());

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"student\""));
    }

    #[test]
    fn test_project_with_owner_flattens() {
        let project = NewProject {
            student_id: Uuid::new_v4(),
            title: "Compiler".into(),
            description: "Toy compiler".into(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15),
        }
        .into_project(Uuid::new_v4(), Utc::now());

        let value = serde_json::to_value(ProjectWithOwner {
            project,
            users: None,
        })
        .unwrap();
        assert_eq!(value["title"], "Compiler");
        assert_eq!(value["status"], "active");
        assert_eq!(value["due_date"], "2024-03-15");
        assert!(value["users"].is_null());
    }
}
