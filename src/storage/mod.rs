//! Persistence for users, projects and subtasks.
//!
//! Handlers only see [`Repository`]. Three implementations exist:
//! - [`PgStore`]: PostgreSQL through diesel and an r2d2 pool
//! - [`MemoryStore`]: process-local tables, optionally seeded with fixtures
//! - [`FallbackStore`]: PostgreSQL first, memory once the backend is unreachable

pub mod fallback;
pub mod memory;
pub mod postgres;
pub mod seed;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::RwLock;
use uuid::Uuid;

use crate::core::shared::models::{
    Evaluation, NewProject, NewSubtask, NewUser, Project, ProjectStatus, ProjectWithOwner, Role,
    Subtask, SubtaskStatus, User,
};

pub use fallback::FallbackStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the username or email is taken.
    /// The check and the insert happen atomically.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// `None` lists every user.
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// The owner must be an existing student.
    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError>;

    /// Verifies the faculty member and the student, then inserts, as one unit.
    /// Returns the created project and the student it was assigned to.
    async fn assign_project(
        &self,
        faculty_id: Uuid,
        project: NewProject,
    ) -> Result<(Project, User), StoreError>;

    async fn list_projects_by_student(&self, student_id: Uuid) -> Result<Vec<Project>, StoreError>;

    async fn list_all_projects(&self) -> Result<Vec<ProjectWithOwner>, StoreError>;

    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Project, StoreError>;

    async fn create_subtask(&self, subtask: NewSubtask) -> Result<Subtask, StoreError>;

    /// Newest first.
    async fn list_subtasks_by_project(&self, project_id: Uuid)
        -> Result<Vec<Subtask>, StoreError>;

    async fn update_subtask_status(
        &self,
        subtask_id: Uuid,
        status: SubtaskStatus,
        description: Option<String>,
    ) -> Result<Subtask, StoreError>;

    async fn evaluate_subtask(
        &self,
        subtask_id: Uuid,
        evaluation: Evaluation,
    ) -> Result<Subtask, StoreError>;
}

pub trait Repository: UserStore + ProjectStore {}

impl<T: UserStore + ProjectStore> Repository for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendSnapshot {
    pub mode: BackendMode,
    pub url: Option<String>,
    pub since: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Which store currently serves requests. Shared with `/db-status`.
#[derive(Debug)]
pub struct BackendStatus {
    url: Option<String>,
    state: RwLock<(BackendMode, DateTime<Utc>, Option<String>)>,
}

impl BackendStatus {
    pub fn primary(redacted_url: String) -> Self {
        Self {
            url: Some(redacted_url),
            state: RwLock::new((BackendMode::Primary, Utc::now(), None)),
        }
    }

    pub fn fallback(redacted_url: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            url: redacted_url,
            state: RwLock::new((BackendMode::Fallback, Utc::now(), Some(reason.into()))),
        }
    }

    pub fn mode(&self) -> BackendMode {
        self.state
            .read()
            .map(|state| state.0)
            .unwrap_or(BackendMode::Fallback)
    }

    pub fn is_primary(&self) -> bool {
        self.mode() == BackendMode::Primary
    }

    /// Returns `true` only for the call that actually flipped the mode.
    pub fn degrade(&self, reason: &str) -> bool {
        match self.state.write() {
            Ok(mut state) if state.0 == BackendMode::Primary => {
                *state = (BackendMode::Fallback, Utc::now(), Some(reason.to_string()));
                true
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> BackendSnapshot {
        let (mode, since, reason) = self
            .state
            .read()
            .map(|state| state.clone())
            .unwrap_or_else(|_| (BackendMode::Fallback, Utc::now(), None));
        BackendSnapshot {
            mode,
            url: self.url.clone(),
            since,
            reason,
        }
    }
}
