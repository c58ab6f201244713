use async_trait::async_trait;
use log::{error, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::{BackendStatus, MemoryStore, ProjectStore, Repository, StoreError, UserStore};
use crate::core::shared::models::{
    Evaluation, NewProject, NewSubtask, NewUser, Project, ProjectStatus, ProjectWithOwner, Role,
    Subtask, SubtaskStatus, User,
};

/// Runs `$call` against the primary while it is healthy. An `Unavailable`
/// error degrades the backend for good and the call is replayed on memory.
macro_rules! dispatch {
    ($self:ident, $op:literal, $store:ident => $call:expr) => {{
        if let Some(primary) = $self.active_primary() {
            let $store: &dyn Repository = primary.as_ref();
            match $call.await {
                Err(StoreError::Unavailable(reason)) => $self.degrade($op, &reason),
                result => return result,
            }
        }
        let $store = $self.memory.as_ref();
        $call.await
    }};
}

pub struct FallbackStore {
    primary: Option<Arc<dyn Repository>>,
    memory: Arc<MemoryStore>,
    status: Arc<BackendStatus>,
}

impl FallbackStore {
    pub fn new(
        primary: Option<Arc<dyn Repository>>,
        memory: Arc<MemoryStore>,
        status: Arc<BackendStatus>,
    ) -> Self {
        Self {
            primary,
            memory,
            status,
        }
    }

    fn active_primary(&self) -> Option<&Arc<dyn Repository>> {
        self.primary.as_ref().filter(|_| self.status.is_primary())
    }

    fn degrade(&self, op: &str, reason: &str) {
        if self.status.degrade(reason) {
            error!("[FALLBACK] {op} failed on PostgreSQL ({reason}); serving from in-memory store from now on");
        } else {
            warn!("[FALLBACK] {op} failed on PostgreSQL ({reason}); retrying in memory");
        }
    }

    fn note_volatile_write<T>(&self, op: &str, result: &Result<T, StoreError>) {
        if result.is_ok() {
            warn!("[FALLBACK] {op} stored in memory only, it will be lost on restart");
        }
    }
}

#[async_trait]
impl UserStore for FallbackStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        dispatch!(self, "find_user_by_username", store => store.find_user_by_username(username))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        dispatch!(self, "find_user", store => store.find_user(id))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let result = dispatch!(self, "create_user", store => store.create_user(user.clone()));
        self.note_volatile_write("create_user", &result);
        result
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, StoreError> {
        dispatch!(self, "list_users", store => store.list_users(role))
    }
}

#[async_trait]
impl ProjectStore for FallbackStore {
    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let result = dispatch!(self, "create_project", store => store.create_project(project.clone()));
        self.note_volatile_write("create_project", &result);
        result
    }

    async fn assign_project(
        &self,
        faculty_id: Uuid,
        project: NewProject,
    ) -> Result<(Project, User), StoreError> {
        let result = dispatch!(self, "assign_project", store => store.assign_project(faculty_id, project.clone()));
        self.note_volatile_write("assign_project", &result);
        result
    }

    async fn list_projects_by_student(&self, student_id: Uuid) -> Result<Vec<Project>, StoreError> {
        dispatch!(self, "list_projects_by_student", store => store.list_projects_by_student(student_id))
    }

    async fn list_all_projects(&self) -> Result<Vec<ProjectWithOwner>, StoreError> {
        dispatch!(self, "list_all_projects", store => store.list_all_projects())
    }

    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Project, StoreError> {
        let result = dispatch!(self, "update_project_status", store => store.update_project_status(project_id, status));
        self.note_volatile_write("update_project_status", &result);
        result
    }

    async fn create_subtask(&self, subtask: NewSubtask) -> Result<Subtask, StoreError> {
        let result = dispatch!(self, "create_subtask", store => store.create_subtask(subtask.clone()));
        self.note_volatile_write("create_subtask", &result);
        result
    }

    async fn list_subtasks_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Subtask>, StoreError> {
        dispatch!(self, "list_subtasks_by_project", store => store.list_subtasks_by_project(project_id))
    }

    async fn update_subtask_status(
        &self,
        subtask_id: Uuid,
        status: SubtaskStatus,
        description: Option<String>,
    ) -> Result<Subtask, StoreError> {
        let result = dispatch!(self, "update_subtask_status", store => store.update_subtask_status(subtask_id, status, description.clone()));
        self.note_volatile_write("update_subtask_status", &result);
        result
    }

    async fn evaluate_subtask(
        &self,
        subtask_id: Uuid,
        evaluation: Evaluation,
    ) -> Result<Subtask, StoreError> {
        let result = dispatch!(self, "evaluate_subtask", store => store.evaluate_subtask(subtask_id, evaluation.clone()));
        self.note_volatile_write("evaluate_subtask", &result);
        result
    }
}
