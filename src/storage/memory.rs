//! In-memory store used when no database is reachable.
//!
//! All tables sit behind one lock so that existence and uniqueness checks run
//! under the same write guard as the mutation they protect. Nothing written
//! here survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectStore, StoreError, UserStore};
use crate::core::shared::models::{
    Evaluation, NewProject, NewSubtask, NewUser, Project, ProjectOwner, ProjectStatus,
    ProjectWithOwner, Role, Subtask, SubtaskStatus, User,
};

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) users: Vec<User>,
    pub(crate) projects: Vec<Project>,
    pub(crate) subtasks: Vec<Subtask>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn user_with_role(&self, id: Uuid, role: Role) -> Option<&User> {
        self.user(id).filter(|u| u.role == role)
    }

    fn insert_project(&mut self, project: NewProject) -> Project {
        let project = project.into_project(Uuid::new_v4(), Utc::now());
        self.projects.push(project.clone());
        project
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    #[cfg(test)]
    pub(crate) async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    #[cfg(test)]
    pub(crate) async fn find_subtask(&self, id: Uuid) -> Option<Subtask> {
        let tables = self.tables.read().await;
        tables.subtasks.iter().find(|s| s.id == id).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("Username already exists".into()));
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email already exists".into()));
        }

        let user = user.into_user(Uuid::new_v4(), Utc::now());
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.user_with_role(project.student_id, Role::Student).is_none() {
            return Err(StoreError::NotFound("Student not found".into()));
        }
        Ok(tables.insert_project(project))
    }

    async fn assign_project(
        &self,
        faculty_id: Uuid,
        project: NewProject,
    ) -> Result<(Project, User), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.user_with_role(faculty_id, Role::Faculty).is_none() {
            return Err(StoreError::Forbidden("Invalid faculty ID".into()));
        }
        let student = tables
            .user_with_role(project.student_id, Role::Student)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Student not found".into()))?;
        Ok((tables.insert_project(project), student))
    }

    async fn list_projects_by_student(&self, student_id: Uuid) -> Result<Vec<Project>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .filter(|p| p.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn list_all_projects(&self) -> Result<Vec<ProjectWithOwner>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .map(|project| ProjectWithOwner {
                users: tables.user(project.student_id).map(|u| ProjectOwner {
                    username: u.username.clone(),
                    student_id: u.student_id.clone(),
                }),
                project: project.clone(),
            })
            .collect())
    }

    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        let project = tables
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| StoreError::NotFound("Project not found".into()))?;

        if !project.status.can_transition_to(status) {
            return Err(StoreError::transition(project.status, status));
        }
        project.status = status;
        project.updated_at = Some(Utc::now());
        Ok(project.clone())
    }

    async fn create_subtask(&self, subtask: NewSubtask) -> Result<Subtask, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.projects.iter().any(|p| p.id == subtask.project_id) {
            return Err(StoreError::NotFound("Project not found".into()));
        }
        let subtask = subtask.into_subtask(Uuid::new_v4(), Utc::now());
        tables.subtasks.push(subtask.clone());
        Ok(subtask)
    }

    async fn list_subtasks_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Subtask>, StoreError> {
        let tables = self.tables.read().await;
        // Reverse first so that equal timestamps keep the latest insert on top.
        let mut subtasks: Vec<Subtask> = tables
            .subtasks
            .iter()
            .rev()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        subtasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subtasks)
    }

    async fn update_subtask_status(
        &self,
        subtask_id: Uuid,
        status: SubtaskStatus,
        description: Option<String>,
    ) -> Result<Subtask, StoreError> {
        let mut tables = self.tables.write().await;
        let subtask = tables
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| StoreError::NotFound("Subtask not found".into()))?;

        if !subtask.status.can_transition_to(status) {
            return Err(StoreError::transition(subtask.status, status));
        }
        subtask.status = status;
        if let Some(description) = description {
            subtask.description = description;
        }
        subtask.updated_at = Some(Utc::now());
        Ok(subtask.clone())
    }

    async fn evaluate_subtask(
        &self,
        subtask_id: Uuid,
        evaluation: Evaluation,
    ) -> Result<Subtask, StoreError> {
        let mut tables = self.tables.write().await;
        let subtask = tables
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| StoreError::NotFound("Subtask not found".into()))?;

        if !subtask.status.can_transition_to(evaluation.status) {
            return Err(StoreError::transition(subtask.status, evaluation.status));
        }
        let now = Utc::now();
        subtask.marks = Some(evaluation.marks);
        subtask.feedback = evaluation.feedback;
        subtask.status = evaluation.status;
        subtask.evaluated_at = Some(now);
        subtask.updated_at = Some(now);
        Ok(subtask.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(username: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "$argon2id$fixture".into(),
            role,
            student_id: (role == Role::Student).then(|| "STU900".to_string()),
            faculty_id: (role == Role::Faculty).then(|| "FAC900".to_string()),
        }
    }

    async fn store_with_people() -> (MemoryStore, User, User) {
        let store = MemoryStore::new();
        let student = store
            .create_user(new_user("ada", "ada@example.com", Role::Student))
            .await
            .unwrap();
        let faculty = store
            .create_user(new_user("turing", "turing@example.com", Role::Faculty))
            .await
            .unwrap();
        (store, student, faculty)
    }

    fn new_project(student_id: Uuid) -> NewProject {
        NewProject {
            student_id,
            title: "Parser".into(),
            description: "Recursive descent".into(),
            due_date: None,
        }
    }

    fn new_subtask(project_id: Uuid, title: &str) -> NewSubtask {
        NewSubtask {
            project_id,
            title: title.into(),
            description: String::new(),
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_rejected() {
        let (store, _, _) = store_with_people().await;

        let by_name = store
            .create_user(new_user("ada", "other@example.com", Role::Student))
            .await;
        assert_eq!(
            by_name,
            Err(StoreError::Conflict("Username already exists".into()))
        );

        let by_email = store
            .create_user(new_user("ada2", "ada@example.com", Role::Student))
            .await;
        assert_eq!(by_email, Err(StoreError::Conflict("Email already exists".into())));
        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_signups_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .create_user(new_user("racer", &format!("racer{i}@example.com"), Role::Student))
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_list_users_by_role() {
        let (store, student, faculty) = store_with_people().await;
        let students = store.list_users(Some(Role::Student)).await.unwrap();
        assert_eq!(students, vec![student.clone()]);
        let faculty_list = store.list_users(Some(Role::Faculty)).await.unwrap();
        assert_eq!(faculty_list, vec![faculty.clone()]);
        assert_eq!(store.list_users(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_project_requires_student() {
        let (store, student, faculty) = store_with_people().await;

        let project = store.create_project(new_project(student.id)).await.unwrap();
        assert_eq!(project.status, ProjectStatus::Active);
        assert!(project.updated_at.is_none());

        let err = store.create_project(new_project(faculty.id)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_assign_project_checks_faculty_then_student() {
        let (store, student, faculty) = store_with_people().await;

        let err = store
            .assign_project(student.id, new_project(student.id))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Forbidden("Invalid faculty ID".into()));

        let err = store
            .assign_project(faculty.id, new_project(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("Student not found".into()));
        assert!(store.list_all_projects().await.unwrap().is_empty());

        let (project, assignee) = store
            .assign_project(faculty.id, new_project(student.id))
            .await
            .unwrap();
        assert_eq!(assignee.username, "ada");
        assert_eq!(
            store.list_projects_by_student(student.id).await.unwrap(),
            vec![project]
        );
    }

    #[tokio::test]
    async fn test_list_all_projects_left_joins_owner() {
        let (_, student, _) = store_with_people().await;
        let orphan = new_project(Uuid::new_v4()).into_project(Uuid::new_v4(), Utc::now());
        let owned = new_project(student.id).into_project(Uuid::new_v4(), Utc::now());
        let store = MemoryStore::from_tables(Tables {
            users: vec![student],
            projects: vec![owned, orphan],
            subtasks: vec![],
        });

        let listing = store.list_all_projects().await.unwrap();
        assert_eq!(
            listing[0].users,
            Some(ProjectOwner {
                username: "ada".into(),
                student_id: Some("STU900".into()),
            })
        );
        assert!(listing[1].users.is_none());
    }

    #[tokio::test]
    async fn test_project_status_transitions() {
        let (store, student, _) = store_with_people().await;
        let project = store.create_project(new_project(student.id)).await.unwrap();

        let cancelled = store
            .update_project_status(project.id, ProjectStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, ProjectStatus::Cancelled);
        assert!(cancelled.updated_at.is_some());

        let err = store
            .update_project_status(project.id, ProjectStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        let err = store
            .update_project_status(Uuid::new_v4(), ProjectStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_subtasks_newest_first() {
        let (store, student, _) = store_with_people().await;
        let project = store.create_project(new_project(student.id)).await.unwrap();

        let first = store.create_subtask(new_subtask(project.id, "first")).await.unwrap();
        let second = store.create_subtask(new_subtask(project.id, "second")).await.unwrap();
        let third = store.create_subtask(new_subtask(project.id, "third")).await.unwrap();
        assert_eq!(first.status, SubtaskStatus::Pending);

        let listed: Vec<Uuid> = store
            .list_subtasks_by_project(project.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec![third.id, second.id, first.id]);

        let err = store
            .create_subtask(new_subtask(Uuid::new_v4(), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_evaluate_subtask() {
        let (store, student, _) = store_with_people().await;
        let project = store.create_project(new_project(student.id)).await.unwrap();
        let subtask = store.create_subtask(new_subtask(project.id, "design")).await.unwrap();

        let evaluated = store
            .evaluate_subtask(
                subtask.id,
                Evaluation {
                    marks: 9.5,
                    feedback: Some("Solid".into()),
                    status: SubtaskStatus::Completed,
                },
            )
            .await
            .unwrap();
        assert_eq!(evaluated.marks, Some(9.5));
        assert_eq!(evaluated.feedback.as_deref(), Some("Solid"));
        assert_eq!(evaluated.status, SubtaskStatus::Completed);
        assert!(evaluated.evaluated_at.is_some());
        assert_eq!(store.find_subtask(subtask.id).await, Some(evaluated));
    }

    #[tokio::test]
    async fn test_evaluate_unknown_subtask_leaves_store_unchanged() {
        let (store, student, _) = store_with_people().await;
        let project = store.create_project(new_project(student.id)).await.unwrap();
        let subtask = store.create_subtask(new_subtask(project.id, "design")).await.unwrap();

        let err = store
            .evaluate_subtask(
                Uuid::new_v4(),
                Evaluation {
                    marks: 1.0,
                    feedback: None,
                    status: SubtaskStatus::Completed,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.find_subtask(subtask.id).await, Some(subtask));
    }

    #[tokio::test]
    async fn test_subtask_status_update_keeps_description_unless_given() {
        let (store, student, _) = store_with_people().await;
        let project = store.create_project(new_project(student.id)).await.unwrap();
        let subtask = store.create_subtask(new_subtask(project.id, "build")).await.unwrap();

        let started = store
            .update_subtask_status(subtask.id, SubtaskStatus::InProgress, None)
            .await
            .unwrap();
        assert_eq!(started.description, "");

        let done = store
            .update_subtask_status(subtask.id, SubtaskStatus::Completed, Some("Shipped".into()))
            .await
            .unwrap();
        assert_eq!(done.description, "Shipped");

        let err = store
            .update_subtask_status(subtask.id, SubtaskStatus::Pending, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }
}
