use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::{debug, error};
use uuid::Uuid;

use super::{ProjectStore, StoreError, UserStore};
use crate::core::shared::models::{
    Evaluation, NewProject, NewSubtask, NewUser, Project, ProjectOwner, ProjectStatus,
    ProjectWithOwner, Role, Subtask, SubtaskStatus, User,
};
use crate::core::shared::schema::{projects, subtasks, users};
use crate::core::shared::utils::DbPool;

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    student_id: Option<String>,
    faculty_id: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ProjectRow {
    id: Uuid,
    student_id: Uuid,
    title: String,
    description: String,
    status: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = subtasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct SubtaskRow {
    id: Uuid,
    project_id: Uuid,
    title: String,
    description: String,
    status: String,
    marks: Option<f64>,
    feedback: Option<String>,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    evaluated_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::Internal(format!("Corrupt row: {e}"))
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(corrupt)?,
            student_id: row.student_id,
            faculty_id: row.faculty_id,
            created_at: row.created_at,
        })
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        UserRow {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.as_str().to_string(),
            student_id: user.student_id.clone(),
            faculty_id: user.faculty_id.clone(),
            created_at: user.created_at,
        }
    }
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            student_id: row.student_id,
            title: row.title,
            description: row.description,
            status: row.status.parse().map_err(corrupt)?,
            due_date: row.due_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        ProjectRow {
            id: project.id,
            student_id: project.student_id,
            title: project.title.clone(),
            description: project.description.clone(),
            status: project.status.as_str().to_string(),
            due_date: project.due_date,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

impl TryFrom<SubtaskRow> for Subtask {
    type Error = StoreError;

    fn try_from(row: SubtaskRow) -> Result<Self, Self::Error> {
        Ok(Subtask {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            status: row.status.parse().map_err(corrupt)?,
            marks: row.marks,
            feedback: row.feedback,
            due_date: row.due_date,
            created_at: row.created_at,
            evaluated_at: row.evaluated_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Subtask> for SubtaskRow {
    fn from(subtask: &Subtask) -> Self {
        SubtaskRow {
            id: subtask.id,
            project_id: subtask.project_id,
            title: subtask.title.clone(),
            description: subtask.description.clone(),
            status: subtask.status.as_str().to_string(),
            marks: subtask.marks,
            feedback: subtask.feedback.clone(),
            due_date: subtask.due_date,
            created_at: subtask.created_at,
            evaluated_at: subtask.evaluated_at,
            updated_at: subtask.updated_at,
        }
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => StoreError::NotFound("Record not found".into()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let message = match info.constraint_name() {
                    Some(name) if name.contains("email") => "Email already exists",
                    Some(name) if name.contains("username") => "Username already exists",
                    _ => "Record already exists",
                };
                StoreError::Conflict(message.into())
            }
            DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::UnableToSendCommand,
                info,
            ) => StoreError::Unavailable(info.message().to_string()),
            // Missing database or relation means the schema is not usable at all.
            DieselError::DatabaseError(_, info) if info.message().contains("does not exist") => {
                StoreError::Unavailable(info.message().to_string())
            }
            other => StoreError::Internal(other.to_string()),
        }
    }
}

/// PostgreSQL-backed store. Every call checks a connection out of the pool on
/// the blocking thread pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::Unavailable(format!("Failed to get database connection: {e}")))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| {
            error!("Database task panicked: {e}");
            StoreError::Internal(format!("Database task failed: {e}"))
        })?
    }

    /// Opens a connection and runs a trivial query.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.run(|conn| {
            diesel::sql_query("SELECT 1").execute(conn)?;
            Ok(())
        })
        .await
    }
}

fn load_user(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, StoreError> {
    users::table
        .find(id)
        .select(UserRow::as_select())
        .first(conn)
        .optional()?
        .map(User::try_from)
        .transpose()
}

fn user_with_role(conn: &mut PgConnection, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
    Ok(load_user(conn, id)?.filter(|u| u.role == role))
}

fn insert_project(conn: &mut PgConnection, project: NewProject) -> Result<Project, StoreError> {
    let project = project.into_project(Uuid::new_v4(), Utc::now());
    diesel::insert_into(projects::table)
        .values(ProjectRow::from(&project))
        .execute(conn)?;
    Ok(project)
}

/// `seq` follows insertion order and breaks `created_at` ties.
fn subtasks_newest_first(project_id: Uuid) -> subtasks::BoxedQuery<'static, Pg> {
    subtasks::table
        .filter(subtasks::project_id.eq(project_id))
        .order((subtasks::created_at.desc(), subtasks::seq.desc()))
        .into_boxed()
}

fn load_subtask(conn: &mut PgConnection, id: Uuid) -> Result<Subtask, StoreError> {
    subtasks::table
        .find(id)
        .select(SubtaskRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| StoreError::NotFound("Subtask not found".into()))
        .and_then(Subtask::try_from)
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let username = username.to_string();
        self.run(move |conn| {
            users::table
                .filter(users::username.eq(&username))
                .select(UserRow::as_select())
                .first(conn)
                .optional()?
                .map(User::try_from)
                .transpose()
        })
        .await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.run(move |conn| load_user(conn, id)).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let username_taken: i64 = users::table
                    .filter(users::username.eq(&user.username))
                    .count()
                    .get_result(conn)?;
                if username_taken > 0 {
                    return Err(StoreError::Conflict("Username already exists".into()));
                }
                let email_taken: i64 = users::table
                    .filter(users::email.eq(&user.email))
                    .count()
                    .get_result(conn)?;
                if email_taken > 0 {
                    return Err(StoreError::Conflict("Email already exists".into()));
                }

                // The unique constraints still catch a concurrent insert.
                let user = user.into_user(Uuid::new_v4(), Utc::now());
                diesel::insert_into(users::table)
                    .values(UserRow::from(&user))
                    .execute(conn)?;
                debug!("Inserted user {} ({})", user.username, user.id);
                Ok(user)
            })
        })
        .await
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, StoreError> {
        self.run(move |conn| {
            let mut query = users::table
                .select(UserRow::as_select())
                .order(users::created_at.asc())
                .into_boxed();
            if let Some(role) = role {
                query = query.filter(users::role.eq(role.as_str()));
            }
            collect(query.load::<UserRow>(conn)?)
        })
        .await
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create_project(&self, project: NewProject) -> Result<Project, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                if user_with_role(conn, project.student_id, Role::Student)?.is_none() {
                    return Err(StoreError::NotFound("Student not found".into()));
                }
                insert_project(conn, project)
            })
        })
        .await
    }

    async fn assign_project(
        &self,
        faculty_id: Uuid,
        project: NewProject,
    ) -> Result<(Project, User), StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                if user_with_role(conn, faculty_id, Role::Faculty)?.is_none() {
                    return Err(StoreError::Forbidden("Invalid faculty ID".into()));
                }
                let student = user_with_role(conn, project.student_id, Role::Student)?
                    .ok_or_else(|| StoreError::NotFound("Student not found".into()))?;
                Ok((insert_project(conn, project)?, student))
            })
        })
        .await
    }

    async fn list_projects_by_student(&self, student_id: Uuid) -> Result<Vec<Project>, StoreError> {
        self.run(move |conn| {
            collect(
                projects::table
                    .filter(projects::student_id.eq(student_id))
                    .select(ProjectRow::as_select())
                    .order(projects::created_at.asc())
                    .load::<ProjectRow>(conn)?,
            )
        })
        .await
    }

    async fn list_all_projects(&self) -> Result<Vec<ProjectWithOwner>, StoreError> {
        self.run(|conn| {
            let rows: Vec<(ProjectRow, Option<(String, Option<String>)>)> = projects::table
                .left_join(users::table)
                .select((
                    ProjectRow::as_select(),
                    (users::username, users::student_id).nullable(),
                ))
                .order(projects::created_at.asc())
                .load(conn)?;

            rows.into_iter()
                .map(|(project, owner)| {
                    Ok(ProjectWithOwner {
                        project: Project::try_from(project)?,
                        users: owner.map(|(username, student_id)| ProjectOwner {
                            username,
                            student_id,
                        }),
                    })
                })
                .collect()
        })
        .await
    }

    async fn update_project_status(
        &self,
        project_id: Uuid,
        status: ProjectStatus,
    ) -> Result<Project, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let current: Project = projects::table
                    .find(project_id)
                    .select(ProjectRow::as_select())
                    .for_update()
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| StoreError::NotFound("Project not found".into()))
                    .and_then(Project::try_from)?;

                if !current.status.can_transition_to(status) {
                    return Err(StoreError::transition(current.status, status));
                }

                let updated: ProjectRow = diesel::update(projects::table.find(project_id))
                    .set((
                        projects::status.eq(status.as_str()),
                        projects::updated_at.eq(Some(Utc::now())),
                    ))
                    .returning(ProjectRow::as_returning())
                    .get_result(conn)?;
                Project::try_from(updated)
            })
        })
        .await
    }

    async fn create_subtask(&self, subtask: NewSubtask) -> Result<Subtask, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let exists: i64 = projects::table
                    .filter(projects::id.eq(subtask.project_id))
                    .count()
                    .get_result(conn)?;
                if exists == 0 {
                    return Err(StoreError::NotFound("Project not found".into()));
                }
                let subtask = subtask.into_subtask(Uuid::new_v4(), Utc::now());
                diesel::insert_into(subtasks::table)
                    .values(SubtaskRow::from(&subtask))
                    .execute(conn)?;
                Ok(subtask)
            })
        })
        .await
    }

    async fn list_subtasks_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Subtask>, StoreError> {
        self.run(move |conn| {
            collect(
                subtasks_newest_first(project_id)
                    .select(SubtaskRow::as_select())
                    .load::<SubtaskRow>(conn)?,
            )
        })
        .await
    }

    async fn update_subtask_status(
        &self,
        subtask_id: Uuid,
        status: SubtaskStatus,
        description: Option<String>,
    ) -> Result<Subtask, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let current = load_subtask(conn, subtask_id)?;
                if !current.status.can_transition_to(status) {
                    return Err(StoreError::transition(current.status, status));
                }

                let updated: SubtaskRow = diesel::update(subtasks::table.find(subtask_id))
                    .set((
                        subtasks::status.eq(status.as_str()),
                        subtasks::description.eq(description.unwrap_or(current.description)),
                        subtasks::updated_at.eq(Some(Utc::now())),
                    ))
                    .returning(SubtaskRow::as_returning())
                    .get_result(conn)?;
                Subtask::try_from(updated)
            })
        })
        .await
    }

    async fn evaluate_subtask(
        &self,
        subtask_id: Uuid,
        evaluation: Evaluation,
    ) -> Result<Subtask, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let current = load_subtask(conn, subtask_id)?;
                if !current.status.can_transition_to(evaluation.status) {
                    return Err(StoreError::transition(current.status, evaluation.status));
                }

                let now = Utc::now();
                let updated: SubtaskRow = diesel::update(subtasks::table.find(subtask_id))
                    .set((
                        subtasks::marks.eq(Some(evaluation.marks)),
                        subtasks::feedback.eq(evaluation.feedback),
                        subtasks::status.eq(evaluation.status.as_str()),
                        subtasks::evaluated_at.eq(Some(now)),
                        subtasks::updated_at.eq(Some(now)),
                    ))
                    .returning(SubtaskRow::as_returning())
                    .get_result(conn)?;
                Subtask::try_from(updated)
            })
        })
        .await
    }
}
