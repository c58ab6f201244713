#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Accounts
    pub const SIGNUP: &'static str = "/signup";
    pub const REGISTER: &'static str = "/register";
    pub const LOGIN: &'static str = "/login";
    pub const USERS: &'static str = "/users";
    pub const STUDENTS: &'static str = "/api/students";
    pub const FACULTY: &'static str = "/api/faculty";

    // Projects
    pub const PROJECTS: &'static str = "/api/projects";
    pub const PROJECT_CREATE: &'static str = "/api/project";
    pub const PROJECT_ASSIGN: &'static str = "/api/assign-project";
    pub const PROJECT_STATUS: &'static str = "/api/project/:id/status";
    pub const PROJECT_SUBTASKS: &'static str = "/api/project/:id/subtasks";
    pub const PROJECT_PROGRESS: &'static str = "/api/project/:id/progress";
    pub const STUDENT_PROJECTS: &'static str = "/api/student/:id/projects";

    // Subtasks
    pub const SUBTASK_CREATE: &'static str = "/api/subtask";
    pub const SUBTASK_STATUS: &'static str = "/api/subtask/:id/status";
    pub const SUBTASK_EVALUATE: &'static str = "/api/subtask/:id/evaluate";

    // Operations
    pub const HEALTH: &'static str = "/health";
    pub const DB_STATUS: &'static str = "/db-status";
}
