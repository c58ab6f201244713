#[cfg(test)]
mod api_integration_tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use progresso::main_module::build_router;
    use progresso::security::Argon2Config;
    use progresso::storage::{BackendStatus, MemoryStore};
    use progresso::{AppConfig, AppState};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        let mut config = AppConfig::default();
        config.auth.argon2 = Argon2Config::minimal();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(BackendStatus::fallback(None, "DATABASE_URL not set")),
        )
        .expect("Failed to build state");
        build_router(Arc::new(state))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");

        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, value)
    }

    async fn signup_student(app: &Router, username: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/signup",
            Some(json!({
                "username": username,
                "email": format!("{username}@university.edu"),
                "password": "password123",
                "role": "student",
                "studentId": "STU100",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["user"].clone()
    }

    async fn signup_faculty(app: &Router, username: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/register",
            Some(json!({
                "username": username,
                "email": format!("{username}@university.edu"),
                "password": "password123",
                "role": "faculty",
                "faculty_id": "FAC100",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["user"].clone()
    }

    async fn create_project(app: &Router, student_id: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/project",
            Some(json!({
                "student_id": student_id,
                "title": "Library System",
                "description": "Catalogue and loans",
                "due_date": "2024-05-01",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    async fn create_subtask(app: &Router, project_id: &str, title: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/subtask",
            Some(json!({ "project_id": project_id, "title": title, "description": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    #[tokio::test]
    async fn test_signup_returns_user_without_password() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/signup",
            Some(json!({
                "username": "ada",
                "email": "ada@university.edu",
                "password": "password123",
                "role": "student",
                "studentId": "STU042",
                "facultyId": "FAC042",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["user"]["username"], "ada");
        assert_eq!(body["user"]["student_id"], "STU042");
        assert!(body["user"]["faculty_id"].is_null());
        let raw = body.to_string();
        assert!(!raw.contains("password"));
        assert!(!raw.contains("argon2"));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let app = app();
        signup_student(&app, "ada").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/signup",
            Some(json!({
                "username": "ada",
                "email": "other@university.edu",
                "password": "password123",
                "role": "student",
                "student_id": "STU101",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "Username already exists");

        let (_, users) = send(&app, Method::GET, "/users", None).await;
        assert_eq!(users.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/signup",
            Some(json!({
                "username": "ada",
                "email": "ada@university.edu",
                "password": "abc12",
                "role": "student",
                "studentId": "STU042",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Password must be at least 6 characters long");

        let (status, body) = send(&app, Method::POST, "/signup", Some(json!({ "username": "ada" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send(&app, Method::POST, "/signup", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_flow() {
        let app = app();
        let user = signup_student(&app, "ada").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({ "username": "ada", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        assert_eq!(body["user"]["id"], user["id"]);
        assert!(body["token"].as_str().is_some_and(|t| t.split('.').count() == 3));

        let (status, body) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({ "username": "ada", "password": "password124" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("user").is_none());

        let (unknown_status, unknown_body) = send(
            &app,
            Method::POST,
            "/login",
            Some(json!({ "username": "nobody", "password": "password123" })),
        )
        .await;
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_body["message"], body["message"]);

        let (status, _) = send(&app, Method::POST, "/login", Some(json!({ "username": "ada" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_role_listings() {
        let app = app();
        signup_student(&app, "ada").await;
        signup_faculty(&app, "turing").await;

        let (_, students) = send(&app, Method::GET, "/api/students", None).await;
        let (_, faculty) = send(&app, Method::GET, "/api/faculty", None).await;
        assert_eq!(students[0]["username"], "ada");
        assert_eq!(students.as_array().map(Vec::len), Some(1));
        assert_eq!(faculty[0]["faculty_id"], "FAC100");
        assert_eq!(faculty.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_assign_project() {
        let app = app();
        let student = signup_student(&app, "ada").await;
        let faculty = signup_faculty(&app, "turing").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/assign-project",
            Some(json!({
                "student_id": student["id"],
                "faculty_id": faculty["id"],
                "title": "Compiler",
                "description": "Toy compiler",
                "due_date": "2024-06-01",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["message"], "Project assigned to ada successfully");
        assert_eq!(body["data"]["status"], "active");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/assign-project",
            Some(json!({
                "student_id": student["id"],
                "faculty_id": student["id"],
                "title": "Compiler",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/assign-project",
            Some(json!({
                "student_id": Uuid::new_v4(),
                "faculty_id": faculty["id"],
                "title": "Compiler",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, projects) = send(&app, Method::GET, "/api/projects", None).await;
        assert_eq!(projects.as_array().map(Vec::len), Some(1));
        assert_eq!(projects[0]["users"]["username"], "ada");
        assert_eq!(projects[0]["users"]["student_id"], "STU100");

        let uri = format!("/api/student/{}/projects", student["id"].as_str().unwrap());
        let (_, owned) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(owned[0]["title"], "Compiler");
    }

    #[tokio::test]
    async fn test_subtasks_evaluation_and_progress() {
        let app = app();
        let student = signup_student(&app, "ada").await;
        let project = create_project(&app, student["id"].as_str().unwrap()).await;
        let project_id = project["id"].as_str().unwrap();

        let design = create_subtask(&app, project_id, "Design").await;
        create_subtask(&app, project_id, "Build").await;

        let (_, listed) = send(&app, Method::GET, &format!("/api/project/{project_id}/subtasks"), None).await;
        assert_eq!(listed[0]["title"], "Build");
        assert_eq!(listed[1]["title"], "Design");
        assert_eq!(listed[1]["status"], "pending");

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/subtask/{}/evaluate", design["id"].as_str().unwrap()),
            Some(json!({ "marks": 8, "feedback": "Clean schema", "status": "completed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["message"], "Subtask evaluated successfully");
        assert_eq!(body["data"]["marks"], 8.0);
        assert!(body["data"]["evaluated_at"].is_string());

        let (status, progress) =
            send(&app, Method::GET, &format!("/api/project/{project_id}/progress"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(progress["totalSubtasks"], 2);
        assert_eq!(progress["completedSubtasks"], 1);
        assert_eq!(progress["progressPercentage"], 50);
        assert_eq!(progress["averageMarks"], 8.0);
        assert_eq!(progress["subtasks"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_progress_of_unknown_project_is_empty() {
        let app = app();
        let (status, progress) = send(
            &app,
            Method::GET,
            &format!("/api/project/{}/progress", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(progress["totalSubtasks"], 0);
        assert_eq!(progress["progressPercentage"], 0);
        assert_eq!(progress["averageMarks"], 0.0);
    }

    #[tokio::test]
    async fn test_huge_marks_keep_average_numeric() {
        let app = app();
        let student = signup_student(&app, "hopper").await;
        let project = create_project(&app, student["id"].as_str().unwrap()).await;
        let project_id = project["id"].as_str().unwrap();

        for title in ["Parser", "Linker"] {
            let subtask = create_subtask(&app, project_id, title).await;
            let (status, body) = send(
                &app,
                Method::PUT,
                &format!("/api/subtask/{}/evaluate", subtask["id"].as_str().unwrap()),
                Some(json!({ "marks": 1e308, "status": "completed" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{body}");
        }

        let (status, progress) =
            send(&app, Method::GET, &format!("/api/project/{project_id}/progress"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(progress["progressPercentage"], 100);
        assert!(progress["averageMarks"].is_f64(), "{}", progress["averageMarks"]);
        assert_eq!(progress["averageMarks"], 1e308);
    }

    #[tokio::test]
    async fn test_evaluate_unknown_subtask() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/subtask/{}/evaluate", Uuid::new_v4()),
            Some(json!({ "marks": 5, "status": "completed" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/subtask/{}/evaluate", Uuid::new_v4()),
            Some(json!({ "status": "completed" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let app = app();
        let student = signup_student(&app, "ada").await;
        let project = create_project(&app, student["id"].as_str().unwrap()).await;
        let uri = format!("/api/project/{}/status", project["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "status": "cancelled" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "cancelled");

        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "status": "active" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");

        let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "status": "archived" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let subtask = create_subtask(&app, project["id"].as_str().unwrap(), "Docs").await;
        let uri = format!("/api/subtask/{}/status", subtask["id"].as_str().unwrap());
        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({ "status": "in-progress", "description": "Drafting" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["description"], "Drafting");
    }

    #[tokio::test]
    async fn test_malformed_ids_rejected() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/project/not-a-uuid/subtasks", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/subtask",
            Some(json!({ "project_id": "42", "title": "Orphan" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/subtask",
            Some(json!({ "project_id": Uuid::new_v4(), "title": "Orphan" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_and_db_status() {
        let app = app();
        let (status, health) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "ok");
        assert!(health["uptime"].is_number());

        let (status, db) = send(&app, Method::GET, "/db-status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(db["connected"], false);
        assert_eq!(db["mode"], "fallback");
        assert!(db["url"].is_null());
    }
}
