//! Demo fixtures loaded into the in-memory store when PostgreSQL is absent.
//!
//! Ids are fixed so that a client can keep working against the same records
//! across restarts of a fallback-mode server.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use super::memory::{MemoryStore, Tables};
use crate::core::shared::models::{
    Project, ProjectStatus, Role, Subtask, SubtaskStatus, User,
};

pub const SEED_PASSWORD: &str = "password123";

pub const JOHN_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0001);
pub const JANE_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0002);
pub const WILSON_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0003);
pub const ECOMMERCE_PROJECT_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0101);
pub const CHATBOT_PROJECT_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0102);
pub const DATABASE_SUBTASK_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0201);
pub const FRONTEND_SUBTASK_ID: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0202);

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn user(
    id: Uuid,
    username: &str,
    email: &str,
    role: Role,
    external_id: &str,
    password_hash: &str,
) -> User {
    User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role,
        student_id: (role == Role::Student).then(|| external_id.to_string()),
        faculty_id: (role == Role::Faculty).then(|| external_id.to_string()),
        created_at: at(2024, 1, 1),
    }
}

pub(crate) fn tables(password_hash: &str) -> Tables {
    let users = vec![
        user(JOHN_ID, "john_doe", "john.doe@university.edu", Role::Student, "STU001", password_hash),
        user(JANE_ID, "jane_smith", "jane.smith@university.edu", Role::Student, "STU002", password_hash),
        user(WILSON_ID, "prof_wilson", "prof.wilson@university.edu", Role::Faculty, "FAC001", password_hash),
    ];

    let projects = vec![
        Project {
            id: ECOMMERCE_PROJECT_ID,
            student_id: JOHN_ID,
            title: "E-Commerce Website".to_string(),
            description: "Build a full-stack e-commerce platform with cart and checkout".to_string(),
            status: ProjectStatus::Active,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            created_at: at(2024, 1, 10),
            updated_at: None,
        },
        Project {
            id: CHATBOT_PROJECT_ID,
            student_id: JANE_ID,
            title: "AI Chatbot System".to_string(),
            description: "Develop a conversational assistant for student support".to_string(),
            status: ProjectStatus::Active,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 30),
            created_at: at(2024, 1, 12),
            updated_at: None,
        },
    ];

    let subtasks = vec![
        Subtask {
            id: DATABASE_SUBTASK_ID,
            project_id: ECOMMERCE_PROJECT_ID,
            title: "Database Design".to_string(),
            description: "Design the product, order and customer schema".to_string(),
            status: SubtaskStatus::Completed,
            marks: Some(8.0),
            feedback: Some("Good database structure, consider adding indexes".to_string()),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 15),
            created_at: at(2024, 1, 15),
            evaluated_at: Some(at(2024, 2, 16)),
            updated_at: Some(at(2024, 2, 16)),
        },
        Subtask {
            id: FRONTEND_SUBTASK_ID,
            project_id: ECOMMERCE_PROJECT_ID,
            title: "Frontend Development".to_string(),
            description: "Implement the storefront and cart pages".to_string(),
            status: SubtaskStatus::InProgress,
            marks: None,
            feedback: None,
            due_date: NaiveDate::from_ymd_opt(2024, 2, 28),
            created_at: at(2024, 1, 20),
            evaluated_at: None,
            updated_at: None,
        },
    ];

    Tables {
        users,
        projects,
        subtasks,
    }
}

impl MemoryStore {
    /// Store preloaded with the demo accounts, all sharing `password_hash`.
    pub fn seeded(password_hash: &str) -> Self {
        Self::from_tables(tables(password_hash))
    }
}
