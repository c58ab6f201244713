//! Progresso: project tracking for students and faculty.
//!
//! Students own projects and break them into subtasks; faculty assign
//! projects and grade subtasks. Data lives in PostgreSQL, or in memory when
//! the database cannot be reached.

pub mod core;
pub mod directory;
pub mod main_module;
pub mod progress;
pub mod project;
pub mod security;
pub mod storage;

pub use crate::core::config::AppConfig;
pub use crate::core::shared::AppState;
