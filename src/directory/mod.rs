//! Accounts: signup, login and user listings.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::core::shared::AppState;
use crate::core::urls::ApiUrls;

pub mod auth_routes;
pub mod users;

pub use auth_routes::register_user;

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::SIGNUP, post(auth_routes::signup))
        .route(ApiUrls::REGISTER, post(auth_routes::signup))
        .route(ApiUrls::LOGIN, post(auth_routes::login))
        .route(ApiUrls::USERS, get(users::list_users))
        .route(ApiUrls::STUDENTS, get(users::list_students))
        .route(ApiUrls::FACULTY, get(users::list_faculty))
}
