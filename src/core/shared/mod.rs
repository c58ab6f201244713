pub mod error;
pub mod models;
pub mod schema;
pub mod state;
pub mod utils;

pub use error::ApiError;
pub use state::AppState;
pub use utils::DbPool;
