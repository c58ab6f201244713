pub mod cors;
pub mod jwt;
pub mod password;

pub use cors::create_cors_layer;
pub use jwt::{Claims, TokenIssuer};
pub use password::{Argon2Config, PasswordConfig, PasswordIssue, PasswordService};
