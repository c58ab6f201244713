use std::sync::Arc;
use std::time::Instant;

use crate::core::config::AppConfig;
use crate::security::{PasswordService, TokenIssuer};
use crate::storage::{BackendStatus, Repository};

/// Shared by every handler through `State<Arc<AppState>>`.
pub struct AppState {
    pub store: Arc<dyn Repository>,
    pub backend: Arc<BackendStatus>,
    pub passwords: Arc<PasswordService>,
    pub tokens: Arc<TokenIssuer>,
    pub config: AppConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Repository>,
        backend: Arc<BackendStatus>,
    ) -> anyhow::Result<Self> {
        let passwords = PasswordService::new(
            &config.auth.argon2,
            crate::security::PasswordConfig {
                min_length: config.auth.password_min_length,
                ..Default::default()
            },
        )?;
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.jwt_expiry_hours)?;

        Ok(Self {
            store,
            backend,
            passwords: Arc::new(passwords),
            tokens: Arc::new(tokens),
            config,
            started_at: Instant::now(),
        })
    }
}
