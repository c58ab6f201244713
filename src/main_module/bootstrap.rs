//! Backend selection and application state construction

use anyhow::Context;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::AppConfig;
use crate::core::shared::utils::{create_pool, redact_database_url, run_migrations};
use crate::core::shared::AppState;
use crate::security::{PasswordConfig, PasswordService};
use crate::storage::seed::SEED_PASSWORD;
use crate::storage::{BackendStatus, FallbackStore, MemoryStore, PgStore, Repository};

/// Probes PostgreSQL with a fixed number of attempts. Any failure, including
/// migrations, leaves the service in fallback mode.
pub async fn connect_backend(config: &AppConfig) -> (Option<Arc<PgStore>>, Arc<BackendStatus>) {
    let db = &config.database;
    let Some(url) = db.url.as_deref() else {
        warn!("DATABASE_URL not set, serving from the in-memory store");
        return (None, Arc::new(BackendStatus::fallback(None, "DATABASE_URL not set")));
    };
    let redacted = redact_database_url(url);
    let store = PgStore::new(create_pool(url, db));

    let attempts = db.retry_attempts.max(1);
    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match store.ping().await {
            Ok(()) => {
                last_error.clear();
                break;
            }
            Err(e) => {
                warn!("Database connection attempt {attempt}/{attempts} to {redacted} failed: {e}");
                last_error = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_millis(db.retry_delay_ms)).await;
                }
            }
        }
    }
    if !last_error.is_empty() {
        error!("Database unreachable after {attempts} attempts, falling back to in-memory store");
        return (None, Arc::new(BackendStatus::fallback(Some(redacted), last_error)));
    }

    if db.run_migrations {
        let pool = store.pool().clone();
        let migrated = tokio::task::spawn_blocking(move || run_migrations(&pool).map_err(|e| e.to_string()))
            .await
            .map_err(|e| e.to_string())
            .and_then(|result| result);
        if let Err(e) = migrated {
            error!("Database migrations failed: {e}, falling back to in-memory store");
            return (None, Arc::new(BackendStatus::fallback(Some(redacted), e)));
        }
        info!("Database migrations applied");
    }

    info!("Connected to PostgreSQL at {redacted}");
    (Some(Arc::new(store)), Arc::new(BackendStatus::primary(redacted)))
}

/// The in-memory side of the fallback store, with demo fixtures when enabled.
pub async fn build_memory_store(config: &AppConfig) -> anyhow::Result<Arc<MemoryStore>> {
    if !config.seed_fallback_data {
        return Ok(Arc::new(MemoryStore::new()));
    }

    let hasher = PasswordService::new(&config.auth.argon2, PasswordConfig::default())?;
    let hash = tokio::task::spawn_blocking(move || hasher.hash(SEED_PASSWORD))
        .await
        .context("Fixture hashing task failed")??;
    info!("In-memory store seeded with demo accounts");
    Ok(Arc::new(MemoryStore::seeded(&hash)))
}

pub async fn initialize(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let (primary, status) = connect_backend(&config).await;
    let memory = build_memory_store(&config).await?;

    let store = FallbackStore::new(
        primary.map(|store| store as Arc<dyn Repository>),
        memory,
        Arc::clone(&status),
    );
    info!("Storage ready in {:?} mode", status.mode());

    let state = AppState::new(config, Arc::new(store), status)?;
    Ok(Arc::new(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Argon2Config;
    use crate::storage::{BackendMode, UserStore};

    #[tokio::test]
    async fn test_missing_url_starts_in_fallback() {
        let (primary, status) = connect_backend(&AppConfig::default()).await;
        assert!(primary.is_none());
        assert_eq!(status.mode(), BackendMode::Fallback);
    }

    #[tokio::test]
    async fn test_initialize_seeds_fixtures() {
        let mut config = AppConfig::default();
        config.auth.argon2 = Argon2Config::minimal();
        let state = initialize(config).await.unwrap();

        let john = state.store.find_user_by_username("john_doe").await.unwrap().unwrap();
        assert!(state.passwords.verify(SEED_PASSWORD, &john.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_seeding_can_be_disabled() {
        let mut config = AppConfig::default();
        config.seed_fallback_data = false;
        let memory = build_memory_store(&config).await.unwrap();
        assert_eq!(memory.user_count().await, 0);
    }
}
