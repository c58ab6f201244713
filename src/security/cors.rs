use axum::http::{header, HeaderValue, Method};
use log::{info, warn};
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Empty means any origin, as the dashboards are served from arbitrary hosts in development.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            allowed_methods: vec![Method::GET, Method::POST, Method::PUT, Method::OPTIONS],
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    pub fn with_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn build(self) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods(self.allowed_methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(std::time::Duration::from_secs(self.max_age_secs));

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring malformed CORS origin '{}'", o);
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            cors.allow_origin(Any)
        } else {
            cors.allow_origin(origins)
        }
    }
}

pub fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        info!("Creating CORS layer allowing any origin (no origins configured)");
    } else {
        info!("Creating CORS layer with {} configured origins", allowed_origins.len());
    }
    CorsConfig::default()
        .with_origins(allowed_origins.to_vec())
        .build()
}
