use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    services::{CourseService, GeminiClient, GenerationBackend},
};

#[derive(Clone)]
pub struct AppState {
    pub course_service: Arc<CourseService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        config.validate()?;

        let backend = Arc::new(GeminiClient::new(&config)?);
        log::info!("Generation backend ready (model: {})", backend.model_name());

        Ok(Self::with_backend(config, backend))
    }

    /// Builds the state around an existing backend handle.
    pub fn with_backend(config: Config, backend: Arc<dyn GenerationBackend>) -> Self {
        let course_service = Arc::new(CourseService::from_config(backend, &config));

        Self {
            course_service,
            config: Arc::new(config),
        }
    }
}
