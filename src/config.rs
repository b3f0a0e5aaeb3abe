use std::{env, path::PathBuf, str::FromStr};

use secrecy::{ExposeSecret, SecretString};

use crate::errors::{AppError, AppResult};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub gemini_api_key: SecretString,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_timeout_secs: u64,
    pub file_ready_poll_attempts: u32,
    pub delete_remote_files: bool,
    pub max_schema_retries: u32,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub staging_dir: PathBuf,
    pub max_upload_bytes: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: SecretString::from(env::var("GEMINI_API_KEY").unwrap_or_default()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_timeout_secs: env_or("GEMINI_TIMEOUT_SECS", 300),
            file_ready_poll_attempts: env_or("FILE_READY_POLL_ATTEMPTS", 10),
            delete_remote_files: env_or("DELETE_REMOTE_FILES", true),
            max_schema_retries: env_or("MAX_SCHEMA_RETRIES", 0),
            web_server_host: env::var("WEB_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_server_port: env_or("WEB_SERVER_PORT", 8000),
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 50 * 1024 * 1024),
        }
    }

    /// Checks the settings the server cannot start without.
    pub fn validate(&self) -> AppResult<()> {
        if self.gemini_api_key.expose_secret().trim().is_empty() {
            return Err(AppError::InternalError(
                "GEMINI_API_KEY is not set. Export it or add it to .env".to_string(),
            ));
        }

        if self.gemini_model.trim().is_empty() {
            return Err(AppError::InternalError("GEMINI_MODEL must not be empty".to_string()));
        }

        if self.max_upload_bytes == 0 {
            return Err(AppError::InternalError(
                "MAX_UPLOAD_BYTES must be greater than zero".to_string(),
            ));
        }

        if self.gemini_timeout_secs == 0 {
            return Err(AppError::InternalError(
                "GEMINI_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            gemini_api_key: SecretString::from("test_gemini_key".to_string()),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            gemini_timeout_secs: 5,
            file_ready_poll_attempts: 1,
            delete_remote_files: true,
            max_schema_retries: 0,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8000,
            staging_dir: env::temp_dir(),
            max_upload_bytes: 1024 * 1024,
        }
    }
}
