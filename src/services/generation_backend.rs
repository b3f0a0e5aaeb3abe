use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::errors::AppResult;

/// Handle to a document that has been uploaded to the generation backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReference {
    /// Backend resource name, e.g. `files/abc123`.
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A hosted model able to read an uploaded document and answer with JSON
/// constrained by a schema.
///
/// Implementations report every failure as [`crate::errors::AppError::TransportError`].
/// Parsing the returned text is left to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn model_name(&self) -> String;

    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> AppResult<FileReference>;

    /// Returns the raw JSON text produced for `file`.
    async fn generate_structured(
        &self,
        file: &FileReference,
        instructions: &str,
        schema: &Value,
    ) -> AppResult<String>;

    async fn delete_file(&self, file: &FileReference) -> AppResult<()>;
}
