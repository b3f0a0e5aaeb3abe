use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use actix_web::web::Bytes;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::errors::{AppError, AppResult};

pub const STAGING_PREFIX: &str = "course-upload-";
const OCTET_STREAM: &str = "application/octet-stream";
const MAX_DISPLAY_NAME_LEN: usize = 128;

/// What the caller told us about the uploaded file.
#[derive(Clone, Debug, Default)]
pub struct UploadMeta {
    pub filename: String,
    pub content_type: Option<String>,
}

/// An upload written to local storage.
///
/// The file lives at a random path inside the staging directory and is
/// removed when this value is dropped, including when the request future is
/// cancelled. [`StagedUpload::remove`] deletes it eagerly and reports errors.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    pub original_filename: String,
    pub mime_type: String,
    pub size: u64,
    pub sha256: String,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name shown to the backend. Never used to build local paths.
    pub fn display_name(&self) -> String {
        sanitize_display_name(&self.original_filename)
    }

    pub fn remove(self) -> AppResult<()> {
        let path = self.path.to_path_buf();
        self.path.close().map_err(|e| {
            AppError::StagingError(format!(
                "Failed to remove staged file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[derive(Clone, Debug)]
pub struct StagingArea {
    dir: PathBuf,
    max_bytes: u64,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Streams `body` into a fresh staging file.
    ///
    /// Empty and oversized uploads are rejected with a validation error and
    /// leave nothing behind.
    pub async fn stage<S, E>(&self, body: S, meta: UploadMeta) -> AppResult<StagedUpload>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        tokio::fs::create_dir_all(&self.dir).await?;

        let (file, path) = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .rand_bytes(16)
            .tempfile_in(&self.dir)?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut hasher = Sha256::new();
        let mut size: u64 = 0;

        futures::pin_mut!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::ValidationError(format!("Failed to read uploaded file: {}", e))
            })?;

            size += chunk.len() as u64;
            if size > self.max_bytes {
                return Err(AppError::ValidationError(format!(
                    "Uploaded file exceeds the {} byte limit",
                    self.max_bytes
                )));
            }

            hasher.update(&chunk);
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        drop(file);

        if size == 0 {
            return Err(AppError::ValidationError("Uploaded file is empty".to_string()));
        }

        Ok(StagedUpload {
            path,
            mime_type: resolve_mime_type(meta.content_type.as_deref(), &meta.filename),
            original_filename: meta.filename,
            size,
            sha256: format!("{:x}", hasher.finalize()),
        })
    }
}

/// Prefers the declared content type, falling back to the file extension.
pub fn resolve_mime_type(content_type: Option<&str>, filename: &str) -> String {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && !ct.eq_ignore_ascii_case(OCTET_STREAM));

    if let Some(ct) = declared {
        return ct.to_ascii_lowercase();
    }

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let inferred = match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") | Some("markdown") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => OCTET_STREAM,
    };

    inferred.to_string()
}

fn sanitize_display_name(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .take(MAX_DISPLAY_NAME_LEN)
        .collect();

    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
