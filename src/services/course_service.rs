use std::{fmt::Display, sync::Arc};

use actix_web::web::Bytes;
use futures::Stream;
use validator::Validate;

use crate::{
    config::Config,
    constants::COURSE_GENERATION_PROMPT,
    errors::AppResult,
    models::{domain::Course, schema::course_response_schema},
    services::{
        generation_backend::{FileReference, GenerationBackend},
        staging::{StagedUpload, StagingArea, UploadMeta},
    },
};

pub struct CourseService {
    backend: Arc<dyn GenerationBackend>,
    staging: StagingArea,
    max_schema_retries: u32,
    delete_remote_files: bool,
}

impl CourseService {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        staging: StagingArea,
        max_schema_retries: u32,
        delete_remote_files: bool,
    ) -> Self {
        Self {
            backend,
            staging,
            max_schema_retries,
            delete_remote_files,
        }
    }

    pub fn from_config(backend: Arc<dyn GenerationBackend>, config: &Config) -> Self {
        Self::new(
            backend,
            StagingArea::new(&config.staging_dir, config.max_upload_bytes),
            config.max_schema_retries,
            config.delete_remote_files,
        )
    }

    /// Turns an uploaded document into a validated [`Course`].
    ///
    /// The staged copy of the upload is gone when this returns, whatever the
    /// outcome, and also when the returned future is dropped early.
    pub async fn generate_course<S, E>(&self, body: S, meta: UploadMeta) -> AppResult<Course>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let staged = self.staging.stage(body, meta).await?;
        log::info!(
            "Staged {} ({} bytes, {}, sha256 {})",
            staged.original_filename,
            staged.size,
            staged.mime_type,
            staged.sha256
        );

        let result = self.generate_from_staged(&staged).await;

        if let Err(err) = staged.remove() {
            log::warn!("{}", err);
        }

        result
    }

    async fn generate_from_staged(&self, staged: &StagedUpload) -> AppResult<Course> {
        let file = self
            .backend
            .upload_file(staged.path(), &staged.mime_type, &staged.display_name())
            .await?;

        let result = self.generate_validated(&file).await;

        if self.delete_remote_files {
            if let Err(err) = self.backend.delete_file(&file).await {
                log::warn!("Failed to delete remote file {}: {}", file.name, err);
            }
        }

        result
    }

    async fn generate_validated(&self, file: &FileReference) -> AppResult<Course> {
        let schema = course_response_schema();
        let mut retries = 0;

        loop {
            let raw = self
                .backend
                .generate_structured(file, COURSE_GENERATION_PROMPT, schema)
                .await?;

            match parse_course(&raw) {
                Ok(course) => {
                    for issue in course.quality_issues() {
                        log::warn!("Quality regression in '{}': {}", course.course_title, issue);
                    }
                    log::info!(
                        "Generated course '{}' with {} modules",
                        course.course_title,
                        course.modules.len()
                    );
                    return Ok(course);
                }
                Err(err) if retries < self.max_schema_retries => {
                    retries += 1;
                    log::warn!(
                        "Generated output rejected ({}), retrying {}/{}",
                        err,
                        retries,
                        self.max_schema_retries
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Parses backend output into a [`Course`] and enforces its hard constraints.
pub fn parse_course(raw: &str) -> AppResult<Course> {
    let course: Course = serde_json::from_str(strip_json_fences(raw))?;
    course.validate()?;
    Ok(course)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text.strip_prefix("```").map(|rest| match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    });

    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| stripped.trim_start()),
        None => text,
    }
}
