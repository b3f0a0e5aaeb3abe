//! Gemini REST implementation of [`GenerationBackend`].
//!
//! Documents go through the resumable upload protocol, then a single
//! `generateContent` call references the uploaded file and asks for JSON
//! constrained by the course schema.

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    services::generation_backend::{FileReference, GenerationBackend},
};

const API_VERSION: &str = "v1beta";
const UPLOAD_PATH: &str = "upload/v1beta/files";
const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";
const FILE_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    FileData(FileData<'a>),
    Text(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_json_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Joins the answer text of the first candidate, skipping thought parts.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn finish_reason(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Deserialize)]
struct UploadFileResponse {
    file: GeminiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFile {
    name: String,
    uri: String,
    mime_type: Option<String>,
    state: Option<String>,
    expiration_time: Option<DateTime<Utc>>,
    error: Option<ApiErrorBody>,
}

impl GeminiFile {
    fn into_reference(self, fallback_mime_type: &str) -> FileReference {
        FileReference {
            name: self.name,
            uri: self.uri,
            mime_type: self
                .mime_type
                .unwrap_or_else(|| fallback_mime_type.to_string()),
            expires_at: self.expiration_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    status: Option<String>,
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| match e.error.status {
            Some(status) => format!("{} ({})", e.error.message, status),
            None => e.error.message,
        })
        .unwrap_or_else(|_| body.to_string())
}

async fn ensure_success(response: Response, action: &str) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::TransportError(format!(
        "Gemini {} failed with status {}: {}",
        action,
        status.as_u16(),
        api_error_message(&body)
    )))
}

/// Process-wide Gemini handle, built once at startup.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    poll_attempts: u32,
}

impl GeminiClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.gemini_timeout_secs))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            poll_attempts: config.file_ready_poll_attempts,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn generate_url(&self) -> String {
        self.url(&format!("{}/models/{}:generateContent", API_VERSION, self.model))
    }

    async fn get_file(&self, name: &str) -> AppResult<GeminiFile> {
        let response = self
            .client
            .get(self.url(&format!("{}/{}", API_VERSION, name)))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await?;

        Ok(ensure_success(response, "file lookup").await?.json().await?)
    }

    /// Polls until the uploaded file leaves the `PROCESSING` state.
    async fn wait_until_active(&self, mut file: GeminiFile) -> AppResult<GeminiFile> {
        let mut attempts = 0;
        loop {
            match file.state.as_deref() {
                Some("PROCESSING") => {}
                Some("FAILED") => {
                    let reason = file
                        .error
                        .as_ref()
                        .map(|e| e.message.clone())
                        .unwrap_or_else(|| "no reason given".to_string());
                    return Err(AppError::TransportError(format!(
                        "Gemini could not process {}: {}",
                        file.name, reason
                    )));
                }
                _ => return Ok(file),
            }

            if attempts >= self.poll_attempts {
                return Err(AppError::TransportError(format!(
                    "Gemini file {} still processing after {} checks",
                    file.name, attempts
                )));
            }
            attempts += 1;

            log::debug!("Waiting for {} to finish processing", file.name);
            tokio::time::sleep(FILE_POLL_INTERVAL).await;
            file = self.get_file(&file.name).await?;
        }
    }
}

/// Opens a staged file as a streaming request body along with its length.
async fn staged_body(path: &Path) -> AppResult<(reqwest::Body, u64)> {
    let staging_err = |e: std::io::Error| {
        AppError::StagingError(format!("Failed to read staged file {}: {}", path.display(), e))
    };
    let file = tokio::fs::File::open(path).await.map_err(staging_err)?;
    let size = file.metadata().await.map_err(staging_err)?.len();
    Ok((reqwest::Body::from(file), size))
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    fn model_name(&self) -> String {
        self.model.clone()
    }

    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> AppResult<FileReference> {
        let (body, size) = staged_body(path).await?;

        let start = self
            .client
            .post(self.url(UPLOAD_PATH))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = ensure_success(start, "upload start").await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::TransportError("Gemini upload start returned no upload URL".to_string())
            })?
            .to_string();

        let finalize = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await?;
        let uploaded: UploadFileResponse = ensure_success(finalize, "upload").await?.json().await?;

        let file = self.wait_until_active(uploaded.file).await?;
        log::info!("Uploaded {} to Gemini as {}", display_name, file.name);

        Ok(file.into_reference(mime_type))
    }

    async fn generate_structured(
        &self,
        file: &FileReference,
        instructions: &str,
        schema: &Value,
    ) -> AppResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::FileData(FileData {
                        mime_type: &file.mime_type,
                        file_uri: &file.uri,
                    }),
                    Part::Text(instructions),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: schema,
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;
        let response: GenerateContentResponse =
            ensure_success(response, "generation").await?.json().await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(AppError::TransportError(format!(
                "Gemini blocked the request: {}",
                reason
            )));
        }

        if let Some(usage) = &response.usage_metadata {
            log::debug!(
                "Gemini generation succeeded: prompt_tokens={:?}, output_tokens={:?}",
                usage.prompt_token_count,
                usage.candidates_token_count
            );
        }

        response.text().ok_or_else(|| {
            AppError::TransportError(format!(
                "Gemini returned no content (finish reason: {})",
                response.finish_reason()
            ))
        })
    }

    async fn delete_file(&self, file: &FileReference) -> AppResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("{}/{}", API_VERSION, file.name)))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await?;

        ensure_success(response, "file deletion").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        let config = Config {
            gemini_base_url: "https://example.test/".to_string(),
            ..Config::test_config()
        };
        GeminiClient::new(&config).unwrap()
    }

    #[test]
    fn test_generate_url_targets_configured_model() {
        let client = client();
        assert_eq!(
            client.generate_url(),
            "https://example.test/v1beta/models/gemini-3-flash-preview:generateContent"
        );
        assert_eq!(client.model_name(), "gemini-3-flash-preview");
    }

    #[test]
    fn test_request_serializes_file_part_and_schema() {
        let schema = json!({ "type": "object" });
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::FileData(FileData {
                        mime_type: "application/pdf",
                        file_uri: "https://files.test/abc",
                    }),
                    Part::Text("build a course"),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_json_schema: &schema,
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["contents"][0]["parts"][0]["fileData"]["fileUri"],
            "https://files.test/abc"
        );
        assert_eq!(value["contents"][0]["parts"][1]["text"], "build a course");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["responseJsonSchema"]["type"], "object");
    }

    #[test]
    fn test_response_text_skips_thought_parts() {
        let body = r#"{
            "candidates": [{
                "content": { "parts": [
                    { "text": "planning...", "thought": true },
                    { "text": "{\"course_title\":" },
                    { "text": "\"X\"}" }
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 5 }
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"course_title\":\"X\"}"));
        assert_eq!(response.finish_reason(), "STOP");
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let body = r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#;

        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(response.text().is_none());
        assert_eq!(response.finish_reason(), "unknown");
        assert_eq!(
            response.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }

    #[test]
    fn test_api_error_message_parses_google_error_body() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            api_error_message(body),
            "Quota exceeded (RESOURCE_EXHAUSTED)"
        );
        assert_eq!(api_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_uploaded_file_converts_to_reference() {
        let body = r#"{"file":{
            "name": "files/abc123",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
            "state": "ACTIVE",
            "expirationTime": "2026-10-21T10:00:00Z"
        }}"#;

        let uploaded: UploadFileResponse = serde_json::from_str(body).unwrap();
        let reference = uploaded.file.into_reference("application/pdf");

        assert_eq!(reference.name, "files/abc123");
        assert_eq!(reference.mime_type, "application/pdf");
        assert!(reference.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_active_file_needs_no_polling() {
        let file = GeminiFile {
            name: "files/abc".to_string(),
            uri: "https://files.test/abc".to_string(),
            mime_type: Some("text/plain".to_string()),
            state: Some("ACTIVE".to_string()),
            expiration_time: None,
            error: None,
        };

        let file = client().wait_until_active(file).await.unwrap();
        assert_eq!(file.name, "files/abc");
    }

    #[tokio::test]
    async fn test_failed_file_is_a_transport_error() {
        let file = GeminiFile {
            name: "files/abc".to_string(),
            uri: "https://files.test/abc".to_string(),
            mime_type: None,
            state: Some("FAILED".to_string()),
            expiration_time: None,
            error: Some(ApiErrorBody {
                message: "unsupported document".to_string(),
                status: None,
            }),
        };

        let err = client().wait_until_active(file).await.unwrap_err();
        assert!(matches!(err, AppError::TransportError(_)));
        assert!(err.to_string().contains("unsupported document"));
    }

    #[tokio::test]
    async fn test_staged_body_reports_file_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("document.txt");
        std::fs::write(&path, b"three pages of text").unwrap();

        let (_body, size) = staged_body(&path).await.unwrap();
        assert_eq!(size, 19);
    }

    #[tokio::test]
    async fn test_missing_staged_file_is_a_staging_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = staged_body(&dir.path().join("gone.txt")).await.unwrap_err();
        assert!(matches!(err, AppError::StagingError(_)));
    }
}
