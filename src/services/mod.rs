pub mod course_service;
pub mod gemini_client;
pub mod generation_backend;
pub mod staging;

pub use course_service::CourseService;
pub use gemini_client::GeminiClient;
pub use generation_backend::{FileReference, GenerationBackend};
pub use staging::{StagedUpload, StagingArea, UploadMeta};
