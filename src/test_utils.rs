use crate::models::domain::{Course, Module, QuizItem};
use crate::services::FileReference;

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// Creates a four-option quiz whose answer is at `correct_answer_index`
    pub fn quiz_item(correct_answer_index: i32) -> QuizItem {
        QuizItem {
            question: "A company holds an asset for 8 months before selling. How is the profit taxed?"
                .to_string(),
            options: vec![
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
                "Option D".to_string(),
            ],
            correct_answer_index,
            explanation: "Assets held under a year produce short-term gains. These are taxed as ordinary income."
                .to_string(),
        }
    }

    /// Creates a module with `takeaways` key takeaways and a quiz
    pub fn module(title: &str, takeaways: usize) -> Module {
        Module {
            title: title.to_string(),
            summary_highlight: format!("You will understand {} and why it matters.", title),
            key_takeaways: (1..=takeaways)
                .map(|i| format!("**Point {}** explains one rule from the source document.", i))
                .collect(),
            quiz: Some(quiz_item(1)),
        }
    }

    /// Creates a valid course with `count` modules
    pub fn course_with_modules(count: usize) -> Course {
        Course {
            course_title: "Understanding Capital Gains".to_string(),
            theme_color: "#1e40af".to_string(),
            modules: (1..=count)
                .map(|i| module(&format!("Module {}", i), 4))
                .collect(),
        }
    }

    /// Serialized form of [`course_with_modules`], as a backend would return it
    pub fn course_json(count: usize) -> String {
        serde_json::to_string(&course_with_modules(count)).expect("fixture course serializes")
    }

    pub fn file_reference(uri: &str) -> FileReference {
        FileReference {
            name: "files/test-file".to_string(),
            uri: uri.to_string(),
            mime_type: "text/plain".to_string(),
            expires_at: None,
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::path::{Path, PathBuf};

    use actix_web::{http::StatusCode, web::Bytes};
    use futures::{stream, Stream};

    pub const BOUNDARY: &str = "----microcourse-test-boundary";

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }

    /// A request body stream that yields each chunk in order
    pub fn byte_stream(chunks: &[&str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        let chunks: Vec<_> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect();
        stream::iter(chunks)
    }

    /// Files currently present in a staging directory
    pub fn staged_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }

    /// Builds a multipart/form-data body with a single file part
    pub fn multipart_body(field: &str, filename: &str, content: &str) -> Vec<u8> {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n--{b}--\r\n",
            b = BOUNDARY,
            field = field,
            filename = filename,
            content = content
        )
        .into_bytes()
    }

    pub fn multipart_content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use validator::Validate;

    #[test]
    fn test_fixtures_course_is_valid() {
        let course = course_with_modules(4);
        assert!(course.validate().is_ok());
        assert_eq!(course.modules.len(), 4);
        assert!(course.modules.iter().all(|m| m.quiz.is_some()));
    }

    #[test]
    fn test_fixtures_module_takeaways() {
        let module = module("Depreciation", 5);
        assert_eq!(module.key_takeaways.len(), 5);
        assert_eq!(module.title, "Depreciation");
    }

    #[test]
    fn test_fixtures_course_json_round_trips() {
        let parsed: crate::models::domain::Course = serde_json::from_str(&course_json(3)).unwrap();
        assert_eq!(parsed, course_with_modules(3));
    }
}
