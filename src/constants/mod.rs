pub mod course_prompt;

pub use course_prompt::COURSE_GENERATION_PROMPT;
