pub mod course;
pub mod quiz_item;
pub use course::{Course, Module, QualityIssue};
pub use quiz_item::QuizItem;
