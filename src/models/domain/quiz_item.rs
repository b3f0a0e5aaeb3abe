use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const QUIZ_OPTION_COUNT: usize = 4;

/// A single multiple-choice check attached to a module.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
pub struct QuizItem {
    pub question: String,
    #[validate(length(equal = 4, message = "a quiz must have exactly 4 options"))]
    pub options: Vec<String>,
    #[validate(range(min = 0, max = 3, message = "correct_answer_index must be between 0 and 3"))]
    pub correct_answer_index: i32,
    pub explanation: String,
}

impl QuizItem {
    pub fn correct_option(&self) -> Option<&str> {
        usize::try_from(self.correct_answer_index)
            .ok()
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
    }
}
