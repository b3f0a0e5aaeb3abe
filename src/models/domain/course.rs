use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::quiz_item::QuizItem;

static HEX_COLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("HEX_COLOR_REGEX is a valid regex pattern")
});

pub const MIN_MODULES: usize = 3;
pub const MAX_MODULES: usize = 12;
pub const MIN_TAKEAWAYS: usize = 3;
pub const MAX_TAKEAWAYS: usize = 6;

// The same declaration produces the JSON schema handed to the generation
// backend and the checks run after parsing. Rustdoc here would leak into the
// schema description, so the model-facing text is set explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
#[schemars(description = "A micro-course built from the uploaded document.")]
pub struct Course {
    pub course_title: String,
    #[validate(regex(path = *HEX_COLOR_REGEX, message = "theme_color must be a #RRGGBB hex color"))]
    pub theme_color: String,
    #[validate(nested)]
    pub modules: Vec<Module>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate, JsonSchema)]
pub struct Module {
    pub title: String,
    pub summary_highlight: String,
    #[validate(length(min = 1, message = "key_takeaways must not be empty"))]
    pub key_takeaways: Vec<String>,
    #[validate(nested)]
    pub quiz: Option<QuizItem>,
}

/// Soft-guidance violations. These are reported, never rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QualityIssue {
    NoModules,
    ModuleCountOutOfRange { count: usize },
    TakeawayCountOutOfRange { module: usize, count: usize },
    MissingQuiz { module: usize },
    LongSummary { module: usize, sentences: usize },
    BlackThemeColor,
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityIssue::NoModules => write!(f, "course has no modules"),
            QualityIssue::ModuleCountOutOfRange { count } => write!(
                f,
                "course has {} modules, expected {}-{}",
                count, MIN_MODULES, MAX_MODULES
            ),
            QualityIssue::TakeawayCountOutOfRange { module, count } => write!(
                f,
                "module {} has {} key takeaways, expected {}-{}",
                module, count, MIN_TAKEAWAYS, MAX_TAKEAWAYS
            ),
            QualityIssue::MissingQuiz { module } => write!(f, "module {} has no quiz", module),
            QualityIssue::LongSummary { module, sentences } => write!(
                f,
                "module {} summary_highlight has {} sentences, expected at most 2",
                module, sentences
            ),
            QualityIssue::BlackThemeColor => write!(f, "theme_color is pure black"),
        }
    }
}

impl Course {
    pub fn quality_issues(&self) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        let count = self.modules.len();
        if count == 0 {
            issues.push(QualityIssue::NoModules);
        } else if !(MIN_MODULES..=MAX_MODULES).contains(&count) {
            issues.push(QualityIssue::ModuleCountOutOfRange { count });
        }

        if self.theme_color == "#000000" {
            issues.push(QualityIssue::BlackThemeColor);
        }

        for (i, module) in self.modules.iter().enumerate() {
            let takeaways = module.key_takeaways.len();
            if !(MIN_TAKEAWAYS..=MAX_TAKEAWAYS).contains(&takeaways) {
                issues.push(QualityIssue::TakeawayCountOutOfRange {
                    module: i,
                    count: takeaways,
                });
            }

            if module.quiz.is_none() {
                issues.push(QualityIssue::MissingQuiz { module: i });
            }

            let sentences = sentence_count(&module.summary_highlight);
            if sentences > 2 {
                issues.push(QualityIssue::LongSummary {
                    module: i,
                    sentences,
                });
            }
        }

        issues
    }
}

const ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "vs.", "approx.", "cf.", "dr.", "mr.", "mrs.", "ms.", "st.", "no.", "u.s.",
];

/// Counts sentences by terminal punctuation at the end of a word, so
/// decimals and known abbreviations do not split a sentence.
fn sentence_count(text: &str) -> usize {
    let mut count = 0;
    let mut open = false;

    for word in text.split_whitespace() {
        open = true;
        let word = word.trim_end_matches(['"', '\'', ')', '\u{201d}', '\u{2019}']);
        if word.ends_with(['.', '!', '?']) && !is_abbreviation(word) {
            count += 1;
            open = false;
        }
    }

    count + usize::from(open)
}

fn is_abbreviation(word: &str) -> bool {
    let word = word.trim_start_matches(['(', '"', '\u{201c}']).to_lowercase();
    ABBREVIATIONS.contains(&word.as_str())
}
