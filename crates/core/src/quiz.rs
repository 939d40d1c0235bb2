use serde::{Deserialize, Serialize};

use crate::question::QuestionRecord;

/// Default quiz title ("Sailing Knowledge Test").
pub const DEFAULT_TITLE: &str = "Τεστ Γνώσεων Ιστιοπλοΐας";

/// Default time limit: one hour.
pub const DEFAULT_TIME_LIMIT_SECONDS: u32 = 3600;

/// Default minimum number of correct answers to pass.
pub const DEFAULT_PASSING_SCORE: u32 = 24;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("time limit must be a positive number of seconds")]
    ZeroTimeLimit,

    #[error("failed to serialize quiz: {0}")]
    Serialize(String),
}

/// Metadata wrapped around the parsed questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    pub title: String,
    pub time_limit_seconds: u32,
    pub passing_score: u32,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            time_limit_seconds: DEFAULT_TIME_LIMIT_SECONDS,
            passing_score: DEFAULT_PASSING_SCORE,
        }
    }
}

impl QuizSettings {
    pub fn validate(&self) -> Result<(), QuizError> {
        if self.time_limit_seconds == 0 {
            return Err(QuizError::ZeroTimeLimit);
        }
        Ok(())
    }
}

/// The exported quiz, in the shape the quiz application loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDocument {
    pub quiz_title: String,
    pub time_limit_seconds: u32,
    pub passing_score: u32,
    pub total_questions: usize,
    pub questions: Vec<QuestionRecord>,
}

impl QuizDocument {
    /// Whether `passing_score` can be reached with the questions present.
    pub fn passing_score_reachable(&self) -> bool {
        self.passing_score as usize <= self.total_questions
    }
}

/// Wrap parsed questions with quiz metadata.
///
/// `total_questions` is always derived from `questions`.
pub fn assemble(questions: Vec<QuestionRecord>, settings: &QuizSettings) -> QuizDocument {
    QuizDocument {
        quiz_title: settings.title.clone(),
        time_limit_seconds: settings.time_limit_seconds,
        passing_score: settings.passing_score,
        total_questions: questions.len(),
        questions,
    }
}

/// Render the document as 2-space indented JSON with a trailing newline.
///
/// Non-ASCII text (Greek titles and questions) is written as-is, not escaped.
pub fn to_json(quiz: &QuizDocument) -> Result<String, QuizError> {
    let mut json =
        serde_json::to_string_pretty(quiz).map_err(|e| QuizError::Serialize(e.to_string()))?;
    json.push('\n');
    Ok(json)
}
