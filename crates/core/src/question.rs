//! Segmenting extracted PDF text into multiple-choice question records.
//!
//! The expected source layout is:
//!
//! ```text
//! 12. Question text?
//! A) Option 1
//! B) Option 2
//! C) Option 3
//! D) Option 4
//! Answer: B
//! ```
//!
//! Matching rules live behind [`QuestionParser`] so they can be swapped
//! without touching the assembler or the CLI.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of options every accepted question carries.
pub const OPTION_COUNT: usize = 4;

/// One accepted multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// 1-based position of the segment this record was parsed from.
    pub id: u32,
    pub question: String,
    pub options: [String; OPTION_COUNT],
    pub correct_answer_index: u8,
}

/// The letter naming the correct option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    /// Zero-based option index (`A` -> 0 ... `D` -> 3).
    pub fn index(self) -> u8 {
        match self {
            AnswerLetter::A => 0,
            AnswerLetter::B => 1,
            AnswerLetter::C => 2,
            AnswerLetter::D => 3,
        }
    }
}

impl TryFrom<char> for AnswerLetter {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'A' => Ok(AnswerLetter::A),
            'B' => Ok(AnswerLetter::B),
            'C' => Ok(AnswerLetter::C),
            'D' => Ok(AnswerLetter::D),
            _ => Err(c),
        }
    }
}

/// Why a segment did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("question text is empty")]
    EmptyQuestion,
    #[error("expected 4 options, found {found}")]
    OptionCount { found: usize },
    #[error("no answer marker found")]
    MissingAnswer,
}

/// Result of parsing a single segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Accepted(QuestionRecord),
    Rejected { id: u32, reason: Rejection },
}

/// Every segment outcome in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub outcomes: Vec<SegmentOutcome>,
}

impl ParseReport {
    /// Number of segments attempted.
    pub fn segment_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn accepted(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            SegmentOutcome::Accepted(record) => Some(record),
            SegmentOutcome::Rejected { .. } => None,
        })
    }

    /// `(id, reason)` for each dropped segment.
    pub fn rejected(&self) -> impl Iterator<Item = (u32, &Rejection)> {
        self.outcomes.iter().filter_map(|o| match o {
            SegmentOutcome::Rejected { id, reason } => Some((*id, reason)),
            SegmentOutcome::Accepted(_) => None,
        })
    }

    /// Consume the report, keeping only accepted records.
    pub fn into_questions(self) -> Vec<QuestionRecord> {
        self.outcomes
            .into_iter()
            .filter_map(|o| match o {
                SegmentOutcome::Accepted(record) => Some(record),
                SegmentOutcome::Rejected { .. } => None,
            })
            .collect()
    }
}

/// Turns extracted document text into question outcomes.
pub trait QuestionParser {
    fn parse(&self, text: &str) -> ParseReport;
}

/// Parser for numbered questions with `A)`..`D)` options and an
/// `Answer: X` marker (English or Greek).
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerParser;

impl QuestionParser for MarkerParser {
    fn parse(&self, text: &str) -> ParseReport {
        let outcomes = split_segments(text)
            .enumerate()
            .map(|(i, segment)| {
                let id = (i + 1) as u32;
                match parse_segment(segment, id) {
                    Ok(record) => SegmentOutcome::Accepted(record),
                    Err(reason) => SegmentOutcome::Rejected { id, reason },
                }
            })
            .collect();

        ParseReport { outcomes }
    }
}

/// Parse `text` with the default [`MarkerParser`].
pub fn parse(text: &str) -> ParseReport {
    MarkerParser.parse(text)
}

/// Accepted records only, in source order.
pub fn parse_questions(text: &str) -> Vec<QuestionRecord> {
    parse(text).into_questions()
}

fn marker_regex() -> &'static Regex {
    static RE_MARKER: OnceLock<Regex> = OnceLock::new();
    RE_MARKER.get_or_init(|| Regex::new(r"(?m)^[ \t]*\d+\.\s+").unwrap())
}

fn option_regex() -> &'static Regex {
    static RE_OPTION: OnceLock<Regex> = OnceLock::new();
    RE_OPTION.get_or_init(|| Regex::new(r"^([A-D])\)\s*(.+)$").unwrap())
}

fn answer_regex() -> &'static Regex {
    static RE_ANSWER: OnceLock<Regex> = OnceLock::new();
    RE_ANSWER.get_or_init(|| Regex::new(r"(?i)(?:Answer|Απάντηση):\s*([A-D])").unwrap())
}

/// Split on question markers, dropping whatever precedes the first one.
pub fn split_segments(text: &str) -> impl Iterator<Item = &str> {
    marker_regex().split(text).skip(1)
}

/// Parse one segment (the text after its `N. ` marker).
pub fn parse_segment(segment: &str, id: u32) -> Result<QuestionRecord, Rejection> {
    let mut lines = segment.lines().map(str::trim).skip_while(|l| l.is_empty());

    let question = lines.next().ok_or(Rejection::EmptyQuestion)?.to_string();

    let options: Vec<String> = lines
        .filter_map(|line| option_regex().captures(line))
        .map(|caps| caps[2].trim().to_string())
        .collect();

    let options: [String; OPTION_COUNT] = options
        .try_into()
        .map_err(|found: Vec<String>| Rejection::OptionCount { found: found.len() })?;

    let answer = find_answer(segment).ok_or(Rejection::MissingAnswer)?;

    Ok(QuestionRecord {
        id,
        question,
        options,
        correct_answer_index: answer.index(),
    })
}

/// Search the whole segment for the answer marker.
pub fn find_answer(segment: &str) -> Option<AnswerLetter> {
    let caps = answer_regex().captures(segment)?;
    let letter = caps[1].chars().next()?;
    AnswerLetter::try_from(letter).ok()
}
