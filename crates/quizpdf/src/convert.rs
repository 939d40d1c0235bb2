use std::fs;
use std::path::PathBuf;

use colored::Colorize;

use crate::prelude::{println, *};

use pdf::{PdfError, TextExtractor};
use quizpdf_core::question::QuestionParser;
use quizpdf_core::quiz::{assemble, to_json, QuizDocument, QuizSettings};

/// Everything a single conversion needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Options {
    pub input: PathBuf,
    pub output: PathBuf,
    pub debug_text: PathBuf,
    pub settings: QuizSettings,
}

/// Convert `options.input` into a quiz JSON file at `options.output`.
///
/// The extracted text is saved to `options.debug_text` before parsing, so it
/// is available even when no question could be parsed. In that case nothing
/// is written to `options.output`.
pub fn run(
    extractor: &dyn TextExtractor,
    parser: &dyn QuestionParser,
    options: &Options,
) -> Result<QuizDocument> {
    options
        .settings
        .validate()
        .context("Invalid quiz settings")?;

    if !options.input.exists() {
        return Err(Error::InputNotFound(options.input.clone()).into());
    }

    println!(
        "Processing PDF: {}",
        options.input.display().to_string().bright_cyan()
    );

    println!("Extracting text from PDF...");
    let text = extractor.extract(&options.input).map_err(|e| {
        if e.is_not_found() {
            eyre!(Error::InputNotFound(options.input.clone()))
        } else {
            eyre!(e).wrap_err("Failed to extract text from PDF")
        }
    })?;

    fs::write(&options.debug_text, &text).with_context(|| {
        f!(
            "Failed to write extracted text to {}",
            options.debug_text.display()
        )
    })?;
    println!(
        "Debug: Extracted text saved to {}",
        options.debug_text.display()
    );

    println!("Parsing questions...");
    let report = parser.parse(&text);
    for (id, reason) in report.rejected() {
        log::warn!("Skipping question {}: {}", id, reason);
    }
    log::debug!(
        "{} segments, {} accepted",
        report.segment_count(),
        report.accepted().count()
    );

    let questions = report.into_questions();
    if questions.is_empty() {
        return Err(Error::NoQuestions(options.debug_text.clone()).into());
    }
    println!("Successfully parsed {} questions", questions.len());

    let quiz = assemble(questions, &options.settings);
    if !quiz.passing_score_reachable() {
        log::warn!(
            "Passing score {} is higher than the number of questions ({})",
            quiz.passing_score,
            quiz.total_questions
        );
    }

    println!("Writing to {}...", options.output.display());
    let json = to_json(&quiz).context("Failed to serialize quiz")?;
    fs::write(&options.output, json)
        .with_context(|| f!("Failed to write {}", options.output.display()))?;

    print_summary(&quiz, options);

    Ok(quiz)
}

fn print_summary(quiz: &QuizDocument, options: &Options) {
    println!(
        "\n{} Quiz data saved to {}",
        "✓ Success!".green().bold(),
        options.output.display()
    );
    println!("  Total questions: {}", quiz.total_questions);
    println!("  Time limit: {} seconds", quiz.time_limit_seconds);
    println!("  Passing score: {} correct answers", quiz.passing_score);
}
