//! Core library for quizpdf
//!
//! This crate implements the **Functional Core** of the quizpdf application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The quizpdf project splits its work across three crates:
//!
//! - **`quizpdf_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdf`**: Text extraction from PDF documents
//! - **`quizpdf`**: File I/O, logging and orchestration (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no logging, no external state mutations
//! - **Testable**: Can be tested with plain text fixtures, no PDF required
//!
//! Rejected question segments are returned as data ([`question::SegmentOutcome`])
//! rather than logged, so the shell decides how to report them.
//!
//! # Module Organization
//!
//! - [`question`]: Segmenting extracted text and parsing question records
//! - [`quiz`]: Assembling records and metadata into the exported document
//!
//! # Example Usage
//!
//! ```rust
//! use quizpdf_core::question::parse;
//! use quizpdf_core::quiz::{assemble, QuizSettings};
//!
//! let text = "\
//! 1. What is port?
//! A) Left side
//! B) Right side
//! C) Front
//! D) Back
//! Answer: A
//! ";
//!
//! let report = parse(text);
//! let quiz = assemble(report.into_questions(), &QuizSettings::default());
//!
//! assert_eq!(quiz.total_questions, 1);
//! assert_eq!(quiz.questions[0].correct_answer_index, 0);
//! ```

pub mod question;
pub mod quiz;
