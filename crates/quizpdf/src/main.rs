#![allow(unused)]

use std::path::PathBuf;

use crate::prelude::*;
use clap::Parser;

use quizpdf_core::question::MarkerParser;
use quizpdf_core::quiz::{
    QuizSettings, DEFAULT_PASSING_SCORE, DEFAULT_TIME_LIMIT_SECONDS, DEFAULT_TITLE,
};

mod convert;
mod error;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Convert a sailing quiz PDF into the JSON file loaded by the quiz app.\n\n\
                  Example:\n  quizpdf sailing_questions.pdf quiz_data.json"
)]
pub struct App {
    /// Quiz PDF to read
    input: PathBuf,

    /// Where to write the quiz JSON
    output: PathBuf,

    #[clap(flatten)]
    quiz: QuizArgs,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct QuizArgs {
    /// Quiz title
    #[clap(long, env = "QUIZPDF_TITLE", default_value = DEFAULT_TITLE)]
    title: String,

    /// Time limit for the whole quiz, in seconds
    #[clap(long, env = "QUIZPDF_TIME_LIMIT", default_value_t = DEFAULT_TIME_LIMIT_SECONDS)]
    time_limit: u32,

    /// Correct answers needed to pass
    #[clap(long, env = "QUIZPDF_PASSING_SCORE", default_value_t = DEFAULT_PASSING_SCORE)]
    passing_score: u32,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Where to save the raw extracted text
    #[clap(
        long,
        env = "QUIZPDF_DEBUG_TEXT",
        default_value = "debug_extracted_text.txt"
    )]
    debug_text: PathBuf,

    /// Whether to display additional information.
    #[clap(long, env = "QUIZPDF_VERBOSE", default_value = "false")]
    verbose: bool,
}

impl From<QuizArgs> for QuizSettings {
    fn from(args: QuizArgs) -> Self {
        QuizSettings {
            title: args.title,
            time_limit_seconds: args.time_limit,
            passing_score: args.passing_score,
        }
    }
}

fn main() -> Result<()> {
    let app = match App::try_parse() {
        Ok(app) => app,
        Err(err) => {
            // Usage errors exit with 1; --help and --version exit with 0.
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print()?;
            std::process::exit(code);
        }
    };

    let level = if app.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    color_eyre::install()?;

    let options = convert::Options {
        input: app.input,
        output: app.output,
        debug_text: app.global.debug_text,
        settings: app.quiz.into(),
    };

    convert::run(&pdf::LopdfExtractor, &MarkerParser, &options).map(|_| ())
}
