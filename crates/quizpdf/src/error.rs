use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("File '{}' not found", .0.display())]
    InputNotFound(PathBuf),

    #[error("No questions were parsed from the PDF. Check the PDF format and the extracted text in {}", .0.display())]
    NoQuestions(PathBuf),
}
