use std::path::{Path, PathBuf};

use thiserror::Error;

use parser::backend::LopdfBackend;

pub mod parser;
pub mod render;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// `true` for the missing-file case, `false` for every extraction failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PdfError::NotFound(_))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Something that can turn a PDF file into plain text.
///
/// Line breaks and top-to-bottom reading order must be preserved; callers
/// segment the text on line-start markers.
pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<String, PdfError>;
}

/// [`TextExtractor`] backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, PdfError> {
        extract_text(path)
    }
}

/// Extract the text of the PDF at `path`.
pub fn extract_text(path: &Path) -> Result<String, PdfError> {
    if !path.exists() {
        return Err(PdfError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    extract_text_from_bytes(&bytes)
}

/// Extract the text of an in-memory PDF.
pub fn extract_text_from_bytes(bytes: &[u8]) -> Result<String, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    log::debug!("loaded PDF with {} pages", backend.page_count());

    let pages = parser::layout::extract_all_pages(&backend)?;
    let text = render::text::render_pages(&pages);

    Ok(render::cleanup::cleanup_text(&text))
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Dictionary, Document, Object, Stream};

    use super::*;

    fn helvetica() -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        }
    }

    /// Operators that draw each line with `Td` / `Tj`, 14pt apart.
    fn line_operations(lines: &[&[u8]]) -> Vec<Operation> {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![72.into(), 750.into()]),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));
        operations
    }

    /// Build a PDF with one page per operator list, all sharing `font` as
    /// `/F1`.
    fn build_document(font: Dictionary, pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(font);
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// Build a PDF with one Helvetica page per entry.
    fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
        let pages = pages
            .iter()
            .map(|lines| {
                let lines: Vec<&[u8]> = lines.iter().map(|line| line.as_bytes()).collect();
                line_operations(&lines)
            })
            .collect();
        build_document(helvetica(), pages)
    }

    #[test]
    fn test_extract_question_lines() {
        let bytes = build_pdf(&[&[
            "Sailing test",
            "1. What is port?",
            "A) Left side",
            "B) Right side",
            "C) Front",
            "D) Back",
            "Answer: A",
        ]]);

        let text = extract_text_from_bytes(&bytes).unwrap();

        assert_eq!(
            text,
            "Sailing test\n1. What is port?\nA) Left side\nB) Right side\nC) Front\nD) Back\nAnswer: A\n"
        );
    }

    #[test]
    fn test_extract_multiple_pages_in_order() {
        let bytes = build_pdf(&[&["1. First?", "A) a"], &["B) b", "2. Second?"]]);

        let text = extract_text_from_bytes(&bytes).unwrap();
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();

        assert_eq!(lines, vec!["1. First?", "A) a", "B) b", "2. Second?"]);
    }

    #[test]
    fn test_extract_win_ansi_encoding() {
        let mut font = helvetica();
        font.set("Encoding", "WinAnsiEncoding");
        let line: &[u8] = &[b'1', b'.', b' ', 0x93, b'P', b'o', b'r', b't', 0x94, b'?'];
        let bytes = build_document(font, vec![line_operations(&[line])]);

        let text = extract_text_from_bytes(&bytes).unwrap();

        assert_eq!(text, "1. \u{201C}Port\u{201D}?\n");
    }

    #[test]
    fn test_extract_flipped_page_matrix_keeps_reading_order() {
        let mut operations = vec![
            Operation::new(
                "cm",
                vec![1.into(), 0.into(), 0.into(), (-1).into(), 0.into(), 842.into()],
            ),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
        ];
        let lines = ["1. What is port?", "A) Left side", "Answer: A"];
        for (i, line) in lines.iter().enumerate() {
            let y = 100 + 14 * i as i64;
            operations.push(Operation::new(
                "Tm",
                vec![1.into(), 0.into(), 0.into(), (-1).into(), 72.into(), y.into()],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));
        let bytes = build_document(helvetica(), vec![operations]);

        let text = extract_text_from_bytes(&bytes).unwrap();

        assert_eq!(text, "1. What is port?\nA) Left side\nAnswer: A\n");
    }

    #[test]
    fn test_extract_invalid_bytes() {
        let err = extract_text_from_bytes(b"definitely not a pdf").unwrap_err();
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_extract_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");

        let err = extract_text(&missing).unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("missing.pdf"));
    }

    #[test]
    fn test_extractor_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.pdf");
        std::fs::write(&path, build_pdf(&[&["1. Q?"]])).unwrap();

        let text = LopdfExtractor.extract(&path).unwrap();

        assert_eq!(text, "1. Q?\n");
    }
}
