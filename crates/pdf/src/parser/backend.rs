use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};

use crate::PdfError;

/// `(object number, generation)`, same shape as `lopdf::ObjectId`.
pub type PageId = (u32, u16);

/// A font entry from a page's `/Resources /Font` dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontResource {
    /// Resource key used by `Tf`, e.g. `b"F1"`.
    pub key: Vec<u8>,
    pub base_font: Option<String>,
    /// `/Encoding` when it is a plain name such as `WinAnsiEncoding` or
    /// `Identity-H`.
    pub encoding: Option<String>,
    /// The font has an `/Encoding` entry, either a name or a dictionary with
    /// `/Differences`.
    pub has_encoding: bool,
    pub has_to_unicode: bool,
}

impl FontResource {
    fn is_identity(&self) -> bool {
        self.encoding
            .as_deref()
            .is_some_and(|enc| enc.starts_with("Identity"))
    }

    /// Whether the font dictionary tells `lopdf` how to map its codes.
    fn has_mapping(&self) -> bool {
        self.has_to_unicode || (self.has_encoding && !self.is_identity())
    }
}

/// Content-stream operand, detached from `lopdf` so the text walker can be
/// fed hand-built operators in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    Dict(Vec<(Vec<u8>, Operand)>),
    Reference(PageId),
}

impl Operand {
    /// Numeric value of `Integer` and `Real` operands.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Operand::Integer(i) => Some(*i as f32),
            Operand::Real(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&Object> for Operand {
    fn from(obj: &Object) -> Self {
        let entries = |dict: &Dictionary| -> Vec<(Vec<u8>, Operand)> {
            dict.iter()
                .map(|(k, v)| (k.clone(), Operand::from(v)))
                .collect()
        };

        match obj {
            Object::Null => Operand::Null,
            Object::Boolean(b) => Operand::Bool(*b),
            Object::Integer(i) => Operand::Integer(*i),
            Object::Real(f) => Operand::Real(*f),
            Object::Name(n) => Operand::Name(n.clone()),
            Object::String(s, _) => Operand::Str(s.clone()),
            Object::Array(items) => Operand::Array(items.iter().map(Operand::from).collect()),
            Object::Dictionary(dict) => Operand::Dict(entries(dict)),
            // Inline streams never carry text; keep the dictionary only.
            Object::Stream(stream) => Operand::Dict(entries(&stream.dict)),
            Object::Reference(id) => Operand::Reference(*id),
        }
    }
}

/// One content-stream operator with its operands.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<Operand>,
}

/// Decode string bytes when the font gives no better hint.
///
/// UTF-16BE is recognised by its `FE FF` byte-order mark, then UTF-8 is
/// tried, and anything else is read as Latin-1.
pub fn decode_fallback(bytes: &[u8]) -> String {
    if let [0xFE, 0xFF, payload @ ..] = bytes {
        return utf16be_lossy(payload);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn utf16be_lossy(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Read access to a parsed document, page by page.
///
/// The layout pass only talks to this trait, so it can be exercised against
/// mock documents that hand back pre-decoded operators.
pub trait PdfBackend {
    /// 1-based page number to page object id, in page order.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, PdfError>;

    /// Concatenated, decompressed content stream of a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError>;

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError>;

    /// Decode the bytes of a shown string drawn with `font` on `page`.
    fn decode_text(&self, page: PageId, font: Option<&FontResource>, bytes: &[u8]) -> String;
}

/// [`PdfBackend`] over a `lopdf` document.
pub struct LopdfBackend {
    doc: Document,
}

impl LopdfBackend {
    /// Parse an in-memory PDF. Encrypted documents are refused.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn font_resource(&self, key: &[u8], dict: &Dictionary) -> FontResource {
        let name_of = |entry: &[u8]| -> Option<String> {
            match dict.get(entry).ok()? {
                Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
                _ => None,
            }
        };

        FontResource {
            key: key.to_vec(),
            base_font: name_of(b"BaseFont"),
            encoding: name_of(b"Encoding"),
            has_encoding: dict.has(b"Encoding"),
            has_to_unicode: dict.has(b"ToUnicode"),
        }
    }

    /// Decode with the font's own mapping: `ToUnicode` first, then the
    /// simple-font encoding (`WinAnsiEncoding`, `MacRomanEncoding`,
    /// `/Differences`, ...).
    fn decode_with_font(
        &self,
        page: PageId,
        key: &[u8],
        bytes: &[u8],
    ) -> Result<String, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("page {:?} fonts: {}", page, e)))?;
        let dict = fonts.get(key).ok_or_else(|| {
            PdfError::Parse(format!("font {} not on page", String::from_utf8_lossy(key)))
        })?;

        let encoding = dict
            .get_font_encoding(&self.doc)
            .map_err(|e| PdfError::Parse(format!("font encoding: {}", e)))?;
        Document::decode_text(&encoding, bytes)
            .map_err(|e| PdfError::Parse(format!("text decoding: {}", e)))
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontResource>, PdfError> {
        let fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| PdfError::Parse(format!("page {:?} fonts: {}", page, e)))?;

        Ok(fonts
            .iter()
            .map(|(key, dict)| self.font_resource(key, dict))
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>, PdfError> {
        self.doc
            .get_page_content(page)
            .map_err(|e| PdfError::Parse(format!("page {:?} content: {}", page, e)))
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
        let content = Content::decode(data)
            .map_err(|e| PdfError::Parse(format!("content stream: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(Operand::from).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font: Option<&FontResource>, bytes: &[u8]) -> String {
        let Some(font) = font else {
            return decode_fallback(bytes);
        };

        if font.has_mapping() {
            match self.decode_with_font(page, &font.key, bytes) {
                Ok(text) => return text,
                Err(e) => log::debug!("{}: {}", String::from_utf8_lossy(&font.key), e),
            }
        }

        // Identity-H/V fonts without a usable ToUnicode map usually still use
        // two-byte codes equal to the Unicode code points.
        if font.is_identity() && !bytes.is_empty() && bytes.len() % 2 == 0 {
            let decoded = utf16be_lossy(bytes);
            if decoded.chars().any(|c| c != '\u{FFFD}' && c != '\0') {
                return decoded;
            }
        }

        decode_fallback(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn empty_backend() -> LopdfBackend {
        LopdfBackend {
            doc: Document::with_version("1.5"),
        }
    }

    // -- decode_fallback ----------------------------------------------------

    #[test]
    fn test_fallback_utf8_greek() {
        assert_eq!(decode_fallback("Απάντηση: Β".as_bytes()), "Απάντηση: Β");
    }

    #[test]
    fn test_fallback_latin1() {
        assert_eq!(decode_fallback(&[b'c', b'a', b'f', 0xE9]), "caf\u{00E9}");
    }

    #[test]
    fn test_fallback_utf16_with_bom() {
        // Trailing odd byte is dropped.
        let input = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x29, 0x00];
        assert_eq!(decode_fallback(&input), "A)");
    }

    #[test]
    fn test_fallback_empty() {
        assert_eq!(decode_fallback(&[]), "");
        assert_eq!(decode_fallback(&[0xFE, 0xFF]), "");
    }

    // -- Operand ------------------------------------------------------------

    #[test]
    fn test_operand_as_number() {
        assert_eq!(Operand::Integer(-10).as_number(), Some(-10.0));
        assert_eq!(Operand::Real(2.5).as_number(), Some(2.5));
        assert_eq!(Operand::Null.as_number(), None);
        assert_eq!(Operand::Str(b"12".to_vec()).as_number(), None);
    }

    #[test]
    fn test_operand_from_tj_array() {
        let arr = Object::Array(vec![
            Object::string_literal("Ans"),
            Object::Integer(-250),
            Object::string_literal("wer"),
        ]);
        assert_eq!(
            Operand::from(&arr),
            Operand::Array(vec![
                Operand::Str(b"Ans".to_vec()),
                Operand::Integer(-250),
                Operand::Str(b"wer".to_vec()),
            ]),
        );
    }

    #[test]
    fn test_operand_from_name_and_reference() {
        assert_eq!(
            Operand::from(&Object::Name(b"F1".to_vec())),
            Operand::Name(b"F1".to_vec()),
        );
        assert_eq!(
            Operand::from(&Object::Reference((7, 0))),
            Operand::Reference((7, 0))
        );
    }

    // -- LopdfBackend -------------------------------------------------------

    #[test]
    fn test_load_bytes_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes(b"definitely not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_decode_text_identity_font() {
        let font = FontResource {
            key: b"F2".to_vec(),
            encoding: Some("Identity-H".to_string()),
            ..FontResource::default()
        };

        let text = empty_backend().decode_text((1, 0), Some(&font), &[0x03, 0x91, 0x00, 0x29]);

        assert_eq!(text, "Α)");
    }

    #[test]
    fn test_decode_text_unreadable_font_mapping_falls_back() {
        // The font claims a ToUnicode map but the page does not exist.
        let font = FontResource {
            key: b"F2".to_vec(),
            encoding: Some("Identity-H".to_string()),
            has_encoding: true,
            has_to_unicode: true,
            ..FontResource::default()
        };

        let text = empty_backend().decode_text((1, 0), Some(&font), &[0x00, 0x41]);

        assert_eq!(text, "A");
    }

    #[test]
    fn test_font_resource_flags() {
        let dict = lopdf::dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Times-Roman",
            "Encoding" => lopdf::dictionary! {
                "Differences" => vec![Object::Integer(65), Object::Name(b"Alpha".to_vec())],
            },
        };

        let font = empty_backend().font_resource(b"F3", &dict);

        assert_eq!(font.base_font.as_deref(), Some("Times-Roman"));
        assert_eq!(font.encoding, None);
        assert!(font.has_encoding);
        assert!(!font.has_to_unicode);
        assert!(font.has_mapping());
    }

    #[test]
    fn test_identity_font_without_to_unicode_has_no_mapping() {
        let font = FontResource {
            encoding: Some("Identity-H".to_string()),
            has_encoding: true,
            ..FontResource::default()
        };
        assert!(!font.has_mapping());
    }

    #[test]
    fn test_decode_text_plain_font() {
        assert_eq!(empty_backend().decode_text((1, 0), None, b"D) Back"), "D) Back");
    }
}
