//! Text extraction and line grouping.
//!
//! Content-stream operators are replayed through a small text-state machine
//! that yields positioned [`TextSpan`]s; spans are then grouped into
//! reading-order [`TextLine`]s.  All document access goes through
//! [`PdfBackend`], so this module never touches `lopdf` directly.
//!
//! ```text
//! ContentOp[]  --walk-->  TextSpan[]  --group-->  TextLine[]
//! ```

use super::backend::{decode_fallback, ContentOp, FontResource, Operand, PageId, PdfBackend};
use crate::PdfError;

/// A run of text drawn by one show-text operator.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
}

/// Spans sharing a baseline, left to right.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub y: f32,
    pub x: f32,
}

impl TextLine {
    /// Span texts joined by single spaces.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Baselines closer than this (in points) belong to the same line.
const LINE_TOLERANCE: f32 = 1.0;

/// Glyph width as a fraction of the font size; glyph metrics are not read.
const GLYPH_WIDTH_RATIO: f32 = 0.5;

/// Gap (in points) between merged spans that becomes a space.
const WORD_GAP: f32 = 1.5;

const FONT_SIZE_EPSILON: f32 = 0.5;

/// `[a, b, c, d, e, f]` affine matrix as used by `Tm` and `cm`.
type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `m1 × m2` in the row-vector convention of PDF: apply `m1`, then `m2`.
fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    let [a1, b1, c1, d1, e1, f1] = *m1;
    let [a2, b2, c2, d2, e2, f2] = *m2;
    [
        a1 * a2 + b1 * c2,
        a1 * b2 + b1 * d2,
        c1 * a2 + d1 * c2,
        c1 * b2 + d1 * d2,
        e1 * a2 + f1 * c2 + e2,
        e1 * b2 + f1 * d2 + f2,
    ]
}

fn transform_point(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    let [a, b, c, d, e, f] = *m;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Scripts written without spaces between words (CJK, Hangul, Thai, Lao).
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        0x0E00..=0x0EFF
            | 0x3000..=0x303F
            | 0x3040..=0x30FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xAC00..=0xD7AF
            | 0xF900..=0xFAFF
            | 0xFF00..=0xFFEF
    )
}

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    text_matrix: Matrix,
    line_matrix: Matrix,
    /// `Tz` as a factor, not a percentage.
    horizontal_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            horizontal_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    /// Current pen position in user space, rise included.
    fn origin(&self) -> (f32, f32) {
        transform_point(&self.text_matrix, 0.0, self.rise)
    }

    /// Horizontal and vertical scale of text space on the page.
    fn page_scale(&self, ctm: &Matrix) -> (f32, f32) {
        let [a, b, c, d, _, _] = multiply(&self.text_matrix, ctm);
        (a.hypot(b), c.hypot(d))
    }

    fn glyph_width(&self) -> f32 {
        self.font_size * GLYPH_WIDTH_RATIO * self.horizontal_scale
    }

    fn advance(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Move the pen past `text` as drawn with the current spacing.
    fn advance_past(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|c| {
                let word = if c == ' ' { self.word_spacing } else { 0.0 };
                self.glyph_width() + self.char_spacing + word
            })
            .sum();
        self.advance(dx);
    }

    /// `Td`: start a new line offset from the current line start.
    fn move_line(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line_matrix;
        self.line_matrix[4] = a * tx + c * ty + e;
        self.line_matrix[5] = b * tx + d * ty + f;
        self.text_matrix = self.line_matrix;
    }

    /// `T*`
    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Apply an operator that only changes state. Returns `false` for
    /// operators that are not text-state operators.
    fn apply(&mut self, op: &ContentOp, fonts: &[FontResource]) -> bool {
        let num = |i: usize| op.operands.get(i).and_then(Operand::as_number);

        match op.operator.as_str() {
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => self.set_font(&op.operands, fonts),
            "Tm" => {
                let values: Vec<f32> = op.operands.iter().filter_map(Operand::as_number).collect();
                if let [a, b, c, d, e, f] = values[..] {
                    self.text_matrix = [a, b, c, d, e, f];
                    self.line_matrix = self.text_matrix;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    if op.operator == "TD" {
                        self.leading = -ty;
                    }
                    self.move_line(tx, ty);
                }
            }
            "T*" => self.next_line(),
            "TL" => self.leading = num(0).unwrap_or(self.leading),
            "Tc" => self.char_spacing = num(0).unwrap_or(self.char_spacing),
            "Tw" => self.word_spacing = num(0).unwrap_or(self.word_spacing),
            "Ts" => self.rise = num(0).unwrap_or(self.rise),
            "Tz" => {
                if let Some(percent) = num(0) {
                    self.horizontal_scale = percent / 100.0;
                }
            }
            _ => return false,
        }
        true
    }

    fn set_font(&mut self, operands: &[Operand], fonts: &[FontResource]) {
        let (Some(Operand::Name(key) | Operand::Str(key)), Some(size)) =
            (operands.first(), operands.get(1))
        else {
            return;
        };

        self.font_name = find_font(key, fonts)
            .and_then(|font| font.base_font.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(key).into_owned());
        self.font_size = size.as_number().unwrap_or(0.0);
        self.font_key = key.clone();
    }
}

fn find_font<'a>(key: &[u8], fonts: &'a [FontResource]) -> Option<&'a FontResource> {
    fonts.iter().find(|font| font.key == key)
}

/// Replays one page's operators and collects the spans they draw.
struct PageWalker<'a> {
    backend: &'a dyn PdfBackend,
    page_id: PageId,
    fonts: &'a [FontResource],
    state: TextState,
    /// User space to page space.
    ctm: Matrix,
    /// Graphics states pushed by `q`.
    saved: Vec<(Matrix, TextState)>,
    spans: Vec<TextSpan>,
}

impl<'a> PageWalker<'a> {
    fn new(backend: &'a dyn PdfBackend, page_id: PageId, fonts: &'a [FontResource]) -> Self {
        Self {
            backend,
            page_id,
            fonts,
            state: TextState::default(),
            ctm: IDENTITY,
            saved: Vec::new(),
            spans: Vec::new(),
        }
    }

    /// Decode a string operand with the current font.
    fn decode(&self, operand: &Operand) -> String {
        let Operand::Str(bytes) = operand else {
            return String::new();
        };

        let font = find_font(&self.state.font_key, self.fonts);
        match self.backend.decode_text(self.page_id, font, bytes) {
            decoded if decoded.is_empty() => decode_fallback(bytes),
            decoded => decoded,
        }
    }

    fn step(&mut self, op: &ContentOp) {
        if self.state.apply(op, self.fonts) {
            return;
        }

        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => self.saved.push((self.ctm, self.state.clone())),
            "Q" => {
                // An unbalanced `Q` leaves the state alone.
                if let Some((ctm, state)) = self.saved.pop() {
                    self.ctm = ctm;
                    self.state = state;
                }
            }
            "cm" => {
                let values: Vec<f32> = operands.iter().filter_map(Operand::as_number).collect();
                if let [a, b, c, d, e, f] = values[..] {
                    self.ctm = multiply(&[a, b, c, d, e, f], &self.ctm);
                }
            }
            "Tj" => {
                if let Some(s) = operands.first() {
                    self.show(s);
                }
            }
            "'" => {
                self.state.next_line();
                if let Some(s) = operands.first() {
                    self.show(s);
                }
            }
            "\"" => {
                // aw ac string: Tw, Tc, T*, Tj
                if let [aw, ac, s, ..] = &operands[..] {
                    if let Some(aw) = aw.as_number() {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = ac.as_number() {
                        self.state.char_spacing = ac;
                    }
                    self.state.next_line();
                    self.show(s);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = operands.first() {
                    self.show_array(items);
                }
            }
            _ => {}
        }
    }

    fn show(&mut self, operand: &Operand) {
        let text = self.decode(operand);
        if text.is_empty() {
            return;
        }
        let origin = self.state.origin();
        let span = self.span(text, origin);
        self.state.advance_past(&span.text);
        self.spans.push(span);
    }

    /// `TJ`: strings interleaved with kerning in thousandths of text space.
    /// A kern wider than a third of a glyph reads as a word gap.
    fn show_array(&mut self, items: &[Operand]) {
        let mut text = String::new();
        let mut origin = self.state.origin();

        for item in items {
            if let Operand::Str(_) = item {
                let fragment = self.decode(item);
                if text.is_empty() {
                    origin = self.state.origin();
                }
                text.push_str(&fragment);
                self.state.advance_past(&fragment);
            } else if let Some(kern) = item.as_number() {
                let dx = -kern / 1000.0 * self.state.font_size * self.state.horizontal_scale;
                if dx > self.state.glyph_width() * 0.3 && !text.is_empty() && !text.ends_with(' ')
                {
                    text.push(' ');
                }
                self.state.advance(dx);
            }
        }

        let text = text.trim_end();
        if !text.is_empty() {
            let span = self.span(text.to_string(), origin);
            self.spans.push(span);
        }
    }

    /// Place `text` drawn from the user-space `origin` on the page.
    fn span(&self, text: String, origin: (f32, f32)) -> TextSpan {
        let (x, y) = transform_point(&self.ctm, origin.0, origin.1);
        let (scale_x, scale_y) = self.state.page_scale(&self.ctm);
        let width = text.chars().count() as f32 * self.state.glyph_width() * scale_x;
        TextSpan {
            text,
            x,
            y,
            width,
            font_size: (self.state.font_size * scale_y).abs(),
            font_name: self.state.font_name.clone(),
        }
    }
}

/// Replay a page's content stream and return the text spans it draws.
///
/// Understands `BT`, `Tf`, `Tm`, `Td`, `TD`, `T*`, `TL`, `Tc`, `Tw`, `Tz`,
/// `Ts`, `Tj`, `TJ`, `'` and `"`, plus `q`, `Q` and `cm` for the current
/// transformation matrix; every other operator is skipped. Span positions
/// are in page space.
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_else(|e| {
        log::debug!("page {:?}: no usable fonts ({})", page_id, e);
        Vec::new()
    });

    let mut walker = PageWalker::new(backend, page_id, &fonts);
    for op in &ops {
        walker.step(op);
    }

    Ok(walker.spans)
}

/// Lines of every page, keyed by 1-based page number, in page order.
pub fn extract_all_pages(
    backend: &dyn PdfBackend,
) -> Result<Vec<(usize, Vec<TextLine>)>, PdfError> {
    backend
        .pages()
        .into_iter()
        .map(|(number, page_id)| -> Result<_, PdfError> {
            let spans = extract_page_spans(backend, page_id)?;
            log::debug!("page {}: {} text spans", number, spans.len());
            Ok((number as usize, group_spans_into_lines(spans)))
        })
        .collect()
}

/// Group spans into lines: top of page first, then left to right.
///
/// A span joins the current line while its baseline stays within
/// [`LINE_TOLERANCE`] of the line's first span.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines = Vec::new();
    let mut pending: Vec<TextSpan> = Vec::new();

    for span in spans {
        let starts_new_line = pending
            .first()
            .is_some_and(|first| (span.y - first.y).abs() > LINE_TOLERANCE);
        if starts_new_line {
            lines.push(build_line(std::mem::take(&mut pending)));
        }
        pending.push(span);
    }
    if !pending.is_empty() {
        lines.push(build_line(pending));
    }

    lines
}

/// Merge neighbouring spans in the same font into one, inserting a space
/// for gaps of at least [`WORD_GAP`] unless both sides are spaceless
/// script.
fn build_line(mut spans: Vec<TextSpan>) -> TextLine {
    spans.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut merged: Vec<TextSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(prev) = merged.last_mut() {
            if continues(prev, &span) {
                let gap = span.x - (prev.x + prev.width);
                if gap >= WORD_GAP && !spaceless_boundary(prev, &span) {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.width = span.x + span.width - prev.x;
                continue;
            }
        }
        merged.push(span);
    }

    let (x, y) = merged.first().map_or((0.0, 0.0), |s| (s.x, s.y));
    TextLine {
        spans: merged,
        y,
        x,
    }
}

/// Whether `next` reads as a continuation of `prev`: same font and starts
/// no further than two font sizes to the right.
fn continues(prev: &TextSpan, next: &TextSpan) -> bool {
    let gap = next.x - (prev.x + prev.width);
    prev.font_name == next.font_name
        && (prev.font_size - next.font_size).abs() < FONT_SIZE_EPSILON
        && gap > -prev.font_size
        && gap < prev.font_size * 2.0
}

fn spaceless_boundary(prev: &TextSpan, next: &TextSpan) -> bool {
    match (prev.text.chars().last(), next.text.chars().next()) {
        (Some(l), Some(r)) => is_spaceless_script_char(l) && is_spaceless_script_char(r),
        _ => false,
    }
}
