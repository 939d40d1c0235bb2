use crate::parser::layout::TextLine;

/// Render extracted pages as plain text: one output line per [`TextLine`],
/// pages separated by a blank line.
pub fn render_pages(pages: &[(usize, Vec<TextLine>)]) -> String {
    pages
        .iter()
        .map(|(_, lines)| {
            lines
                .iter()
                .map(TextLine::text)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::layout::TextSpan;

    fn line(text: &str) -> TextLine {
        TextLine {
            spans: vec![TextSpan {
                text: text.to_string(),
                x: 0.0,
                y: 0.0,
                width: 0.0,
                font_size: 12.0,
                font_name: "F".to_string(),
            }],
            ..TextLine::default()
        }
    }

    #[test]
    fn test_render_pages() {
        let pages = vec![
            (1, vec![line("1. Q?"), line("A) a")]),
            (2, vec![]),
            (3, vec![line("B) b")]),
        ];
        assert_eq!(render_pages(&pages), "1. Q?\nA) a\n\nB) b");
    }

    #[test]
    fn test_render_no_pages() {
        assert_eq!(render_pages(&[]), "");
    }
}
