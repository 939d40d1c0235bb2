use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Clean up extracted PDF text.
///
/// Applies unicode normalization, ligature replacement, line-ending
/// normalization, whitespace normalization and replacement character
/// removal.  Line breaks are never added or removed: question markers are
/// matched at line starts.
pub fn cleanup_text(text: &str) -> String {
    // 1. Unicode NFC normalization (Greek accents often arrive decomposed).
    let mut result: String = text.nfc().collect();

    // 2. Fix ligatures (ff, fi, fl, ffi, ffl).
    let ligatures = [
        ("\u{FB00}", "ff"),
        ("\u{FB01}", "fi"),
        ("\u{FB02}", "fl"),
        ("\u{FB03}", "ffi"),
        ("\u{FB04}", "ffl"),
    ];
    for (lig, replacement) in &ligatures {
        result = result.replace(lig, replacement);
    }

    // 3. Normalize line endings.
    result = result.replace("\r\n", "\n").replace('\r', "\n");

    // 4. Remove Unicode replacement characters left by failed decoding.
    result = result.replace('\u{FFFD}', "");

    // 5. Collapse runs of spaces/tabs and drop trailing whitespace per line.
    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"[ \t\u{00A0}]{2,}").unwrap());
    result = re_spaces.replace_all(&result, " ").to_string();

    let mut cleaned = result
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    if !cleaned.is_empty() {
        cleaned.push('\n');
    }
    cleaned
}
