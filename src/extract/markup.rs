//! Plain text to paragraph markup.
//!
//! Paragraphs are separated by blank lines; lines inside a paragraph are
//! soft-wrapped and get joined with a single space.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Split plain text into normalized, non-empty paragraphs.
pub fn render_paragraphs(text: &str) -> Vec<String> {
    let text = text.replace("\r\n", "\n");
    BLANK_LINE
        .split(&text)
        .map(collapse_whitespace)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Collapse runs of whitespace to one space and trim the ends.
///
/// Characters XML 1.0 forbids are dropped on the way.
pub fn collapse_whitespace(text: &str) -> String {
    let text = strip_illegal_xml(text);
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Remove characters that may not appear anywhere in an XML 1.0 document:
/// C0 controls other than tab, newline and carriage return, plus the
/// U+FFFE and U+FFFF noncharacters.
pub fn strip_illegal_xml(text: &str) -> String {
    text.chars().filter(|&c| is_xml_char(c)).collect()
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Wrap every paragraph in its own `<p>` element, escaping the text.
pub fn to_markup<I, S>(paragraphs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paragraphs
        .into_iter()
        .map(|p| format!("<p>{}</p>", escape(p.as_ref())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// XML-escape text for use in element content or attribute values.
pub fn escape(text: &str) -> String {
    quick_xml::escape::escape(&strip_illegal_xml(text)).into_owned()
}
