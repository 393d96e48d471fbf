use mail_parser::MessageParser;
use regex::Regex;
use std::sync::LazyLock;

/// The delivery-failure phrase followed by the original recipient, optionally
/// in angle brackets and possibly on a following line.
static FAILED_PERMANENTLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)delivery\s+to\s+the\s+following\s+recipient\s+failed\s+permanently:\s*<?([A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,})>?",
    )
    .unwrap()
});

/// Returns the recipient a delivery-failure notification reports, if the
/// notification carries the permanent-failure phrase.
pub fn extract_failed_recipient(raw: &[u8]) -> Option<String> {
    if let Some(message) = MessageParser::default().parse(raw) {
        let found = message
            .parts
            .iter()
            .filter_map(|part| part.text_contents())
            .find_map(match_phrase);
        if found.is_some() {
            return found;
        }
    }
    // Unparseable or unusual structure, fall back to the raw text.
    match_phrase(&String::from_utf8_lossy(raw))
}

fn match_phrase(text: &str) -> Option<String> {
    FAILED_PERMANENTLY
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}
