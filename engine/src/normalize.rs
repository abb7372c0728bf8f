//! Text canonicalization applied before any comparison.

use regex::Regex;

/// Normalizes whitespace and lowercases content.
///
/// Applied to both stored and incoming question text before any
/// comparison, so line breaks, capitalization, and run-on spaces never
/// block an exact match.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut normalized = text.trim().to_lowercase();
    normalized = normalized.replace('\n', " ");
    Regex::new(r"\s+")
        .unwrap()
        .replace_all(&normalized, " ")
        .trim()
        .to_string()
}

/// Returns the question-only portion of raw input: everything before
/// the first `A.`/`a.` option marker.
#[must_use]
pub fn question_only(text: &str) -> &str {
    match Regex::new(r"[Aa]\.").unwrap().find(text) {
        Some(marker) => text[..marker.start()].trim(),
        None => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_reduces_whitespace() {
        let result = normalize("Which  CODE\napplies\t here? ");
        assert_eq!(result, "which code applies here?");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("  A\n\nPatient   presents WITH fever ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn question_only_stops_at_first_option_marker() {
        let text = "Which code is reported?\nA. 11400\nB. 11600";
        assert_eq!(question_only(text), "Which code is reported?");
    }

    #[test]
    fn question_only_without_markers_returns_trimmed_input() {
        assert_eq!(question_only("  no options here  "), "no options here");
    }
}
