//! Boundary parsing helpers: pulling option texts and a question number
//! out of raw request text before resolution.

use indexmap::IndexMap;
use regex::Regex;

use crate::dataset::Letter;

/// Extracts `A.`–`D.` option texts from raw question text.
///
/// Each option is the remainder of the line following its marker,
/// matched case-insensitively; the first occurrence per letter wins.
#[must_use]
pub fn extract_options(text: &str) -> IndexMap<Letter, String> {
    let mut options = IndexMap::new();
    for letter in Letter::ALL {
        let pattern = format!(
            r"(?i){}\.\s*([^\n]+)",
            letter.as_char().to_ascii_lowercase()
        );
        if let Some(captures) = Regex::new(&pattern).unwrap().captures(text) {
            options.insert(letter, captures[1].trim().to_string());
        }
    }
    options
}

/// Extracts a leading or tagged question number, when present.
///
/// Recognizes `Q12.`, `12:`, `#12`, and `Question 12` forms.
#[must_use]
pub fn extract_question_number(text: &str) -> Option<u32> {
    let marker = Regex::new(r"(?i)^Q(\d+)[.:]|^(\d+)[.:]|#(\d+)|Question\s+(\d+)").unwrap();
    let captures = marker.captures(text)?;
    (1..=4)
        .filter_map(|group| captures.get(group))
        .next()
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_extracted_per_letter() {
        let text = "Which code?\nA. 11400\nB. 11600\nC. 11100\nD. None of the above";
        let options = extract_options(text);
        assert_eq!(options.get(&Letter::A).unwrap(), "11400");
        assert_eq!(options.get(&Letter::D).unwrap(), "None of the above");
    }

    #[test]
    fn missing_options_are_absent() {
        let options = extract_options("Which modifier applies?");
        assert!(options.is_empty());
    }

    #[test]
    fn question_number_forms_are_recognized() {
        assert_eq!(extract_question_number("Q12. Which code?"), Some(12));
        assert_eq!(extract_question_number("7: Which code?"), Some(7));
        assert_eq!(extract_question_number("See #39 for details"), Some(39));
        assert_eq!(extract_question_number("Question 95 asks about sepsis"), Some(95));
        assert_eq!(extract_question_number("Which code?"), None);
    }
}
