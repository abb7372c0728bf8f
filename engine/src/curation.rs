//! Curated policy tables supplied to the index and resolver at
//! construction time. Both tables were assembled by hand against the
//! source exam transcription and are data, not control flow.

use crate::dataset::Letter;

/// Distinctive-substring override tying a known question to its number.
///
/// Some stored question texts were transcribed with near-duplicate
/// wording; each needle is a unique fingerprint of one known question.
/// Needles are stored lowercase because they are matched against
/// normalized text.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprint {
    /// Lowercase substring unique to the question.
    pub needle: &'static str,
    /// Question number the fingerprint resolves to.
    pub number: u32,
}

/// The curated fingerprint table checked when exact matching fails.
#[must_use]
pub fn fingerprint_overrides() -> Vec<Fingerprint> {
    const TABLE: &[(&str, u32)] = &[
        ("suspicious lesion on the floor", 1),
        ("weeks of sinus congestion", 10),
        ("functional endoscopic sinus", 20),
        ("cyst under her tongue", 39),
        ("continuous positive airway", 40),
        ("bilateral primary osteoarthritis", 46),
        ("acute sinusitis due to", 47),
        ("endometriosis", 49),
        ("abscess on her thigh", 57),
        ("migraine without aura", 67),
        ("national correct coding", 69),
        ("atopic dermatitis of the hands", 70),
        ("acute and chronic condition", 73),
        ("skin tag on her neck", 76),
        ("white patch inside hannah", 78),
        ("unspecified codes be utilized", 87),
        ("high fever and is later diagnosed with sepsis", 95),
    ];
    TABLE
        .iter()
        .map(|&(needle, number)| Fingerprint { needle, number })
        .collect()
}

/// Correction table for stored answers known to be wrong. Overrides
/// always win over the stored `correct_answer.letter`.
#[must_use]
pub fn answer_corrections() -> Vec<(u32, Letter)> {
    vec![
        (10, Letter::C),
        (20, Letter::B),
        (39, Letter::B),
        (40, Letter::A),
        (46, Letter::B),
        (47, Letter::D),
        (49, Letter::A),
        (57, Letter::A),
        (67, Letter::A),
        (69, Letter::B),
        (70, Letter::B),
        (73, Letter::A),
        (76, Letter::D),
        (78, Letter::B),
        (87, Letter::B),
        (95, Letter::B),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprints_are_lowercase_for_normalized_matching() {
        for fingerprint in fingerprint_overrides() {
            assert_eq!(fingerprint.needle, fingerprint.needle.to_lowercase());
        }
    }

    #[test]
    fn corrections_cover_known_mismatches() {
        let corrections = answer_corrections();
        assert_eq!(corrections.len(), 16);
        assert!(corrections.contains(&(39, Letter::B)));
        assert!(corrections.contains(&(76, Letter::D)));
    }
}
