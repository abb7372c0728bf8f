//! The resolution context object and its boundary request/response
//! types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    curation::{answer_corrections, fingerprint_overrides, Fingerprint},
    dataset::{CodeCategory, CodeEntry, Letter, QuestionRecord},
    error::EngineError,
    explain,
    index::QuestionIndex,
    normalize::question_only,
    parse::{extract_options, extract_question_number},
    reference::{extract_references, CodeReference},
    resolver::AnswerResolver,
    telemetry::{LogLevel, Telemetry},
};

/// Resolution request consumed from the HTTP/CLI boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    /// Raw question text, required and non-empty.
    pub question_text: String,
    /// Option texts already extracted by the caller, possibly partial.
    #[serde(default)]
    pub options: IndexMap<Letter, String>,
    /// Question number, when the caller knows it.
    #[serde(default)]
    pub question_number: Option<u32>,
}

/// Structured result returned to the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    /// Resolved answer letter.
    pub answer: Letter,
    /// Resolved answer text.
    pub answer_text: String,
    /// Natural-language rationale.
    pub explanation: String,
    /// Supporting code citations, always at least two.
    pub code_references: Vec<CodeReference>,
}

/// Immutable resolution context built once at startup and shared by
/// reference across requests.
///
/// Every operation is pure and synchronous over the read-only dataset,
/// so concurrent resolutions need no coordination.
#[derive(Debug)]
pub struct CodingEngine {
    index: QuestionIndex,
    codes: Vec<CodeEntry>,
    resolver: AnswerResolver,
    telemetry: Option<Telemetry>,
}

impl CodingEngine {
    /// Builds an engine from loaded datasets and explicit policy
    /// tables.
    #[must_use]
    pub fn new(
        questions: Vec<QuestionRecord>,
        codes: Vec<CodeEntry>,
        fingerprints: Vec<Fingerprint>,
        corrections: Vec<(u32, Letter)>,
        telemetry: Option<Telemetry>,
    ) -> Self {
        Self {
            index: QuestionIndex::new(questions, fingerprints),
            codes,
            resolver: AnswerResolver::new(corrections),
            telemetry,
        }
    }

    /// Builds an engine with the curated fingerprint and correction
    /// tables.
    #[must_use]
    pub fn with_defaults(
        questions: Vec<QuestionRecord>,
        codes: Vec<CodeEntry>,
        telemetry: Option<Telemetry>,
    ) -> Self {
        Self::new(
            questions,
            codes,
            fingerprint_overrides(),
            answer_corrections(),
            telemetry,
        )
    }

    /// Resolves one request into a complete response.
    ///
    /// Rejects empty question text; every other input terminates with
    /// a letter, an explanation, and at least two code references.
    pub fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse, EngineError> {
        if request.question_text.trim().is_empty() {
            return Err(EngineError::EmptyQuestion);
        }
        let request_id = Uuid::new_v4();
        let question_part = question_only(&request.question_text);
        let matched = self.index.lookup(question_part, request.question_number);
        if let Some(telemetry) = &self.telemetry {
            let _ = telemetry.log(
                LogLevel::Info,
                "engine.lookup",
                json!({
                    "request_id": request_id,
                    "confidence": matched.confidence,
                    "question_number": matched.record.map(|record| record.number),
                }),
            );
        }

        let resolution = self
            .resolver
            .resolve(&matched, &request.options, &request.question_text);
        let explanation = explain::synthesize(&resolution, &matched, &request.options);
        let code_references = extract_references(&resolution, &matched, &self.codes);
        if let Some(telemetry) = &self.telemetry {
            let _ = telemetry.log(
                LogLevel::Info,
                "engine.resolved",
                json!({
                    "request_id": request_id,
                    "answer": resolution.letter,
                    "source": resolution.source_label(),
                    "references": code_references.len(),
                }),
            );
        }

        Ok(ResolveResponse {
            answer: resolution.letter,
            answer_text: resolution.text,
            explanation,
            code_references,
        })
    }

    /// Resolves raw text, extracting options and a question number
    /// from it first.
    pub fn resolve_text(&self, raw: &str) -> Result<ResolveResponse, EngineError> {
        let request = ResolveRequest {
            question_text: raw.to_string(),
            options: extract_options(raw),
            question_number: extract_question_number(raw),
        };
        self.resolve(&request)
    }

    /// Searches the code dictionary by case-insensitive substring on
    /// code or description, optionally filtered by category.
    #[must_use]
    pub fn search_codes(
        &self,
        query: &str,
        category: Option<CodeCategory>,
        limit: usize,
    ) -> Vec<&CodeEntry> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.codes
            .iter()
            .filter(|entry| {
                let matches_query = entry.code.to_lowercase().contains(&needle)
                    || entry.description.to_lowercase().contains(&needle);
                let matches_category =
                    category.map_or(true, |wanted| entry.category == wanted);
                matches_query && matches_category
            })
            .take(limit)
            .collect()
    }

    /// Number of indexed question records.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.index.len()
    }

    /// Number of dictionary entries.
    #[must_use]
    pub fn code_count(&self) -> usize {
        self.codes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CorrectAnswer;

    fn record(number: u32, question: &str, letter: Letter, text: &str) -> QuestionRecord {
        QuestionRecord {
            number,
            question: question.into(),
            options: IndexMap::new(),
            correct_answer: CorrectAnswer {
                letter,
                text: text.into(),
                options: IndexMap::new(),
            },
        }
    }

    fn engine() -> CodingEngine {
        let questions = vec![
            record(
                3,
                "Which ICD-10-CM code reports essential hypertension?",
                Letter::A,
                "I10",
            ),
            record(
                39,
                "Maria has a cyst under her tongue removed with closure.",
                Letter::A,
                "41113",
            ),
        ];
        let codes = vec![CodeEntry {
            code: "I10".into(),
            description: "Essential (primary) hypertension".into(),
            category: CodeCategory::Icd10,
        }];
        CodingEngine::with_defaults(questions, codes, None)
    }

    #[test]
    fn empty_question_is_rejected() {
        let request = ResolveRequest {
            question_text: "   \n ".into(),
            options: IndexMap::new(),
            question_number: None,
        };
        assert_eq!(engine().resolve(&request), Err(EngineError::EmptyQuestion));
    }

    #[test]
    fn exact_match_resolves_verified_answer() {
        let response = engine()
            .resolve_text("Which ICD-10-CM code reports  essential HYPERTENSION?")
            .unwrap();
        assert_eq!(response.answer, Letter::A);
        assert_eq!(response.answer_text, "I10");
        assert!(response.explanation.contains("circulatory system"));
        assert!(response.code_references.len() >= 2);
    }

    #[test]
    fn correction_table_wins_over_stored_answer() {
        let request = ResolveRequest {
            question_text: "anything".into(),
            options: IndexMap::new(),
            question_number: Some(39),
        };
        let response = engine().resolve(&request).unwrap();
        // Stored letter is A; the correction table maps 39 to B.
        assert_eq!(response.answer, Letter::B);
    }

    #[test]
    fn fingerprint_carries_unfamiliar_wording_to_the_right_record() {
        let response = engine()
            .resolve_text("The patient presents with a cyst under her tongue today.")
            .unwrap();
        assert_eq!(response.answer, Letter::B);
    }

    #[test]
    fn unmatched_diabetes_question_uses_the_icd_rule() {
        let response = engine()
            .resolve_text("Which ICD-10 code reports gestational diabetes screening?")
            .unwrap();
        assert_eq!(response.answer, Letter::A);
        let codes: Vec<&str> = response
            .code_references
            .iter()
            .map(|reference| reference.code.as_str())
            .collect();
        assert!(codes.contains(&"E10.9"));
        assert!(codes.contains(&"E11.9"));
    }

    #[test]
    fn resolution_is_deterministic_across_calls() {
        let engine = engine();
        let raw = "Q77. Which modifier is appended for a distinct procedural service?\n\
                   A. Modifier 59\nB. Modifier 25\nC. Modifier 51\nD. Modifier 76";
        let first = engine.resolve_text(raw).unwrap();
        let second = engine.resolve_text(raw).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn options_extracted_from_raw_text_feed_the_answer_text() {
        let raw = "Which ICD-10 code reports uncontrolled diabetes?\n\
                   A. E10.65\nB. I10\nC. J45.901\nD. K21.9";
        let response = engine().resolve_text(raw).unwrap();
        assert_eq!(response.answer, Letter::A);
        assert_eq!(response.answer_text, "E10.65");
    }

    #[test]
    fn code_search_filters_by_category() {
        let engine = engine();
        let hits = engine.search_codes("hypertension", Some(CodeCategory::Icd10), 50);
        assert_eq!(hits.len(), 1);
        assert!(engine
            .search_codes("hypertension", Some(CodeCategory::Cpt), 50)
            .is_empty());
        assert!(engine.search_codes("", None, 50).is_empty());
    }
}
