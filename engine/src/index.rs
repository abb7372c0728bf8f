//! Lookup over the curated question dataset: exact, curated, and
//! fuzzy matching tiers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{curation::Fingerprint, dataset::QuestionRecord, normalize::normalize};

/// Minimum share of incoming tokens that must appear in a candidate
/// before a fuzzy match is accepted. Strict: a score of exactly 0.6
/// is rejected.
const FUZZY_THRESHOLD: f32 = 0.6;

/// Tokens at or below this length are ignored by fuzzy matching.
const MIN_TOKEN_LEN: usize = 3;

/// Tier at which a question was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Matched by number or by normalized text equality.
    Exact,
    /// Matched through the curated fingerprint table.
    Curated,
    /// Matched by token overlap above the threshold.
    Fuzzy,
    /// No match; the resolver falls back to heuristics.
    None,
}

/// Per-request outcome of a question lookup. Never persisted.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    /// Matched record, when one was found.
    pub record: Option<&'a QuestionRecord>,
    /// Tier the match was found at.
    pub confidence: Confidence,
}

impl MatchResult<'_> {
    fn none() -> Self {
        Self {
            record: None,
            confidence: Confidence::None,
        }
    }
}

/// Read-only index over the curated question dataset.
///
/// Holds the records for the lifetime of the process; lookups never
/// fail and never mutate shared state, so any number of them may run
/// concurrently.
#[derive(Debug)]
pub struct QuestionIndex {
    records: Vec<QuestionRecord>,
    normalized: Vec<String>,
    by_number: HashMap<u32, usize>,
    fingerprints: Vec<Fingerprint>,
}

impl QuestionIndex {
    /// Builds the index from loaded records and the curated
    /// fingerprint table.
    #[must_use]
    pub fn new(records: Vec<QuestionRecord>, fingerprints: Vec<Fingerprint>) -> Self {
        let normalized = records
            .iter()
            .map(|record| normalize(&record.question))
            .collect();
        let by_number = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.number, position))
            .collect();
        Self {
            records,
            normalized,
            by_number,
            fingerprints,
        }
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a question by number and by its question-only text.
    ///
    /// Stages run in fixed order: direct number lookup, normalized
    /// exact text equality, curated fingerprint substrings, fuzzy
    /// token overlap. Absence of a match is not an error.
    #[must_use]
    pub fn lookup(&self, question_text: &str, number: Option<u32>) -> MatchResult<'_> {
        if let Some(number) = number {
            if let Some(&position) = self.by_number.get(&number) {
                return MatchResult {
                    record: Some(&self.records[position]),
                    confidence: Confidence::Exact,
                };
            }
        }
        if self.records.is_empty() {
            return MatchResult::none();
        }

        let incoming = normalize(question_text);
        for (position, stored) in self.normalized.iter().enumerate() {
            if *stored == incoming {
                return MatchResult {
                    record: Some(&self.records[position]),
                    confidence: Confidence::Exact,
                };
            }
        }

        for fingerprint in &self.fingerprints {
            if incoming.contains(fingerprint.needle) {
                if let Some(&position) = self.by_number.get(&fingerprint.number) {
                    return MatchResult {
                        record: Some(&self.records[position]),
                        confidence: Confidence::Curated,
                    };
                }
            }
        }

        self.fuzzy_lookup(&incoming)
    }

    /// Scores every record by the share of incoming tokens it contains
    /// and keeps the earliest strict maximum above the threshold.
    fn fuzzy_lookup(&self, incoming: &str) -> MatchResult<'_> {
        let tokens: Vec<String> = incoming
            .split(' ')
            .filter(|word| word.len() > MIN_TOKEN_LEN)
            .map(|word| {
                word.chars()
                    .filter(|c| c.is_alphanumeric() || *c == '_')
                    .collect()
            })
            .collect();
        if tokens.is_empty() {
            return MatchResult::none();
        }

        let mut best: Option<usize> = None;
        let mut best_score = 0.0_f32;
        for (position, stored) in self.normalized.iter().enumerate() {
            let hits = tokens
                .iter()
                .filter(|token| stored.contains(token.as_str()))
                .count();
            #[allow(clippy::cast_precision_loss)]
            let score = hits as f32 / tokens.len() as f32;
            if score > best_score && score > FUZZY_THRESHOLD {
                best = Some(position);
                best_score = score;
            }
        }

        match best {
            Some(position) => MatchResult {
                record: Some(&self.records[position]),
                confidence: Confidence::Fuzzy,
            },
            None => MatchResult::none(),
        }
    }
}
