//! Question records, the code dictionary, and JSON dataset loading.

use std::{fmt, fs, path::Path};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Answer option letter. Every resolved answer is one of these four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Letter {
    /// Option A.
    A,
    /// Option B.
    B,
    /// Option C.
    C,
    /// Option D.
    D,
}

impl Letter {
    /// All letters in presentation order.
    pub const ALL: [Self; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Returns the uppercase character for this letter.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    /// Parses a letter from a character, case-insensitively.
    #[must_use]
    pub fn from_char(value: char) -> Option<Self> {
        match value.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Verified answer stored with a question record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectAnswer {
    /// Stored answer letter.
    pub letter: Letter,
    /// Stored answer text, possibly empty.
    #[serde(default)]
    pub text: String,
    /// Option texts transcribed alongside the answer, when present.
    #[serde(default)]
    pub options: IndexMap<Letter, String>,
}

/// A curated, pre-verified exam question. Immutable after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Question number within the source exam.
    pub number: u32,
    /// Full question text as transcribed.
    pub question: String,
    /// Option texts keyed by letter, when transcribed.
    #[serde(default)]
    pub options: IndexMap<Letter, String>,
    /// Verified answer for the question.
    pub correct_answer: CorrectAnswer,
}

/// Code system a dictionary entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeCategory {
    /// ICD-10-CM diagnosis codes.
    #[serde(rename = "ICD-10")]
    Icd10,
    /// CPT procedure codes.
    #[serde(rename = "CPT")]
    Cpt,
    /// HCPCS Level II supply/service codes.
    #[serde(rename = "HCPCS")]
    Hcpcs,
}

impl fmt::Display for CodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Icd10 => "ICD-10",
            Self::Cpt => "CPT",
            Self::Hcpcs => "HCPCS",
        };
        write!(f, "{label}")
    }
}

/// Entry in the read-only code dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntry {
    /// Code value, e.g. `E11.9` or `99213`.
    pub code: String,
    /// Official short description.
    pub description: String,
    /// Owning code system.
    pub category: CodeCategory,
}

/// Seed dictionary entries available even without a codes file.
#[must_use]
pub fn builtin_codes() -> Vec<CodeEntry> {
    vec![
        CodeEntry {
            code: "E11.9".into(),
            description: "Type 2 diabetes mellitus without complications".into(),
            category: CodeCategory::Icd10,
        },
        CodeEntry {
            code: "99213".into(),
            description: "Office visit, established patient, low to moderate complexity".into(),
            category: CodeCategory::Cpt,
        },
        CodeEntry {
            code: "J12.82".into(),
            description: "Pneumonia due to coronavirus disease 2019".into(),
            category: CodeCategory::Icd10,
        },
    ]
}

/// Loads question records from a JSON array file.
///
/// Entries missing required fields are skipped silently; the engine
/// only ever sees well-formed records.
pub fn load_questions(path: &Path) -> Result<Vec<QuestionRecord>> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(&data).with_context(|| format!("parsing {path:?}"))?;
    Ok(raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Loads code dictionary entries from a JSON array file, skipping
/// malformed elements the same way [`load_questions`] does.
pub fn load_codes(path: &Path) -> Result<Vec<CodeEntry>> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    let raw: Vec<serde_json::Value> =
        serde_json::from_str(&data).with_context(|| format!("parsing {path:?}"))?;
    Ok(raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn letters_round_trip_as_map_keys() {
        let mut options = IndexMap::new();
        options.insert(Letter::A, "I10".to_string());
        options.insert(Letter::D, "I15.0".to_string());
        let encoded = serde_json::to_string(&options).unwrap();
        let decoded: IndexMap<Letter, String> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, options);
    }

    #[test]
    fn loader_skips_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        let payload = json!([
            {
                "number": 12,
                "question": "Which ICD-10 code reports essential hypertension?",
                "correct_answer": { "letter": "A", "text": "I10" }
            },
            { "question": "missing number and answer" },
            { "number": 13 }
        ]);
        fs::write(&path, serde_json::to_vec(&payload).unwrap()).unwrap();

        let records = load_questions(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, 12);
        assert_eq!(records[0].correct_answer.letter, Letter::A);
    }

    #[test]
    fn code_loader_parses_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.json");
        let payload = json!([
            { "code": "I10", "description": "Essential (primary) hypertension", "category": "ICD-10" },
            { "code": "99213", "description": "Office visit", "category": "CPT" },
            { "code": "J1040", "description": "Methylprednisolone injection", "category": "BOGUS" }
        ]);
        fs::write(&path, serde_json::to_vec(&payload).unwrap()).unwrap();

        let codes = load_codes(&path).unwrap();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].category, CodeCategory::Icd10);
        assert_eq!(codes[1].category, CodeCategory::Cpt);
    }
}
