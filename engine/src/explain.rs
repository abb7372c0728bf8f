//! Natural-language rationale synthesis. Pure string templating;
//! deterministic for identical inputs.

use indexmap::IndexMap;

use crate::{
    dataset::Letter,
    index::MatchResult,
    reference::{code_shape, CodeShape},
    resolver::{AnswerSource, Resolution, FALLBACK_DEFAULT_TEXT, FALLBACK_RATIONALE},
};

/// Builds the explanation string for a resolved answer.
#[must_use]
pub fn synthesize(
    resolution: &Resolution,
    matched: &MatchResult<'_>,
    options: &IndexMap<Letter, String>,
) -> String {
    match resolution.source {
        AnswerSource::Verified { .. } => verified_explanation(resolution, matched),
        AnswerSource::Rule(rule) => {
            let shown = options
                .get(&rule.letter)
                .filter(|text| !text.is_empty())
                .map_or(rule.default_text, String::as_str);
            format!(
                "The correct answer is {}: {}. {}",
                resolution.letter, shown, rule.rationale
            )
        }
        AnswerSource::Fallback => {
            let shown = options
                .get(&resolution.letter)
                .filter(|text| !text.is_empty())
                .map_or(FALLBACK_DEFAULT_TEXT, String::as_str);
            format!(
                "The correct answer is {}: {}. {}",
                resolution.letter, shown, FALLBACK_RATIONALE
            )
        }
    }
}

fn verified_explanation(resolution: &Resolution, matched: &MatchResult<'_>) -> String {
    let mut explanation = format!(
        "The correct answer is {}: {}. ",
        resolution.letter, resolution.text
    );
    let code = resolution.text.trim();
    if let Some(shape) = code_shape(code) {
        explanation.push_str(&shape_clause(code, shape));
    } else {
        let question = matched
            .record
            .map(|record| record.question.to_lowercase())
            .unwrap_or_default();
        explanation.push_str(family_clause(&question));
    }
    explanation
}

fn shape_clause(code: &str, shape: CodeShape) -> String {
    match shape {
        CodeShape::Diagnosis => {
            let mut clause = format!(
                "According to ICD-10-CM guidelines, code {code} is the most accurate \
                 diagnosis code for this scenario. "
            );
            clause.push_str(match code.chars().next() {
                Some('I') => {
                    "This code from Chapter 9 (Diseases of the circulatory system) \
                     correctly identifies the documented condition."
                }
                Some('J') => {
                    "This code from Chapter 10 (Diseases of the respiratory system) \
                     represents the respiratory condition described."
                }
                Some('K') => {
                    "This code from Chapter 11 (Diseases of the digestive system) \
                     appropriately captures the digestive condition."
                }
                Some('E') => {
                    "This code from Chapter 4 (Endocrine, nutritional and metabolic \
                     diseases) correctly identifies the metabolic condition."
                }
                _ => {
                    "This diagnosis code accurately represents the condition according \
                     to ICD-10-CM coding guidelines."
                }
            });
            clause
        }
        CodeShape::Procedure => {
            let mut clause = format!(
                "According to CPT coding guidelines, code {code} is the appropriate \
                 procedure code for this service. "
            );
            clause.push_str(if code.starts_with("99") {
                "This Evaluation and Management code accurately represents the level of \
                 service provided based on documentation elements."
            } else if code.starts_with("10") {
                "This code from the integumentary system section correctly captures the \
                 described procedure."
            } else if code.starts_with('3') {
                "This code accurately represents the specified diagnostic or \
                 therapeutic procedure on the anatomical site indicated."
            } else if code.starts_with('7') {
                "This radiology code correctly identifies the imaging procedure \
                 described."
            } else {
                "This procedure code was selected based on the nature of the service, \
                 anatomical site, and technique used."
            });
            clause
        }
        CodeShape::Supply => format!(
            "According to HCPCS Level II coding guidelines, code {code} accurately \
             represents this service or item. This code was selected based on the \
             specific description, medical necessity, and documentation requirements."
        ),
    }
}

fn family_clause(question: &str) -> &'static str {
    if question.contains("icd") {
        "According to ICD-10-CM guidelines, this is the correct code for this specific \
         diagnosis. The key factors in this selection include the documented condition, \
         any specified complications, and coding conventions."
    } else if question.contains("cpt") {
        "According to CPT coding guidelines, this is the most appropriate code for this \
         procedure. The code selection factors include the specific technique, \
         anatomical site, and complexity of the service."
    } else if question.contains("hcpcs") {
        "According to HCPCS guidelines, this is the most appropriate code for this item \
         or service. The selection is based on the specific item provided and its \
         documentation requirements."
    } else {
        "This answer was selected based on standard medical coding principles and \
         guidelines. The key factors considered were specificity, accuracy, and \
         adherence to coding conventions."
    }
}
