use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::{json, Value};
use uuid::Uuid;

use medicode_engine::{
    dataset, parse, CodeCategory, CodeEntry, CodingEngine, Letter, ResolveRequest, Telemetry,
};

#[derive(Parser, Debug)]
#[command(name = "medicode", version, about = "Medical-coding exam answer engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolves a single question and prints the structured answer.
    Ask {
        /// Question text; read from --file when omitted.
        question: Option<String>,
        /// File containing the question text.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Question number, overriding any number found in the text.
        #[arg(long)]
        number: Option<u32>,
        #[arg(long, default_value = "data/question_and_answers.json")]
        questions: PathBuf,
        #[arg(long, default_value = "data/codes.json")]
        codes: PathBuf,
        /// JSON-lines telemetry output path.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Resolves a JSON array of dataset-format questions.
    Bulk {
        /// Input file holding the question array.
        input: PathBuf,
        #[arg(long, default_value = "data/question_and_answers.json")]
        questions: PathBuf,
        #[arg(long, default_value = "data/codes.json")]
        codes: PathBuf,
        #[arg(long)]
        log: Option<PathBuf>,
        /// Writes results to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Searches the code dictionary.
    Codes {
        /// Substring matched against code values and descriptions.
        query: String,
        /// Category filter: ICD-10, CPT, or HCPCS.
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long, default_value = "data/codes.json")]
        codes: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Ask {
            question,
            file,
            number,
            questions,
            codes,
            log,
        } => handle_ask(question, file, number, &questions, &codes, log),
        Commands::Bulk {
            input,
            questions,
            codes,
            log,
            out,
        } => handle_bulk(&input, &questions, &codes, log, out),
        Commands::Codes {
            query,
            category,
            limit,
            codes,
        } => handle_codes(&query, category.as_deref(), limit, &codes),
    }
}

fn handle_ask(
    question: Option<String>,
    file: Option<PathBuf>,
    number: Option<u32>,
    questions: &PathBuf,
    codes: &PathBuf,
    log: Option<PathBuf>,
) -> Result<()> {
    let text = match (question, file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            fs::read_to_string(&path).with_context(|| format!("reading {path:?}"))?
        }
        (None, None) => anyhow::bail!("provide question text or --file"),
    };

    let engine = load_engine(questions, codes, log)?;
    let request = ResolveRequest {
        question_text: text.clone(),
        options: parse::extract_options(&text),
        question_number: number.or_else(|| parse::extract_question_number(&text)),
    };
    let response = engine.resolve(&request)?;

    let output = json!({
        "request_id": Uuid::new_v4(),
        "question": preview(&text),
        "answer": response.answer,
        "answerText": response.answer_text,
        "explanation": response.explanation,
        "codeReferences": response.code_references,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_bulk(
    input: &PathBuf,
    questions: &PathBuf,
    codes: &PathBuf,
    log: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let data = fs::read_to_string(input).with_context(|| format!("reading {input:?}"))?;
    let entries: Vec<Value> =
        serde_json::from_str(&data).with_context(|| format!("parsing {input:?}"))?;
    let engine = load_engine(questions, codes, log)?;

    let mut results = Vec::new();
    for entry in &entries {
        let text = entry["question"].as_str().unwrap_or("");
        let number = entry["number"]
            .as_u64()
            .or_else(|| entry["question_number"].as_u64())
            .and_then(|n| u32::try_from(n).ok());
        let options = entry_options(entry);
        let request = ResolveRequest {
            question_text: text.to_string(),
            options,
            question_number: number,
        };
        let result = match engine.resolve(&request) {
            Ok(response) => json!({
                "question_number": number,
                "question": preview(text),
                "answer": response.answer,
                "answerText": response.answer_text,
                "explanation": response.explanation,
                "codeReferences": response.code_references,
            }),
            Err(err) => json!({
                "question_number": number,
                "question": preview(text),
                "error": err.to_string(),
            }),
        };
        results.push(result);
    }

    let summary = json!({
        "results": results,
        "processedQuestions": results.len(),
        "totalQuestions": entries.len(),
    });
    let rendered = serde_json::to_string_pretty(&summary)?;
    match out {
        Some(path) => {
            fs::write(&path, rendered).with_context(|| format!("writing {path:?}"))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn handle_codes(
    query: &str,
    category: Option<&str>,
    limit: usize,
    codes: &PathBuf,
) -> Result<()> {
    // Dictionary search needs no question dataset.
    let engine = CodingEngine::with_defaults(Vec::new(), load_dictionary(codes)?, None);
    let category = match category {
        None => None,
        Some("all") => None,
        Some(value) => Some(parse_category(value)?),
    };
    let hits = engine.search_codes(query, category, limit);
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

fn load_engine(
    questions: &PathBuf,
    codes: &PathBuf,
    log: Option<PathBuf>,
) -> Result<CodingEngine> {
    let records = if questions.exists() {
        dataset::load_questions(questions)?
    } else {
        eprintln!("warning: questions file {questions:?} not found; matching is disabled");
        Vec::new()
    };
    let dictionary = load_dictionary(codes)?;
    let telemetry = match log {
        Some(path) => Some(Telemetry::new("medicode", path)?),
        None => None,
    };
    Ok(CodingEngine::with_defaults(records, dictionary, telemetry))
}

/// Builtin seed entries plus the codes file, when it exists.
fn load_dictionary(codes: &Path) -> Result<Vec<CodeEntry>> {
    let mut dictionary = dataset::builtin_codes();
    if codes.exists() {
        dictionary.extend(dataset::load_codes(codes)?);
    } else {
        eprintln!("warning: codes file {codes:?} not found; code lookup will be limited");
    }
    Ok(dictionary)
}

/// Options for one bulk entry, from `options` or, failing that, from
/// `correct_answer.options`.
fn entry_options(entry: &Value) -> IndexMap<Letter, String> {
    let source = entry["options"]
        .as_object()
        .or_else(|| entry["correct_answer"]["options"].as_object());
    let mut options = IndexMap::new();
    if let Some(map) = source {
        for (key, value) in map {
            let letter = key.chars().next().and_then(Letter::from_char);
            if let (Some(letter), Some(text)) = (letter, value.as_str()) {
                options.insert(letter, text.to_string());
            }
        }
    }
    options
}

fn parse_category(value: &str) -> Result<CodeCategory> {
    match value.to_uppercase().as_str() {
        "ICD-10" | "ICD10" | "ICD" => Ok(CodeCategory::Icd10),
        "CPT" => Ok(CodeCategory::Cpt),
        "HCPCS" => Ok(CodeCategory::Hcpcs),
        other => anyhow::bail!("unknown category: {other}"),
    }
}

fn preview(text: &str) -> String {
    let mut shortened: String = text.chars().take(100).collect();
    if text.chars().count() > 100 {
        shortened.push_str("...");
    }
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dictionary_merges_builtin_and_file_codes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codes.json");
        let payload = json!([
            { "code": "I10", "description": "Essential (primary) hypertension", "category": "ICD-10" }
        ]);
        fs::write(&path, serde_json::to_vec(&payload).unwrap()).unwrap();

        let dictionary = load_dictionary(&path).unwrap();
        assert!(dictionary.iter().any(|entry| entry.code == "I10"));
        assert!(dictionary.iter().any(|entry| entry.code == "99213"));
    }

    #[test]
    fn missing_codes_file_falls_back_to_builtin_entries() {
        let dir = tempdir().unwrap();
        let dictionary = load_dictionary(&dir.path().join("absent.json")).unwrap();
        assert_eq!(dictionary.len(), dataset::builtin_codes().len());
    }

    #[test]
    fn bulk_entries_take_options_from_either_location() {
        let entry = json!({ "options": { "A": "I10", "B": "E11.9" } });
        let options = entry_options(&entry);
        assert_eq!(options.get(&Letter::A).unwrap(), "I10");
        assert_eq!(options.get(&Letter::B).unwrap(), "E11.9");

        let nested = json!({ "correct_answer": { "options": { "C": "J1040" } } });
        let options = entry_options(&nested);
        assert_eq!(options.get(&Letter::C).unwrap(), "J1040");
    }

    #[test]
    fn categories_parse_case_insensitively() {
        assert_eq!(parse_category("icd-10").unwrap(), CodeCategory::Icd10);
        assert_eq!(parse_category("cpt").unwrap(), CodeCategory::Cpt);
        assert_eq!(parse_category("HCPCS").unwrap(), CodeCategory::Hcpcs);
        assert!(parse_category("DRG").is_err());
    }

    #[test]
    fn preview_truncates_long_text() {
        let text = "x".repeat(120);
        let shortened = preview(&text);
        assert!(shortened.ends_with("..."));
        assert_eq!(shortened.chars().count(), 103);
        assert_eq!(preview("short"), "short");
    }
}
