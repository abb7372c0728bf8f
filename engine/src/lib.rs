#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Question resolution and rationale engine for four-option
//! medical-coding exam questions.
//!
//! Raw question text flows through normalization, dataset lookup,
//! answer resolution, and rationale synthesis into a structured
//! response with a letter, answer text, explanation, and supporting
//! code references. The pipeline is pure and synchronous over an
//! immutable dataset loaded once at startup.

pub mod curation;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod explain;
pub mod index;
pub mod normalize;
pub mod parse;
pub mod reference;
pub mod resolver;
pub mod telemetry;

pub use dataset::{CodeCategory, CodeEntry, CorrectAnswer, Letter, QuestionRecord};
pub use engine::{CodingEngine, ResolveRequest, ResolveResponse};
pub use error::EngineError;
pub use index::{Confidence, MatchResult, QuestionIndex};
pub use reference::{CodeReference, CodeShape};
pub use resolver::{AnswerResolver, Resolution};
pub use telemetry::{LogLevel, Telemetry};
