//! Error taxonomy for the resolution engine.

use thiserror::Error;

/// Errors surfaced by the resolution engine.
///
/// Only invalid input is rejected; unmatched questions, missing option
/// texts, and malformed dataset entries are all absorbed before they
/// reach the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The request carried no question text.
    #[error("question text is required")]
    EmptyQuestion,
}
