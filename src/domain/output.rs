use serde::Deserialize;

/// Structured result of one successful turn: the generated source, a short
/// explanation, and the file name the model proposed for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeOutput {
    pub code: String,
    pub description: String,
    pub filename: String,
}
