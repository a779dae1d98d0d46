use anticipate_path::{Path, PathError};
use thiserror::Error;

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Invalid binding '{source_text}': {reason}")]
    InvalidBinding { source_text: String, reason: String },

    #[error("Invalid condition '{source_text}' at {offset}: {reason}")]
    InvalidCondition {
        source_text: String,
        offset: usize,
        reason: String,
    },

    #[error("Format '{format}' uses {slots} slots but has {bindings} bindings")]
    SlotMismatch {
        format: String,
        slots: usize,
        bindings: usize,
    },

    #[error("Invalid format '{format}': {reason}")]
    InvalidFormat { format: String, reason: String },

    #[error("Invalid fragment at '{path}': {reason}")]
    InvalidFragment { path: Path, reason: String },

    #[error("No template registered for '{key}'")]
    UnknownTemplate { key: String },

    #[error("Template '{key}' sits inside a loop and needs the loop's item scope")]
    LoopScoped { key: String },

    #[error("Failed to read template artifact: {0}")]
    Artifact(String),

    #[error(transparent)]
    Path(#[from] PathError),
}

impl TemplateError {
    pub fn invalid_fragment(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidFragment {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TemplateError {
    fn from(err: serde_json::Error) -> Self {
        TemplateError::Artifact(err.to_string())
    }
}
