use crate::index_path::IndexPath;
use anticipate_path::{Path, PathError};
use thiserror::Error;

pub type VdomResult<T> = Result<T, VdomError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VdomError {
    #[error("Tree depth {depth} exceeds maximum {max}")]
    TreeTooDeep { depth: usize, max: usize },

    #[error("Tree has {nodes} nodes, maximum is {max}")]
    TreeTooLarge { nodes: usize, max: usize },

    #[error("Element '{path}' has {count} children, maximum is {max}")]
    TooManyChildren { path: Path, count: usize, max: usize },

    #[error("Attribute '{name}' on '{path}' is {length} bytes, maximum is {max}")]
    AttributeTooLong {
        path: Path,
        name: String,
        length: usize,
        max: usize,
    },

    #[error("Text at '{path}' is {length} bytes, maximum is {max}")]
    TextTooLong { path: Path, length: usize, max: usize },

    #[error("Node '{child}' is not a direct child of '{parent}'")]
    MisplacedChild { parent: Path, child: Path },

    #[error("Children of '{parent}' are out of order: '{left}' must sort before '{right}'")]
    UnorderedSiblings { parent: Path, left: Path, right: Path },

    /// The path is not part of the tree; the caller's structural version is stale
    #[error("Path '{path}' not found in tree")]
    PathNotFound { path: Path },

    #[error("Patch at {index_path} cannot be applied: {reason}")]
    InvalidPatch { index_path: IndexPath, reason: String },

    #[error(transparent)]
    Path(#[from] PathError),
}

impl VdomError {
    pub fn invalid_patch(index_path: &IndexPath, reason: impl Into<String>) -> Self {
        Self::InvalidPatch {
            index_path: index_path.clone(),
            reason: reason.into(),
        }
    }
}
