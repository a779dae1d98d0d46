use crate::Path;
use thiserror::Error;

pub type PathResult<T> = Result<T, PathError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Malformed path '{input}': {reason}")]
    Malformed { input: String, reason: String },

    #[error("Segment {segment:#x} is outside the addressable range")]
    SegmentOverflow { segment: u64 },

    #[error("Slot {index} does not fit under the segment limit with gap {gap:#x}")]
    SlotOverflow { index: usize, gap: u64 },

    #[error("Paths are not ordered: '{left}' must sort before '{right}'")]
    Unordered { left: Path, right: Path },

    #[error("No gap left between '{left}' and '{right}'")]
    GapExhausted { left: Path, right: Path },

    #[error("Path '{path}' is already allocated")]
    Collision { path: Path },

    #[error("Path '{path}' is not a live child of '{parent}'")]
    NotAChild { path: Path, parent: Path },
}

impl PathError {
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
