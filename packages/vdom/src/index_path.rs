use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat, zero-based per-level child indices into a materialized tree.
///
/// This is the only addressing a remote consumer understands. The empty
/// index path addresses the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexPath(Vec<usize>);

impl IndexPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent indices and the last index, or `None` for the root
    pub fn split_last(&self) -> Option<(&[usize], usize)> {
        self.0
            .split_last()
            .map(|(last, parent)| (parent, *last))
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn starts_with(&self, prefix: &IndexPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl From<Vec<usize>> for IndexPath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", index)?;
        }
        f.write_str("]")
    }
}
