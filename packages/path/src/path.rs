//! Gap-spaced hierarchical node addresses
//!
//! A path is a list of integer segments. Each segment renders as a
//! fixed-width lowercase hex number and segments are joined by `.`, e.g.
//! `000010000000.000020000000`. Fixed width is what makes the plain string
//! order of two paths equal their document (pre-order) order: a parent
//! sorts before its descendants, and siblings sort by segment value.
//!
//! Sibling slots are spaced `SLOT_GAP` apart so new siblings can be placed
//! between existing ones without renumbering anything.

use crate::error::{PathError, PathResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance between consecutive sibling slots (2^28 free slots between neighbors)
pub const SLOT_GAP: u64 = 1 << 28;

/// Exclusive upper bound of a segment value
pub const SEGMENT_LIMIT: u64 = 1 << 48;

/// Number of hex digits each segment renders with
pub const SEGMENT_WIDTH: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<u64>,
}

impl Path {
    /// The empty path. Used for the root of a tree.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn from_segments(segments: Vec<u64>) -> PathResult<Self> {
        if let Some(&segment) = segments.iter().find(|&&s| s >= SEGMENT_LIMIT) {
            return Err(PathError::SegmentOverflow { segment });
        }
        Ok(Self { segments })
    }

    /// Segment value of slot `index` for the given gap
    pub fn slot(index: usize, gap: u64) -> PathResult<u64> {
        (index as u64)
            .checked_add(1)
            .and_then(|n| n.checked_mul(gap))
            .filter(|&value| value < SEGMENT_LIMIT)
            .ok_or(PathError::SlotOverflow { index, gap })
    }

    /// Path of the `index`-th gapped slot below this one
    pub fn child(&self, index: usize) -> PathResult<Self> {
        self.with_segment(Self::slot(index, SLOT_GAP)?)
    }

    /// Append a raw segment value
    pub fn with_segment(&self, segment: u64) -> PathResult<Self> {
        if segment >= SEGMENT_LIMIT {
            return Err(PathError::SegmentOverflow { segment });
        }
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Ok(Self { segments })
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    pub fn last_segment(&self) -> Option<u64> {
        self.segments.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Strict ancestor check
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        other.segments.len() > self.segments.len() && other.segments.starts_with(&self.segments)
    }

    pub fn is_ancestor_or_self(&self, other: &Path) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True when `other` is a direct child of this path
    pub fn is_parent_of(&self, other: &Path) -> bool {
        other.segments.len() == self.segments.len() + 1 && self.is_ancestor_of(other)
    }

    /// Append a relative path
    pub fn join(&self, relative: &Path) -> Self {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(&relative.segments);
        Self { segments }
    }

    /// Remaining segments below `prefix`, if `prefix` is an ancestor or self
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Self> {
        if prefix.is_ancestor_or_self(self) {
            Some(Self {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Replace the `from` prefix with `to`
    pub fn rebase(&self, from: &Path, to: &Path) -> Option<Self> {
        self.strip_prefix(from).map(|rest| to.join(&rest))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{:0width$x}", segment, width = SEGMENT_WIDTH)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    /// Parses dotted hex segments. Short segments are accepted; display
    /// always pads back to `SEGMENT_WIDTH`.
    fn from_str(input: &str) -> PathResult<Self> {
        if input.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for raw in input.split('.') {
            if raw.is_empty() || raw.len() > SEGMENT_WIDTH {
                return Err(PathError::malformed(
                    input,
                    format!("segment '{}' must have 1 to {} hex digits", raw, SEGMENT_WIDTH),
                ));
            }
            let segment = u64::from_str_radix(raw, 16)
                .map_err(|e| PathError::malformed(input, e.to_string()))?;
            segments.push(segment);
        }

        Self::from_segments(segments)
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(value: String) -> PathResult<Self> {
        value.parse()
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path() {
        let root = Path::root();
        assert!(root.is_root());
        assert_eq!(root.depth(), 0);
        assert_eq!(root.to_string(), "");
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_child_paths_are_gapped() {
        let root = Path::root();
        assert_eq!(root.child(0).unwrap().to_string(), "000010000000");
        assert_eq!(root.child(1).unwrap().to_string(), "000020000000");

        let grandchild = root.child(0).unwrap().child(2).unwrap();
        assert_eq!(grandchild.to_string(), "000010000000.000030000000");
        assert_eq!(grandchild.depth(), 2);
    }

    #[test]
    fn test_parse_round_trip() {
        let path: Path = "000010000000.000018000000".parse().unwrap();
        assert_eq!(path.segments(), &[0x1000_0000, 0x1800_0000]);
        assert_eq!(path.to_string().parse::<Path>().unwrap(), path);

        let short: Path = "10.20".parse().unwrap();
        assert_eq!(short.segments(), &[0x10, 0x20]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("10..20".parse::<Path>(), Err(PathError::Malformed { .. })));
        assert!(matches!("xyz".parse::<Path>(), Err(PathError::Malformed { .. })));
        assert!(matches!(
            "1000000000000".parse::<Path>(),
            Err(PathError::Malformed { .. })
        ));
    }

    #[test]
    fn test_string_order_matches_path_order() {
        let root = Path::root();
        let a = root.child(0).unwrap();
        let a_child = a.child(5).unwrap();
        let b = root.child(1).unwrap();

        let mut by_path = vec![b.clone(), a_child.clone(), a.clone()];
        by_path.sort();
        let mut by_string: Vec<String> = by_path.iter().map(|p| p.to_string()).collect();
        by_string.sort();

        assert_eq!(by_path, vec![a, a_child, b]);
        assert_eq!(
            by_string,
            by_path.iter().map(|p| p.to_string()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_ancestry_and_rebase() {
        let parent = Path::root().child(0).unwrap();
        let child = parent.child(1).unwrap();
        let leaf = child.child(0).unwrap();

        assert!(parent.is_ancestor_of(&leaf));
        assert!(parent.is_parent_of(&child));
        assert!(!parent.is_parent_of(&leaf));
        assert!(!leaf.is_ancestor_of(&parent));

        let other = Path::root().child(7).unwrap();
        let moved = leaf.rebase(&parent, &other).unwrap();
        assert_eq!(moved.segments()[0], Path::slot(7, SLOT_GAP).unwrap());
        assert_eq!(&moved.segments()[1..], &leaf.segments()[1..]);
    }

    #[test]
    fn test_slot_overflow() {
        let too_many = (SEGMENT_LIMIT / SLOT_GAP) as usize;
        assert!(matches!(
            Path::root().child(too_many),
            Err(PathError::SlotOverflow { .. })
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let path = Path::root().child(0).unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"000010000000\"");
        let back: Path = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
