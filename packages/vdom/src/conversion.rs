//! Path Conversion: sparse hierarchical paths to flat index paths.
//!
//! At each level the index of a node is the number of non-Null siblings
//! before it. A Null node itself converts to [`Conversion::Absent`].

use crate::error::{VdomError, VdomResult};
use crate::index_path::IndexPath;
use crate::vnode::VNode;
use anticipate_path::Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a path lands in the materialized tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<IndexPath>", into = "Option<IndexPath>")]
pub enum Conversion {
    At(IndexPath),
    /// The node exists but currently renders nothing
    Absent,
}

impl Conversion {
    pub fn index_path(&self) -> Option<&IndexPath> {
        match self {
            Conversion::At(index_path) => Some(index_path),
            Conversion::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Conversion::Absent)
    }
}

impl From<Option<IndexPath>> for Conversion {
    fn from(value: Option<IndexPath>) -> Self {
        value.map_or(Conversion::Absent, Conversion::At)
    }
}

impl From<Conversion> for Option<IndexPath> {
    fn from(value: Conversion) -> Self {
        match value {
            Conversion::At(index_path) => Some(index_path),
            Conversion::Absent => None,
        }
    }
}

/// Convert `target` to its index path in `tree`.
///
/// Returns `PathNotFound` when `target` is not a node of `tree`, which
/// means the caller holds paths from another structural version.
pub fn index_path_of(tree: &VNode, target: &Path) -> VdomResult<Conversion> {
    if !tree.path().is_ancestor_or_self(target) {
        return Err(not_found(target));
    }

    let mut node = tree;
    let mut indices = Vec::with_capacity(target.depth() - node.path().depth());

    while node.path() != target {
        let mut slot = 0;
        let mut next = None;
        for child in node.children() {
            if child.path().is_ancestor_or_self(target) {
                next = Some(child);
                break;
            }
            if !child.is_null() {
                slot += 1;
            }
        }
        node = next.ok_or_else(|| not_found(target))?;
        indices.push(slot);
    }

    if node.is_null() {
        return Ok(Conversion::Absent);
    }
    Ok(Conversion::At(IndexPath::from(indices)))
}

fn not_found(target: &Path) -> VdomError {
    debug!(path = %target, "Path not present in tree");
    VdomError::PathNotFound {
        path: target.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Path {
        s.parse().unwrap()
    }

    fn tree() -> VNode {
        VNode::element(Path::root(), "div")
            .with_child(VNode::null(p("10")))
            .with_child(VNode::text(p("20"), "a"))
            .with_child(VNode::null(p("30")))
            .with_child(VNode::null(p("38")))
            .with_child(
                VNode::element(p("40"), "ul")
                    .with_child(VNode::null(p("40.1")))
                    .with_child(VNode::text(p("40.2"), "b")),
            )
            .with_child(VNode::text(p("50"), "c"))
    }

    #[test]
    fn test_null_siblings_are_skipped() {
        let tree = tree();
        let at = |s: &str| index_path_of(&tree, &p(s)).unwrap();

        assert_eq!(at(""), Conversion::At(IndexPath::root()));
        assert_eq!(at("20"), Conversion::At(IndexPath::from(vec![0])));
        assert_eq!(at("40"), Conversion::At(IndexPath::from(vec![1])));
        assert_eq!(at("40.2"), Conversion::At(IndexPath::from(vec![1, 0])));
        assert_eq!(at("50"), Conversion::At(IndexPath::from(vec![2])));
    }

    #[test]
    fn test_null_targets_are_absent() {
        let tree = tree();
        assert_eq!(index_path_of(&tree, &p("30")).unwrap(), Conversion::Absent);
        assert_eq!(index_path_of(&tree, &p("40.1")).unwrap(), Conversion::Absent);
    }

    #[test]
    fn test_indices_stay_below_non_null_count() {
        let tree = tree();
        let non_null = tree.children().iter().filter(|c| !c.is_null()).count();
        for child in tree.children() {
            if let Conversion::At(index_path) = index_path_of(&tree, child.path()).unwrap() {
                assert!(index_path.as_slice()[0] < non_null);
            }
        }
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let tree = tree();
        assert!(matches!(
            index_path_of(&tree, &p("60")),
            Err(VdomError::PathNotFound { .. })
        ));
        assert!(matches!(
            index_path_of(&tree, &p("20.1")),
            Err(VdomError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_wire_format_is_array_or_null() {
        let at = Conversion::At(IndexPath::from(vec![1, 0]));
        assert_eq!(serde_json::to_string(&at).unwrap(), "[1,0]");
        assert_eq!(serde_json::to_string(&Conversion::Absent).unwrap(), "null");
        assert_eq!(serde_json::from_str::<Conversion>("null").unwrap(), Conversion::Absent);
    }
}
