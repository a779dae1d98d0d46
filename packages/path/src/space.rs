//! Per-snapshot path allocation
//!
//! `PathSpace` tracks the live children of every parent so it can hand out
//! fresh slots (`next`), place a node between two siblings
//! (`insert_between`), retire removed subtrees, and renumber a sibling list
//! when its gaps run out (`rebalance`). Rebalancing only touches the
//! affected parent's subtree and reports every move as a `PathRemap`.

use crate::between::{between, midpoint};
use crate::error::{PathError, PathResult};
use crate::path::{Path, SEGMENT_LIMIT, SLOT_GAP};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathConfig {
    /// Distance between freshly allocated sibling slots
    #[serde(default = "default_gap")]
    pub gap: u64,

    /// Smallest gap `insert_between` accepts before it rebalances
    #[serde(default = "default_rebalance_floor")]
    pub rebalance_floor: u64,
}

fn default_gap() -> u64 {
    SLOT_GAP
}

fn default_rebalance_floor() -> u64 {
    16
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            gap: default_gap(),
            rebalance_floor: default_rebalance_floor(),
        }
    }
}

/// Old → new mapping for renumbered subtree roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRemap {
    moves: BTreeMap<Path, Path>,
}

impl PathRemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Path, to: Path) {
        if from != to {
            self.moves.insert(from, to);
        }
    }

    /// New location of `path`, if it or one of its ancestors moved
    pub fn apply(&self, path: &Path) -> Option<Path> {
        // Moves are disjoint subtrees, so the closest preceding key is the only
        // candidate ancestor.
        self.moves
            .range(..=path.clone())
            .next_back()
            .and_then(|(from, to)| path.rebase(from, to))
    }

    /// `apply`, falling back to the unchanged path
    pub fn resolve(&self, path: &Path) -> Path {
        self.apply(path).unwrap_or_else(|| path.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.moves.iter()
    }
}

/// Result of an allocation; `remap` is set when a rebalance was needed first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub path: Path,
    pub remap: Option<PathRemap>,
}

#[derive(Debug, Clone, Default)]
pub struct PathSpace {
    config: PathConfig,
    /// Live children per parent, in document order
    children: BTreeMap<Path, BTreeSet<Path>>,
}

impl PathSpace {
    pub fn new(config: PathConfig) -> Self {
        Self {
            config,
            children: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Record an existing path (e.g. one stamped by the authoring layer)
    pub fn register(&mut self, path: Path) -> PathResult<()> {
        let Some(parent) = path.parent() else {
            // The root is implicit.
            return Ok(());
        };
        let siblings = self.children.entry(parent).or_default();
        if !siblings.insert(path.clone()) {
            return Err(PathError::Collision { path });
        }
        Ok(())
    }

    pub fn contains(&self, path: &Path) -> bool {
        path.is_root()
            || path
                .parent()
                .and_then(|parent| self.children.get(&parent))
                .is_some_and(|siblings| siblings.contains(path))
    }

    pub fn children(&self, parent: &Path) -> impl DoubleEndedIterator<Item = &Path> {
        self.children.get(parent).into_iter().flatten()
    }

    /// Allocate the next slot after the last live child of `parent`
    pub fn next(&mut self, parent: &Path) -> PathResult<Allocation> {
        let last = self.children(parent).next_back().and_then(Path::last_segment);
        let mut remap = None;

        let segment = match last {
            None => self.config.gap.min(SEGMENT_LIMIT / 2),
            Some(last) => match last.checked_add(self.config.gap).filter(|&s| s < SEGMENT_LIMIT) {
                Some(segment) => segment,
                None => {
                    let moves = self.rebalance(parent)?;
                    remap = Some(moves);
                    let last = self
                        .children(parent)
                        .next_back()
                        .and_then(Path::last_segment)
                        .unwrap_or(0);
                    midpoint(last, SEGMENT_LIMIT).ok_or(PathError::SegmentOverflow {
                        segment: last,
                    })?
                }
            },
        };

        let path = parent.with_segment(segment)?;
        self.register(path.clone())?;
        Ok(Allocation { path, remap })
    }

    /// Allocate a sibling between `left` and `right` (either may be absent,
    /// meaning the start or end of `parent`'s child list). A lone `left`
    /// places the new path immediately after it.
    ///
    /// Gap exhaustion is handled here by rebalancing `parent`; the returned
    /// remap must be applied to any tree holding the old paths.
    pub fn insert_between(
        &mut self,
        parent: &Path,
        left: Option<&Path>,
        right: Option<&Path>,
    ) -> PathResult<Allocation> {
        for bound in [left, right].into_iter().flatten() {
            if !parent.is_parent_of(bound) || !self.contains(bound) {
                return Err(PathError::NotAChild {
                    path: bound.clone(),
                    parent: parent.clone(),
                });
            }
        }

        // With only a left bound, place directly after it.
        let following;
        let right = match (left, right) {
            (Some(left), None) => {
                following = self.children(parent).find(|p| *p > left).cloned();
                following.as_ref()
            }
            _ => right,
        };
        if right.is_none() {
            return self.next(parent);
        }

        let mut remap: Option<PathRemap> = None;
        let placed = match self.try_between(parent, left, right) {
            Some(path) => path,
            None => {
                let moves = self.rebalance(parent)?;
                let left = left.map(|p| moves.resolve(p));
                let right = right.map(|p| moves.resolve(p));
                let path = self
                    .try_between(parent, left.as_ref(), right.as_ref())
                    .ok_or_else(|| PathError::GapExhausted {
                        left: left.clone().unwrap_or_else(|| parent.clone()),
                        right: right.clone().unwrap_or_else(|| parent.clone()),
                    })?;
                remap = Some(moves);
                path
            }
        };

        self.register(placed.clone())?;
        Ok(Allocation {
            path: placed,
            remap,
        })
    }

    /// Candidate between two siblings, or `None` when below the floor
    fn try_between(&self, parent: &Path, left: Option<&Path>, right: Option<&Path>) -> Option<Path> {
        let lo = left.and_then(Path::last_segment).unwrap_or(0);
        let hi = right.and_then(Path::last_segment).unwrap_or(SEGMENT_LIMIT);
        if hi.saturating_sub(lo) < self.config.rebalance_floor {
            debug!(parent = %parent, lo, hi, "Sibling gap below rebalance floor");
            return None;
        }

        match (left, right) {
            (Some(left), Some(right)) => between(left, right).ok(),
            _ => midpoint(lo, hi).and_then(|segment| parent.with_segment(segment).ok()),
        }
    }

    /// Forget `path` and every path below it
    pub fn retire(&mut self, path: &Path) {
        if let Some(siblings) = path.parent().and_then(|parent| self.children.get_mut(&parent)) {
            siblings.remove(path);
        }
        self.children.retain(|parent, _| !path.is_ancestor_or_self(parent));
    }

    /// Renumber `parent`'s children to evenly gapped slots, moving their
    /// subtrees along. Paths outside `parent`'s subtree are untouched.
    pub fn rebalance(&mut self, parent: &Path) -> PathResult<PathRemap> {
        let siblings: Vec<Path> = self.children(parent).cloned().collect();
        let gap = self
            .config
            .gap
            .min(SEGMENT_LIMIT / (siblings.len() as u64 + 1))
            .max(1);

        let mut remap = PathRemap::new();
        for (index, old) in siblings.iter().enumerate() {
            remap.insert(old.clone(), parent.with_segment(Path::slot(index, gap)?)?);
        }

        if remap.is_empty() {
            return Ok(remap);
        }

        debug!(parent = %parent, moved = remap.len(), gap, "Rebalancing sibling slots");

        // Re-key every registry entry in the parent's subtree.
        let affected: Vec<Path> = self
            .children
            .keys()
            .filter(|key| parent.is_ancestor_or_self(key))
            .cloned()
            .collect();
        let mut rebuilt = BTreeMap::new();
        for key in affected {
            if let Some(set) = self.children.remove(&key) {
                let new_key = remap.resolve(&key);
                let new_set: BTreeSet<Path> = set.iter().map(|p| remap.resolve(p)).collect();
                rebuilt.insert(new_key, new_set);
            }
        }
        self.children.extend(rebuilt);

        Ok(remap)
    }
}
