//! Path-synchronized tree diff.
//!
//! Both trees share one addressing scheme, so matching nodes is a merge of
//! two path-sorted child lists rather than an edit-distance search. The
//! walk keeps a live cursor per level: the index the next matched node has
//! in the materialized tree *as patched so far*, so the emitted list can be
//! applied sequentially without any index fix-ups.

use crate::error::VdomResult;
use crate::index_path::IndexPath;
use crate::patch::{Patch, PatchKind};
use crate::validation::{validate, ValidationConfig};
use crate::vnode::{VElement, VNode};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// Counters from one reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileStats {
    pub nodes_visited: usize,
    pub creates: usize,
    pub text_updates: usize,
    pub attribute_sets: usize,
    pub attribute_removals: usize,
    pub inserts: usize,
    pub removes: usize,
    pub replaces: usize,
}

impl ReconcileStats {
    pub fn total_patches(&self) -> usize {
        self.creates
            + self.text_updates
            + self.attribute_sets
            + self.attribute_removals
            + self.inserts
            + self.removes
            + self.replaces
    }

    fn record(&mut self, kind: PatchKind) {
        match kind {
            PatchKind::Create => self.creates += 1,
            PatchKind::UpdateText => self.text_updates += 1,
            PatchKind::SetAttribute => self.attribute_sets += 1,
            PatchKind::RemoveAttribute => self.attribute_removals += 1,
            PatchKind::Insert => self.inserts += 1,
            PatchKind::Remove => self.removes += 1,
            PatchKind::Replace => self.replaces += 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    config: ValidationConfig,
}

impl Reconciler {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Diff `old` (absent for a first mount) against `new`
    pub fn reconcile(&self, old: Option<&VNode>, new: &VNode) -> VdomResult<Vec<Patch>> {
        self.reconcile_with_stats(old, new).map(|(patches, _)| patches)
    }

    #[instrument(skip_all, fields(root = %new.path()))]
    pub fn reconcile_with_stats(
        &self,
        old: Option<&VNode>,
        new: &VNode,
    ) -> VdomResult<(Vec<Patch>, ReconcileStats)> {
        if let Some(old) = old {
            validate(old, &self.config)?;
        }
        validate(new, &self.config)?;

        let mut diff = Diff::default();
        diff.root(old, new);

        debug!(
            patches = diff.patches.len(),
            nodes_visited = diff.stats.nodes_visited,
            "Reconciliation complete"
        );
        Ok((diff.patches, diff.stats))
    }
}

/// Diff with the default validation limits
pub fn reconcile(old: Option<&VNode>, new: &VNode) -> VdomResult<Vec<Patch>> {
    Reconciler::default().reconcile(old, new)
}

pub fn reconcile_with_stats(
    old: Option<&VNode>,
    new: &VNode,
) -> VdomResult<(Vec<Patch>, ReconcileStats)> {
    Reconciler::default().reconcile_with_stats(old, new)
}

#[derive(Default)]
struct Diff {
    patches: Vec<Patch>,
    stats: ReconcileStats,
}

impl Diff {
    fn push(&mut self, patch: Patch) {
        self.stats.record(patch.kind());
        self.patches.push(patch);
    }

    fn root(&mut self, old: Option<&VNode>, new: &VNode) {
        let root = IndexPath::root();
        let old = old.filter(|node| !node.is_null());

        match old {
            Some(old) if !new.is_null() && old.path() == new.path() => {
                self.stats.nodes_visited += 1;
                self.matched(old, new, root);
            }
            Some(_) => match new.materialize() {
                Some(node) => self.push(Patch::Replace { path: root, node }),
                None => self.push(Patch::Remove { path: root }),
            },
            None => {
                if let Some(node) = new.materialize() {
                    self.push(Patch::Create { path: root, node });
                }
            }
        }
    }

    /// Diff two children of `parent` sharing a path; `cursor` is the live
    /// index of the next materialized child.
    fn node(&mut self, old: &VNode, new: &VNode, parent: &IndexPath, cursor: &mut usize) {
        self.stats.nodes_visited += 1;

        match (old.is_null(), new.is_null()) {
            (true, true) => {}
            // A Null owns no slot, so entering or leaving Null is an
            // insert or a remove at the cursor rather than a replace.
            (true, false) => {
                if let Some(node) = new.materialize() {
                    self.push(Patch::Insert {
                        path: parent.child(*cursor),
                        node,
                    });
                    *cursor += 1;
                }
            }
            (false, true) => self.push(Patch::Remove {
                path: parent.child(*cursor),
            }),
            (false, false) => {
                self.matched(old, new, parent.child(*cursor));
                *cursor += 1;
            }
        }
    }

    /// Two non-Null nodes sharing a path, currently materialized at `here`
    fn matched(&mut self, old: &VNode, new: &VNode, here: IndexPath) {
        match (old, new) {
            (VNode::Text(old_text), VNode::Text(new_text)) => {
                if old_text.content != new_text.content {
                    self.push(Patch::UpdateText {
                        path: here,
                        content: new_text.content.clone(),
                    });
                }
            }
            (VNode::Element(old_el), VNode::Element(new_el)) if old_el.tag == new_el.tag => {
                self.attributes(old_el, new_el, &here);
                self.children(old_el, new_el, &here);
            }
            _ => {
                if let Some(node) = new.materialize() {
                    self.push(Patch::Replace { path: here, node });
                }
            }
        }
    }

    fn attributes(&mut self, old: &VElement, new: &VElement, path: &IndexPath) {
        for (name, value) in &new.attributes {
            if old.attributes.get(name) != Some(value) {
                self.push(Patch::SetAttribute {
                    path: path.clone(),
                    name: name.clone(),
                    value: value.clone(),
                });
            }
        }
        for name in old.attributes.keys() {
            if !new.attributes.contains_key(name) {
                self.push(Patch::RemoveAttribute {
                    path: path.clone(),
                    name: name.clone(),
                });
            }
        }
    }

    fn children(&mut self, old: &VElement, new: &VElement, path: &IndexPath) {
        let mut old_iter = old.children.iter().peekable();
        let mut new_iter = new.children.iter().peekable();
        let mut cursor = 0;

        loop {
            let order = match (old_iter.peek(), new_iter.peek()) {
                (None, None) => break,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(o), Some(n)) => o.path().cmp(n.path()),
            };

            match order {
                // Only in old
                Ordering::Less => {
                    if let Some(gone) = old_iter.next() {
                        if !gone.is_null() {
                            self.stats.nodes_visited += 1;
                            self.push(Patch::Remove {
                                path: path.child(cursor),
                            });
                        }
                    }
                }
                // Only in new
                Ordering::Greater => {
                    if let Some(node) = new_iter.next().and_then(VNode::materialize) {
                        self.stats.nodes_visited += 1;
                        self.push(Patch::Insert {
                            path: path.child(cursor),
                            node,
                        });
                        cursor += 1;
                    }
                }
                Ordering::Equal => {
                    if let (Some(o), Some(n)) = (old_iter.next(), new_iter.next()) {
                        self.node(o, n, path, &mut cursor);
                    }
                }
            }
        }
    }
}

/// Convenience for callers holding a materialized view: the full tree as a
/// single create patch, or nothing for a Null root.
pub fn mount_patches(tree: &VNode) -> Vec<Patch> {
    tree.materialize()
        .map(|node| {
            vec![Patch::Create {
                path: IndexPath::root(),
                node,
            }]
        })
        .unwrap_or_default()
}
