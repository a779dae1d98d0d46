use crate::error::RuntimeResult;
use anticipate_simulator::{PathVariant, PathVariantTable};
use anticipate_templates::{Evaluation, Scope, StateSnapshot, TemplateKey, TemplateRegistry};
use anticipate_vdom::{DomNode, Patch};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Structural patches predicted for one state transition
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Predicted {
    pub patches: Vec<Patch>,
    /// False when an affected conditional has no table; the confirmation
    /// will carry what the prediction could not.
    pub complete: bool,
}

/// Predict the inserts, removes and replaces caused by moving from
/// `before` to `after`, where only state under `root` changed.
///
/// Positions come from table lookups alone. Removes use the old positions
/// and run in reverse document order; inserts and replaces use the new
/// positions and run in document order, so the list applies sequentially.
/// Conditionals inside a region that is itself inserted, removed or
/// replaced are covered by that region's patch.
pub(crate) fn predict_structure(
    registry: &TemplateRegistry,
    tables: &BTreeMap<TemplateKey, PathVariantTable>,
    before: &StateSnapshot,
    after: &StateSnapshot,
    root: &str,
) -> RuntimeResult<Predicted> {
    let mut changed: BTreeSet<&TemplateKey> = BTreeSet::new();
    let mut removes = Vec::new();
    let mut placements = Vec::new();
    let mut complete = true;

    for (key, entry) in registry.conditionals() {
        if entry.gates.iter().any(|gate| changed.contains(&gate.key)) {
            continue;
        }
        let Some(condition) = registry.condition(key) else {
            continue;
        };

        let Some(table) = tables.get(key) else {
            if condition.bindings().iter().any(|binding| binding.root() == root) {
                debug!(key = %key, binding = root, "No table for affected conditional");
                complete = false;
            }
            continue;
        };
        if !table.reads(root) {
            continue;
        }

        let (Some(old), Some(new)) = (table.lookup(before), table.lookup(after)) else {
            debug!(key = %key, "Table has no entry for current signature");
            complete = false;
            continue;
        };

        match (old, new) {
            (PathVariant::Absent, PathVariant::Absent) => {}
            (PathVariant::At(at), PathVariant::Absent) => {
                removes.push(Patch::Remove { path: at.clone() });
                changed.insert(key);
            }
            (PathVariant::Absent, PathVariant::At(at)) => {
                match branch(registry, key, after)? {
                    Some(node) => placements.push(Patch::Insert {
                        path: at.clone(),
                        node,
                    }),
                    None => complete = false,
                }
                changed.insert(key);
            }
            (PathVariant::At(_), PathVariant::At(at)) => {
                let was = condition.evaluate(&Scope::new(before));
                let is = condition.evaluate(&Scope::new(after));
                if was != is {
                    match branch(registry, key, after)? {
                        Some(node) => placements.push(Patch::Replace {
                            path: at.clone(),
                            node,
                        }),
                        None => complete = false,
                    }
                    changed.insert(key);
                }
            }
        }
    }

    removes.reverse();
    removes.extend(placements);
    Ok(Predicted {
        patches: removes,
        complete,
    })
}

fn branch(
    registry: &TemplateRegistry,
    key: &TemplateKey,
    state: &StateSnapshot,
) -> RuntimeResult<Option<DomNode>> {
    match registry.evaluate(key, state)? {
        Evaluation::Node(node) => Ok(node.materialize()),
        Evaluation::Text(_) => Ok(None),
    }
}
