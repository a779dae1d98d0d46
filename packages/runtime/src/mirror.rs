//! Non-authoritative view of one component instance
//!
//! A mirror applies structural changes the moment local state changes,
//! using the precomputed tables, and forwards the change to the store.
//! Confirmations become the new base; predictions the store has not
//! confirmed yet are replayed on top of it.

use crate::error::{RuntimeError, RuntimeResult};
use crate::message::{Confirmation, StateChange, StructureUpdate};
use crate::predict::predict_structure;
use anticipate_simulator::PathVariantTable;
use anticipate_templates::{
    Binding, StateSnapshot, StateValue, StructuralVersion, TemplateKey, TemplateRegistry,
};
use anticipate_vdom::{apply_patches, DomNode, Patch};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Local change applied optimistically
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Forward this to the store
    pub change: StateChange,
    /// Already applied to the mirror's view
    pub patches: Vec<Patch>,
    /// False when part of the structural effect waits for confirmation
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// Confirmation folded into the base; `replayed` pending predictions
    /// were applied on top of it. `hit` tells whether the local prediction
    /// for this change produced the confirmed tree; `None` when the change
    /// did not come from this mirror.
    Applied { replayed: usize, hit: Option<bool> },
    /// Not newer than what the base already holds; dropped
    Stale { sequence: u64 },
    /// The base cannot absorb this confirmation (structural version moved,
    /// an earlier change is still unconfirmed, or the patches do not apply);
    /// fetch a `StructureUpdate` and call `resync`.
    Resync { version: StructuralVersion },
}

/// How often local predictions matched the authoritative result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionStats {
    pub hits: u64,
    pub misses: u64,
}

impl PredictionStats {
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.hits as f64 / self.total() as f64
        }
    }

    fn record(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }
}

#[derive(Debug, Clone)]
struct Pending {
    binding: Binding,
    change: StateChange,
}

pub struct RemoteMirror {
    component_id: String,
    registry: TemplateRegistry,
    tables: BTreeMap<TemplateKey, PathVariantTable>,

    /// Last confirmed materialized tree and the state behind it
    confirmed: Option<DomNode>,
    confirmed_state: StateSnapshot,
    confirmed_sequence: u64,

    /// What the user sees: the base plus pending predictions
    view: Option<DomNode>,
    state: StateSnapshot,
    pending: Vec<Pending>,
    next_sequence: u64,
    stats: PredictionStats,
}

impl RemoteMirror {
    pub fn new(update: &StructureUpdate) -> RuntimeResult<Self> {
        let registry = TemplateRegistry::build(&update.artifact, update.version)?;
        let confirmed = registry.render(&update.state)?.materialize();
        Ok(Self {
            component_id: update.component_id.clone(),
            tables: index_tables(&update.tables),
            registry,
            view: confirmed.clone(),
            confirmed,
            confirmed_state: update.state.clone(),
            confirmed_sequence: update.sequence,
            state: update.state.clone(),
            pending: Vec::new(),
            next_sequence: update.sequence,
            stats: PredictionStats::default(),
        })
    }

    pub fn component_id(&self) -> &str {
        &self.component_id
    }

    pub fn version(&self) -> StructuralVersion {
        self.registry.version()
    }

    pub fn view(&self) -> Option<&DomNode> {
        self.view.as_ref()
    }

    pub fn confirmed(&self) -> Option<&DomNode> {
        self.confirmed.as_ref()
    }

    pub fn state(&self) -> &StateSnapshot {
        &self.state
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> PredictionStats {
        self.stats
    }

    pub fn table(&self, key: &TemplateKey) -> Option<&PathVariantTable> {
        self.tables.get(key)
    }

    /// Set `binding` locally and apply the predicted structural patches
    #[instrument(skip(self, value), fields(component = %self.component_id))]
    pub fn predict(
        &mut self,
        binding: &str,
        value: impl Into<StateValue>,
    ) -> RuntimeResult<Prediction> {
        let value = value.into();
        let parsed = Binding::parse(binding)?;
        let mut next = self.state.clone();
        parsed.assign(&mut next, value.clone())?;

        let predicted =
            predict_structure(&self.registry, &self.tables, &self.state, &next, parsed.root())?;
        let mut view = self.view.clone();
        apply_patches(&mut view, &predicted.patches)?;

        self.view = view;
        self.state = next;
        self.next_sequence += 1;

        let change = StateChange {
            component_id: self.component_id.clone(),
            binding: binding.to_string(),
            value,
            sequence: self.next_sequence,
        };
        self.pending.push(Pending {
            binding: parsed,
            change: change.clone(),
        });

        debug!(
            sequence = change.sequence,
            patches = predicted.patches.len(),
            complete = predicted.complete,
            "Prediction applied"
        );
        Ok(Prediction {
            change,
            patches: predicted.patches,
            complete: predicted.complete,
        })
    }

    /// Fold an authoritative confirmation into the base.
    ///
    /// The confirmed patches never overwrite the view directly: the view is
    /// rebuilt from the new base plus every newer pending prediction, so a
    /// confirmation that trails local changes cannot roll them back.
    /// Confirmations must arrive in sequence order; one that overtakes an
    /// unconfirmed earlier change was computed against a tree the base does
    /// not hold yet and asks for a resync.
    #[instrument(skip_all, fields(component = %self.component_id, sequence = confirmation.sequence))]
    pub fn confirm(&mut self, confirmation: &Confirmation) -> RuntimeResult<MirrorOutcome> {
        if confirmation.component_id != self.component_id {
            return Err(RuntimeError::ComponentMismatch {
                expected: self.component_id.clone(),
                found: confirmation.component_id.clone(),
            });
        }
        if confirmation.sequence <= self.confirmed_sequence {
            debug!(confirmed = self.confirmed_sequence, "Discarding stale confirmation");
            return Ok(MirrorOutcome::Stale {
                sequence: confirmation.sequence,
            });
        }
        if confirmation.version != self.version() {
            warn!(
                local = %self.version(),
                remote = %confirmation.version,
                "Structural version changed, resync required"
            );
            return Ok(MirrorOutcome::Resync {
                version: confirmation.version,
            });
        }
        if let Some(missing) = self
            .pending
            .iter()
            .map(|pending| pending.change.sequence)
            .find(|&sequence| sequence < confirmation.sequence)
        {
            warn!(missing, "Confirmation overtook an earlier change, resync required");
            return Ok(MirrorOutcome::Resync {
                version: self.version(),
            });
        }

        let mut confirmed = self.confirmed.clone();
        if let Err(error) = apply_patches(&mut confirmed, &confirmation.patches) {
            warn!(error = %error, "Confirmation does not apply to the base, resync required");
            return Ok(MirrorOutcome::Resync {
                version: self.version(),
            });
        }

        let mut confirmed_state = self.confirmed_state.clone();
        let own = self
            .pending
            .iter()
            .find(|pending| pending.change.sequence == confirmation.sequence);
        let hit = match own {
            Some(pending) => {
                pending
                    .binding
                    .assign(&mut confirmed_state, pending.change.value.clone())?;
                let hit =
                    self.predicted_base(pending, &confirmed_state).as_ref() == Some(&confirmed);
                self.stats.record(hit);
                debug!(
                    hit,
                    hits = self.stats.hits,
                    misses = self.stats.misses,
                    "Prediction verified"
                );
                Some(hit)
            }
            None => None,
        };

        self.pending
            .retain(|pending| pending.change.sequence > confirmation.sequence);
        self.confirmed = confirmed;
        self.confirmed_state = confirmed_state;
        self.confirmed_sequence = confirmation.sequence;

        let replayed = self.rebase();
        Ok(MirrorOutcome::Applied { replayed, hit })
    }

    /// The base as this mirror predicts it after `pending`, or `None` when
    /// the prediction does not apply.
    fn predicted_base(&self, pending: &Pending, next: &StateSnapshot) -> Option<Option<DomNode>> {
        let predicted = predict_structure(
            &self.registry,
            &self.tables,
            &self.confirmed_state,
            next,
            pending.binding.root(),
        )
        .ok()?;
        let mut tree = self.confirmed.clone();
        apply_patches(&mut tree, &predicted.patches).ok()?;
        Some(tree)
    }

    /// Replace templates, tables and base with a fresh structure from the
    /// store, then replay pending predictions the update does not cover.
    #[instrument(skip_all, fields(component = %self.component_id, version = %update.version))]
    pub fn resync(&mut self, update: &StructureUpdate) -> RuntimeResult<usize> {
        if update.component_id != self.component_id {
            return Err(RuntimeError::ComponentMismatch {
                expected: self.component_id.clone(),
                found: update.component_id.clone(),
            });
        }

        let registry = TemplateRegistry::build(&update.artifact, update.version)?;
        self.confirmed = registry.render(&update.state)?.materialize();
        self.registry = registry;
        self.tables = index_tables(&update.tables);
        self.confirmed_state = update.state.clone();
        self.confirmed_sequence = update.sequence;
        self.next_sequence = self.next_sequence.max(update.sequence);
        self.pending
            .retain(|pending| pending.change.sequence > update.sequence);

        Ok(self.rebase())
    }

    /// Rebuild the view from the base, replaying pending predictions.
    /// A prediction that no longer applies is skipped; its confirmation
    /// brings the authoritative result.
    fn rebase(&mut self) -> usize {
        let mut view = self.confirmed.clone();
        let mut state = self.confirmed_state.clone();
        let mut replayed = 0;

        for pending in &self.pending {
            let mut next = state.clone();
            if let Err(error) = pending.binding.assign(&mut next, pending.change.value.clone()) {
                debug!(
                    sequence = pending.change.sequence,
                    error = %error,
                    "Pending change no longer assignable"
                );
                continue;
            }

            let mut candidate = view.clone();
            let applied = predict_structure(
                &self.registry,
                &self.tables,
                &state,
                &next,
                pending.binding.root(),
            )
            .and_then(|predicted| {
                apply_patches(&mut candidate, &predicted.patches).map_err(RuntimeError::from)
            });
            match applied {
                Ok(()) => {
                    view = candidate;
                    replayed += 1;
                }
                Err(error) => {
                    debug!(sequence = pending.change.sequence, error = %error, "Skipping replay");
                }
            }
            state = next;
        }

        self.view = view;
        self.state = state;
        replayed
    }
}

fn index_tables(tables: &[PathVariantTable]) -> BTreeMap<TemplateKey, PathVariantTable> {
    tables
        .iter()
        .map(|table| (table.key.clone(), table.clone()))
        .collect()
}
