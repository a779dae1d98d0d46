//! Authoritative per-instance component state
//!
//! Each mounted instance has a single writer: its mutex is held for the
//! whole render → reconcile → simulate cycle. The current tree lives in an
//! `ArcSwap` next to the mutex, so readers take a consistent snapshot
//! without waiting on a render in progress.

use crate::config::EngineConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::message::{Confirmation, StateChange, StructureUpdate};
use anticipate_simulator::{PathVariantTable, SimulationReport, Simulator};
use anticipate_templates::{
    Binding, Evaluation, StateSnapshot, StructuralVersion, Template, TemplateArtifact,
    TemplateRegistry,
};
use anticipate_vdom::{
    index_path_of, validate, Conversion, IndexPath, Patch, Reconciler, VNode, ValidationConfig,
};
use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

struct Instance {
    artifact: TemplateArtifact,
    registry: TemplateRegistry,
    state: StateSnapshot,
    report: SimulationReport,
    /// Sequence of the last applied state change
    sequence: u64,
}

impl Instance {
    fn structure(&self, id: &str, patches: Vec<Patch>) -> StructureUpdate {
        StructureUpdate {
            component_id: id.to_string(),
            version: self.registry.version(),
            fingerprint: self.registry.fingerprint(),
            sequence: self.sequence,
            artifact: self.artifact.clone(),
            state: self.state.clone(),
            patches,
            tables: self.report.tables.values().cloned().collect(),
            unavailable: self.report.unavailable.keys().cloned().collect(),
        }
    }
}

struct Slot {
    tree: ArcSwap<VNode>,
    instance: Mutex<Instance>,
}

/// Mounted component instances, keyed by id
pub struct ComponentStore {
    config: EngineConfig,
    reconciler: Reconciler,
    simulator: Simulator,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
}

impl Default for ComponentStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ComponentStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            reconciler: Reconciler::new(config.validation.clone()),
            simulator: Simulator::new(config.simulation.clone()),
            config,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render `artifact` against `state` for the first time
    #[instrument(skip_all, fields(component = %artifact.component))]
    pub fn mount(
        &self,
        id: impl Into<String>,
        artifact: TemplateArtifact,
        state: StateSnapshot,
    ) -> RuntimeResult<StructureUpdate> {
        let id = id.into();
        if self.slots.read().contains_key(&id) {
            return Err(RuntimeError::AlreadyMounted { id });
        }

        let registry =
            TemplateRegistry::build_with(&artifact, StructuralVersion::initial(), &self.config.paths)?;
        let tree = registry.render(&state)?;
        let patches = self.reconciler.reconcile(None, &tree)?;
        let report = self.simulator.simulate(&registry, &state);

        let instance = Instance {
            artifact,
            registry,
            state,
            report,
            sequence: 0,
        };
        let update = instance.structure(&id, patches);

        match self.slots.write().entry(id) {
            Entry::Occupied(occupied) => Err(RuntimeError::AlreadyMounted {
                id: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                info!(
                    id = %vacant.key(),
                    templates = instance.registry.len(),
                    tables = instance.report.tables.len(),
                    "Component mounted"
                );
                vacant.insert(Arc::new(Slot {
                    tree: ArcSwap::from_pointee(tree),
                    instance: Mutex::new(instance),
                }));
                Ok(update)
            }
        }
    }

    /// Apply one state change and return the authoritative patches, or
    /// `None` when the change is not newer than the last one applied.
    #[instrument(
        skip(self, change),
        fields(component = %change.component_id, binding = %change.binding, sequence = change.sequence)
    )]
    pub fn handle_state_change(&self, change: StateChange) -> RuntimeResult<Option<Confirmation>> {
        let slot = self.slot(&change.component_id)?;
        let mut instance = slot.instance.lock();

        if change.sequence <= instance.sequence {
            debug!(last = instance.sequence, "Ignoring stale state change");
            return Ok(None);
        }

        let binding = Binding::parse(&change.binding)?;
        let mut state = instance.state.clone();
        binding.assign(&mut state, change.value.clone())?;

        let old = slot.tree.load_full();
        let fast = dynamic_patches(
            &instance.registry,
            binding.root(),
            &old,
            &state,
            self.reconciler.config(),
        )?;
        let fast_path = fast.is_some();
        let (tree, patches) = match fast {
            Some(result) => result,
            None => {
                let tree = instance.registry.render(&state)?;
                let patches = self.reconciler.reconcile(Some(old.as_ref()), &tree)?;
                (tree, patches)
            }
        };

        slot.tree.store(Arc::new(tree));
        instance.state = state;
        instance.sequence = change.sequence;

        debug!(fast_path, patches = patches.len(), "State change applied");
        Ok(Some(Confirmation {
            component_id: change.component_id,
            sequence: change.sequence,
            version: instance.registry.version(),
            patches,
        }))
    }

    /// Swap in a new artifact. An artifact with the same fingerprint is a
    /// no-op; anything else bumps the structural version, rebuilds every
    /// table and replaces the whole materialized tree.
    #[instrument(skip(self, artifact), fields(component = %artifact.component))]
    pub fn hot_reload(
        &self,
        id: &str,
        artifact: TemplateArtifact,
    ) -> RuntimeResult<Option<StructureUpdate>> {
        let slot = self.slot(id)?;
        let mut instance = slot.instance.lock();

        let version = instance.registry.version().next();
        let registry = TemplateRegistry::build_with(&artifact, version, &self.config.paths)?;
        if registry.fingerprint() == instance.registry.fingerprint() {
            debug!(version = %instance.registry.version(), "Artifact unchanged, skipping reload");
            return Ok(None);
        }

        let tree = registry.render(&instance.state)?;
        validate(&tree, self.reconciler.config())?;
        let patches = replace_patches(&slot.tree.load(), &tree);
        let report = self.simulator.simulate(&registry, &instance.state);

        slot.tree.store(Arc::new(tree));
        instance.artifact = artifact;
        instance.registry = registry;
        instance.report = report;

        info!(
            %version,
            tables = instance.report.tables.len(),
            unavailable = instance.report.unavailable.len(),
            "Structure reloaded"
        );
        Ok(Some(instance.structure(id, patches)))
    }

    pub fn unmount(&self, id: &str) -> RuntimeResult<()> {
        match self.slots.write().remove(id) {
            Some(_) => {
                debug!(id, "Component unmounted");
                Ok(())
            }
            None => Err(RuntimeError::UnknownComponent { id: id.to_string() }),
        }
    }

    /// Current tree; never blocks on a render in progress
    pub fn snapshot(&self, id: &str) -> RuntimeResult<Arc<VNode>> {
        Ok(self.slot(id)?.tree.load_full())
    }

    pub fn state(&self, id: &str) -> RuntimeResult<StateSnapshot> {
        Ok(self.slot(id)?.instance.lock().state.clone())
    }

    pub fn version(&self, id: &str) -> RuntimeResult<StructuralVersion> {
        Ok(self.slot(id)?.instance.lock().registry.version())
    }

    pub fn tables(&self, id: &str) -> RuntimeResult<Vec<PathVariantTable>> {
        Ok(self.slot(id)?.instance.lock().report.tables.values().cloned().collect())
    }

    /// Full structure for a mirror that lost sync, mounted from scratch
    pub fn structure(&self, id: &str) -> RuntimeResult<StructureUpdate> {
        let slot = self.slot(id)?;
        let instance = slot.instance.lock();
        let patches = self.reconciler.reconcile(None, &slot.tree.load())?;
        Ok(instance.structure(id, patches))
    }

    pub fn component_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.slots.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn slot(&self, id: &str) -> RuntimeResult<Arc<Slot>> {
        self.slots
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownComponent { id: id.to_string() })
    }
}

/// Patches for a change whose dependents are all plain text or attribute
/// templates outside conditionals and loops. Structure cannot move, so
/// each dependent is re-evaluated and written in place without a diff.
/// `None` sends the change down the full render path.
fn dynamic_patches(
    registry: &TemplateRegistry,
    root: &str,
    old: &VNode,
    state: &StateSnapshot,
    limits: &ValidationConfig,
) -> RuntimeResult<Option<(VNode, Vec<Patch>)>> {
    let keys = registry.dependents(root);
    let eligible = keys.iter().all(|key| {
        registry.get(key).is_some_and(|entry| {
            entry.is_unconditional()
                && matches!(entry.template, Template::Static(_) | Template::Dynamic(_))
        })
    });
    if !eligible {
        return Ok(None);
    }

    let mut tree = old.clone();
    let mut patches = Vec::new();
    for key in keys {
        let Evaluation::Text(value) = registry.evaluate(key, state)? else {
            return Ok(None);
        };
        let Conversion::At(index_path) = index_path_of(&tree, &key.path)? else {
            return Ok(None);
        };
        let Some(node) = tree.find_mut(&key.path) else {
            return Ok(None);
        };

        match (&key.attribute, node) {
            (Some(name), VNode::Element(element)) => {
                if value.len() > limits.max_attribute_value_length {
                    return Ok(None);
                }
                if element.attributes.get(name) != Some(&value) {
                    element.attributes.insert(name.clone(), value.clone());
                    patches.push(Patch::SetAttribute {
                        path: index_path,
                        name: name.clone(),
                        value,
                    });
                }
            }
            (None, VNode::Text(text)) => {
                if value.len() > limits.max_text_length {
                    return Ok(None);
                }
                if text.content != value {
                    text.content = value.clone();
                    patches.push(Patch::UpdateText {
                        path: index_path,
                        content: value,
                    });
                }
            }
            _ => return Ok(None),
        }
    }

    Ok(Some((tree, patches)))
}

/// Swap the whole materialized tree
fn replace_patches(old: &VNode, new: &VNode) -> Vec<Patch> {
    let root = IndexPath::root();
    match (old.materialize(), new.materialize()) {
        (Some(_), Some(node)) => vec![Patch::Replace { path: root, node }],
        (None, Some(node)) => vec![Patch::Create { path: root, node }],
        (Some(_), None) => vec![Patch::Remove { path: root }],
        (None, None) => Vec::new(),
    }
}
