use crate::config::SimulatorConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::signature::StateSignature;
use crate::variant::{PathVariant, PathVariantTable};
use anticipate_templates::{
    Binding, Branch, Overrides, StateSnapshot, Template, TemplateEntry, TemplateKey,
    TemplateRegistry,
};
use anticipate_vdom::{index_path_of, VNode};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument, warn};

/// Hard ceiling on table width regardless of configuration
const MAX_TABLE_BINDINGS: usize = 32;

/// Outcome of simulating every conditional of one registry
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub tables: BTreeMap<TemplateKey, PathVariantTable>,
    /// Conditionals that fall back to authoritative reconciliation
    pub unavailable: BTreeMap<TemplateKey, SimulationError>,
    /// Combinations resolved by rendering a tree
    pub materialized: usize,
    /// Combinations resolved to `Absent` from a closed ancestor gate
    pub pruned: usize,
    /// Distinct trees rendered; the rest were served from the memo
    pub renders: usize,
}

impl SimulationReport {
    pub fn table(&self, key: &TemplateKey) -> Option<&PathVariantTable> {
        self.tables.get(key)
    }

    pub fn variant_count(&self) -> usize {
        self.tables.values().map(PathVariantTable::len).sum()
    }
}

/// Trees rendered under pinned binding values, shared across conditionals
/// with overlapping binding sets
#[derive(Default)]
struct RenderMemo {
    trees: HashMap<StateSignature, VNode>,
    misses: usize,
}

impl RenderMemo {
    fn render(
        &mut self,
        registry: &TemplateRegistry,
        state: &StateSnapshot,
        assignment: &Overrides,
    ) -> SimulationResult<&VNode> {
        match self.trees.entry(StateSignature::from_assignment(assignment)) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let tree = registry.render_with_overrides(state, assignment)?;
                self.misses += 1;
                Ok(&*entry.insert(tree))
            }
        }
    }
}

pub struct Simulator {
    config: SimulatorConfig,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Build a table for every conditional in `registry`. Bindings outside
    /// a table's set read from `state`.
    #[instrument(skip_all, fields(component = registry.component(), version = %registry.version()))]
    pub fn simulate(&self, registry: &TemplateRegistry, state: &StateSnapshot) -> SimulationReport {
        let mut report = SimulationReport::default();
        let mut memo = RenderMemo::default();

        for (key, entry) in registry.conditionals() {
            match self.table(registry, key, entry, state, &mut memo, &mut report) {
                Ok(table) => {
                    report.tables.insert(key.clone(), table);
                }
                Err(error) => {
                    match &error {
                        SimulationError::Explosion { bindings, .. } => {
                            warn!(key = %key, bindings, "Combinatorial explosion, skipping table")
                        }
                        SimulationError::InsideLoop { .. } => {
                            debug!(key = %key, "Conditional repeats per item, skipping table")
                        }
                        other => warn!(key = %key, error = %other, "Simulation failed"),
                    }
                    report.unavailable.insert(key.clone(), error);
                }
            }
        }
        report.renders = memo.misses;

        debug!(
            tables = report.tables.len(),
            unavailable = report.unavailable.len(),
            materialized = report.materialized,
            pruned = report.pruned,
            renders = report.renders,
            "Simulation complete"
        );
        report
    }

    /// Build the table of a single conditional
    pub fn simulate_conditional(
        &self,
        registry: &TemplateRegistry,
        key: &TemplateKey,
        state: &StateSnapshot,
    ) -> SimulationResult<PathVariantTable> {
        let entry = registry
            .get(key)
            .ok_or_else(|| SimulationError::NotConditional { key: key.clone() })?;
        let mut report = SimulationReport::default();
        self.table(registry, key, entry, state, &mut RenderMemo::default(), &mut report)
    }

    /// Bindings whose values can move or hide the conditional at `key`:
    /// its own condition, every ancestor gate, and (when enabled) the
    /// conditionals preceding it among its or an ancestor's siblings.
    /// Sorted by source text.
    pub fn binding_set(
        &self,
        registry: &TemplateRegistry,
        key: &TemplateKey,
    ) -> SimulationResult<Vec<Binding>> {
        let entry = registry
            .get(key)
            .ok_or_else(|| SimulationError::NotConditional { key: key.clone() })?;
        self.collect_bindings(registry, key, entry)
    }

    fn collect_bindings(
        &self,
        registry: &TemplateRegistry,
        key: &TemplateKey,
        entry: &TemplateEntry,
    ) -> SimulationResult<Vec<Binding>> {
        let Template::Conditional { condition, .. } = &entry.template else {
            return Err(SimulationError::NotConditional { key: key.clone() });
        };

        let mut keys: Vec<&TemplateKey> = entry.gates.iter().map(|gate| &gate.key).collect();
        if self.config.include_sibling_bindings {
            keys.extend(entry.preceding.iter());
        }

        let mut bindings: BTreeMap<&str, &Binding> = BTreeMap::new();
        for binding in condition.bindings() {
            bindings.insert(binding.source(), binding);
        }
        for related in keys {
            if let Some(related) = registry.condition(related) {
                for binding in related.bindings() {
                    bindings.insert(binding.source(), binding);
                }
            }
        }
        Ok(bindings.into_values().cloned().collect())
    }

    fn table(
        &self,
        registry: &TemplateRegistry,
        key: &TemplateKey,
        entry: &TemplateEntry,
        state: &StateSnapshot,
        memo: &mut RenderMemo,
        report: &mut SimulationReport,
    ) -> SimulationResult<PathVariantTable> {
        if let Some(loop_key) = &entry.enclosing_loop {
            return Err(SimulationError::InsideLoop {
                key: key.clone(),
                loop_key: loop_key.clone(),
            });
        }

        let bindings = self.collect_bindings(registry, key, entry)?;
        let max = self.config.max_bindings.min(MAX_TABLE_BINDINGS);
        if bindings.len() > max {
            return Err(SimulationError::Explosion {
                key: key.clone(),
                bindings: bindings.len(),
                max,
            });
        }

        let mut variants = BTreeMap::new();
        for mask in 0u64..(1u64 << bindings.len()) {
            let assignment: Overrides = bindings
                .iter()
                .enumerate()
                .map(|(bit, binding)| (binding.source().to_string(), mask & (1 << bit) != 0))
                .collect();
            let signature = StateSignature::from_assignment(&assignment);

            let gated_open = entry.gates.iter().all(|gate| {
                registry.condition(&gate.key).map_or(true, |condition| {
                    let value = condition.evaluate_with(|source| assignment.get(source).copied());
                    Branch::taken(value) == gate.branch
                })
            });
            if !gated_open {
                report.pruned += 1;
                variants.insert(signature, PathVariant::Absent);
                continue;
            }

            let tree = memo.render(registry, state, &assignment)?;
            let variant = PathVariant::from(index_path_of(tree, &key.path)?);
            report.materialized += 1;
            variants.insert(signature, variant);
        }

        debug!(
            key = %key,
            bindings = bindings.len(),
            variants = variants.len(),
            "Path variant table built"
        );
        Ok(PathVariantTable {
            key: key.clone(),
            bindings,
            version: registry.version(),
            variants,
        })
    }
}
