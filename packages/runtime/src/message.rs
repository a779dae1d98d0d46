//! Messages exchanged between the authoritative store and remote mirrors

use anticipate_simulator::PathVariantTable;
use anticipate_templates::{StateSnapshot, StateValue, StructuralVersion, TemplateArtifact, TemplateKey};
use anticipate_vdom::Patch;
use serde::{Deserialize, Serialize};

/// One binding of one component instance set to a new value.
///
/// `sequence` is assigned by the sender and strictly increases per
/// instance; the store ignores anything not newer than the last change it
/// applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub component_id: String,
    /// Binding source text, e.g. `user.name` or `items[0].done`
    pub binding: String,
    pub value: StateValue,
    pub sequence: u64,
}

/// Authoritative patches for an applied state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub component_id: String,
    pub sequence: u64,
    pub version: StructuralVersion,
    pub patches: Vec<Patch>,
}

/// Everything a mirror needs for one structural version: the template
/// artifact, the state it was rendered with, and the precomputed tables.
/// Sent on mount and on every hot reload that changes structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureUpdate {
    pub component_id: String,
    pub version: StructuralVersion,
    pub fingerprint: u32,
    /// Last state change folded into `state`
    pub sequence: u64,
    pub artifact: TemplateArtifact,
    pub state: StateSnapshot,
    pub patches: Vec<Patch>,
    pub tables: Vec<PathVariantTable>,
    /// Conditionals left to authoritative reconciliation
    #[serde(default)]
    pub unavailable: Vec<TemplateKey>,
}
