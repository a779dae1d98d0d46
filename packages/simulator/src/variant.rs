use crate::signature::StateSignature;
use anticipate_templates::{Binding, StateSnapshot, StructuralVersion, TemplateKey};
use anticipate_vdom::{Conversion, IndexPath};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Materialized location of a conditional node under one combination of
/// binding values. Serialized as an index array, or `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<IndexPath>", into = "Option<IndexPath>")]
pub enum PathVariant {
    At(IndexPath),
    Absent,
}

impl PathVariant {
    pub fn index_path(&self) -> Option<&IndexPath> {
        match self {
            PathVariant::At(index_path) => Some(index_path),
            PathVariant::Absent => None,
        }
    }
}

impl From<Conversion> for PathVariant {
    fn from(conversion: Conversion) -> Self {
        match conversion {
            Conversion::At(index_path) => PathVariant::At(index_path),
            Conversion::Absent => PathVariant::Absent,
        }
    }
}

impl From<Option<IndexPath>> for PathVariant {
    fn from(value: Option<IndexPath>) -> Self {
        value.map_or(PathVariant::Absent, PathVariant::At)
    }
}

impl From<PathVariant> for Option<IndexPath> {
    fn from(variant: PathVariant) -> Self {
        match variant {
            PathVariant::At(index_path) => Some(index_path),
            PathVariant::Absent => None,
        }
    }
}

/// Precomputed locations of one conditional for every reachable
/// combination of its bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathVariantTable {
    pub key: TemplateKey,
    /// Sorted by source text
    pub bindings: Vec<Binding>,
    pub version: StructuralVersion,
    pub variants: BTreeMap<StateSignature, PathVariant>,
}

impl PathVariantTable {
    pub fn signature(&self, state: &StateSnapshot) -> StateSignature {
        StateSignature::from_state(&self.bindings, state)
    }

    pub fn lookup(&self, state: &StateSnapshot) -> Option<&PathVariant> {
        self.variants.get(&self.signature(state))
    }

    pub fn lookup_signature(&self, signature: &StateSignature) -> Option<&PathVariant> {
        self.variants.get(signature)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// True when `root` is the state root of any binding in this table
    pub fn reads(&self, root: &str) -> bool {
        self.bindings.iter().any(|binding| binding.root() == root)
    }
}
