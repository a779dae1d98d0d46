//! # Anticipate Templates
//!
//! A path-keyed registry of parameterized fragments, extracted once per
//! structural version and evaluated against state snapshots so a state
//! change can be rendered without re-running the authoring layer.

mod binding;
mod condition;
mod dynamic;
mod error;
mod fragment;
mod registry;
mod render;
mod scope;
mod value;

pub use binding::{Binding, Resolution, Segment};
pub use condition::{Condition, Expr};
pub use dynamic::{DynamicText, TextValue};
pub use error::{TemplateError, TemplateResult};
pub use fragment::{Fragment, TemplateArtifact};
pub use registry::{
    Branch, Evaluation, Gate, StructuralVersion, Template, TemplateEntry, TemplateKey,
    TemplateRegistry,
};
pub use scope::{Overrides, Scope};
pub use value::{StateSnapshot, StateValue};
