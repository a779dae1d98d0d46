use anticipate_templates::{TemplateError, TemplateKey};
use anticipate_vdom::VdomError;
use thiserror::Error;

pub type SimulationResult<T> = Result<T, SimulationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The table would need more than the configured number of bindings;
    /// the node falls back to authoritative reconciliation.
    #[error("Conditional '{key}' depends on {bindings} bindings, limit is {max}")]
    Explosion {
        key: TemplateKey,
        bindings: usize,
        max: usize,
    },

    #[error("Conditional '{key}' repeats inside loop '{loop_key}'")]
    InsideLoop {
        key: TemplateKey,
        loop_key: TemplateKey,
    },

    #[error("'{key}' is not a conditional template")]
    NotConditional { key: TemplateKey },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Vdom(#[from] VdomError),
}
