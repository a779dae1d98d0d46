use anticipate_simulator::SimulationError;
use anticipate_templates::{StructuralVersion, TemplateError};
use anticipate_vdom::VdomError;
use std::path::PathBuf;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Component '{id}' is not mounted")]
    UnknownComponent { id: String },

    #[error("Component '{id}' is already mounted")]
    AlreadyMounted { id: String },

    #[error("Message for component '{found}' sent to '{expected}'")]
    ComponentMismatch { expected: String, found: String },

    /// The sender's structure is older or newer than ours; resync required
    #[error("Structural version {found} does not match {expected}")]
    VersionMismatch {
        expected: StructuralVersion,
        found: StructuralVersion,
    },

    #[error("Invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Vdom(#[from] VdomError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
