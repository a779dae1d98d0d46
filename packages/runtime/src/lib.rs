//! Authoritative component store and the remote mirror that predicts
//! against it

mod config;
mod error;
mod message;
mod mirror;
mod predict;
mod store;

pub use config::{EngineConfig, DEFAULT_CONFIG_NAME};
pub use error::{RuntimeError, RuntimeResult};
pub use message::{Confirmation, StateChange, StructureUpdate};
pub use mirror::{MirrorOutcome, Prediction, PredictionStats, RemoteMirror};
pub use store::ComponentStore;
