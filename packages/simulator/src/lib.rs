//! Conditional path simulation
//!
//! For every conditional outside a loop, enumerate the truth values of the
//! bindings that can move or hide it, render each combination once, and
//! record where the node materializes. Clients look up the current
//! combination to predict patches without a round trip.

mod config;
mod error;
mod signature;
mod simulator;
mod variant;

pub use config::SimulatorConfig;
pub use error::{SimulationError, SimulationResult};
pub use signature::StateSignature;
pub use simulator::{SimulationReport, Simulator};
pub use variant::{PathVariant, PathVariantTable};
