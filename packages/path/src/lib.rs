//! # Anticipate Path Addressing
//!
//! Stable, insertion-tolerant identities for tree nodes.
//!
//! Every node produced by the authoring layer carries a [`Path`]. Paths are
//! assigned once, survive re-renders of the same logical node, and never
//! need global renumbering: a new sibling is placed at the midpoint of its
//! neighbors' slots ([`between`]). When a gap runs dry, [`PathSpace`]
//! renumbers just the affected sibling list and reports the moves as a
//! [`PathRemap`].

mod between;
mod error;
mod path;
mod space;

pub use between::between;
pub use error::{PathError, PathResult};
pub use path::{Path, SEGMENT_LIMIT, SEGMENT_WIDTH, SLOT_GAP};
pub use space::{Allocation, PathConfig, PathRemap, PathSpace};
