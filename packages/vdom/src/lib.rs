//! # Anticipate VDOM
//!
//! Path-addressed render trees, the reconciler that diffs two renders into
//! an ordered patch list, Path Conversion to flat index paths, and patch
//! application against a materialized tree.

mod conversion;
mod dom;
mod error;
mod index_path;
mod patch;
mod reconciler;
mod validation;
mod vnode;

pub use conversion::{index_path_of, Conversion};
pub use dom::{apply_patch, apply_patches, DomNode};
pub use error::{VdomError, VdomResult};
pub use index_path::IndexPath;
pub use patch::{Patch, PatchKind};
pub use reconciler::{mount_patches, reconcile, reconcile_with_stats, ReconcileStats, Reconciler};
pub use validation::{validate, ValidationConfig};
pub use vnode::{NodeKind, VElement, VNode, VNull, VText};
