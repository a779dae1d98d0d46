pub mod diff;
pub mod place;
pub mod render;
pub mod simulate;
pub mod watch;

pub use diff::{diff, DiffArgs};
pub use place::{place, PlaceArgs};
pub use render::{render, RenderArgs};
pub use simulate::{simulate, SimulateArgs};
pub use watch::{watch, WatchArgs};

use anticipate_templates::{StateSnapshot, TemplateArtifact};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

pub(crate) fn read_artifact(path: &Path) -> Result<TemplateArtifact> {
    read_json(path)
}

/// State snapshot from `path`, or an empty one
pub(crate) fn read_state(path: Option<&Path>) -> Result<StateSnapshot> {
    match path {
        Some(path) => Ok(StateSnapshot::from(read_json::<serde_json::Value>(path)?)),
        None => Ok(StateSnapshot::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anticipate_templates::StateValue;

    #[test]
    fn test_read_state_from_file() {
        let path = std::env::temp_dir().join(format!("anticipate-state-{}.json", std::process::id()));
        fs::write(&path, r#"{"count": 2, "open": true}"#).unwrap();

        let state = read_state(Some(&path)).unwrap();
        assert_eq!(state.get("count"), Some(&StateValue::Number(2.0)));
        assert_eq!(state.get("open"), Some(&StateValue::Bool(true)));

        fs::remove_file(&path).unwrap();
        assert!(read_state(Some(&path)).is_err());
        assert!(read_state(None).unwrap().is_empty());
    }
}
