use crate::dom::DomNode;
use crate::index_path::IndexPath;
use serde::{Deserialize, Serialize};

/// One atomic mutation of a materialized tree.
///
/// Every patch carries an absolute value, so re-applying a patch whose
/// effect is already present leaves the tree unchanged. Patches from one
/// diff must be applied in emission order: each index path is valid for
/// the tree as left by the patches before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Patch {
    /// Mount a whole tree into an empty target
    Create { path: IndexPath, node: DomNode },
    UpdateText { path: IndexPath, content: String },
    SetAttribute {
        path: IndexPath,
        name: String,
        value: String,
    },
    RemoveAttribute { path: IndexPath, name: String },
    /// Insert `node` so it ends up at `path`, shifting later siblings
    Insert { path: IndexPath, node: DomNode },
    Remove { path: IndexPath },
    Replace { path: IndexPath, node: DomNode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchKind {
    Create,
    UpdateText,
    SetAttribute,
    RemoveAttribute,
    Insert,
    Remove,
    Replace,
}

impl Patch {
    pub fn path(&self) -> &IndexPath {
        match self {
            Patch::Create { path, .. }
            | Patch::UpdateText { path, .. }
            | Patch::SetAttribute { path, .. }
            | Patch::RemoveAttribute { path, .. }
            | Patch::Insert { path, .. }
            | Patch::Remove { path }
            | Patch::Replace { path, .. } => path,
        }
    }

    pub fn kind(&self) -> PatchKind {
        match self {
            Patch::Create { .. } => PatchKind::Create,
            Patch::UpdateText { .. } => PatchKind::UpdateText,
            Patch::SetAttribute { .. } => PatchKind::SetAttribute,
            Patch::RemoveAttribute { .. } => PatchKind::RemoveAttribute,
            Patch::Insert { .. } => PatchKind::Insert,
            Patch::Remove { .. } => PatchKind::Remove,
            Patch::Replace { .. } => PatchKind::Replace,
        }
    }

    /// True for patches that change the shape of the tree
    pub fn is_structural(&self) -> bool {
        matches!(
            self.kind(),
            PatchKind::Create | PatchKind::Insert | PatchKind::Remove | PatchKind::Replace
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let patch = Patch::SetAttribute {
            path: IndexPath::from(vec![0, 2]),
            name: "class".to_string(),
            value: "active".to_string(),
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "setAttribute", "path": [0, 2], "name": "class", "value": "active"})
        );

        let insert = Patch::Insert {
            path: IndexPath::from(vec![1]),
            node: DomNode::text("hi"),
        };
        let json = serde_json::to_value(&insert).unwrap();
        assert_eq!(json["op"], "insert");
        assert_eq!(json["node"]["type"], "Text");
        assert_eq!(serde_json::from_value::<Patch>(json).unwrap(), insert);
    }
}
