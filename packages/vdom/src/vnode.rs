use anticipate_path::{Path, PathRemap, PathResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One position in a rendered tree, addressed by its [`Path`].
///
/// Nodes are produced fresh by every render; identity across renders is
/// carried entirely by the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    Element(VElement),
    Text(VText),
    /// A conditional region that currently renders nothing. It keeps its
    /// path but occupies no slot in the materialized output.
    Null(VNull),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VElement {
    pub path: Path,
    pub tag: String,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    /// Sorted by path
    #[serde(default)]
    pub children: Vec<VNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VText {
    pub path: Path,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VNull {
    pub path: Path,
}

/// Node kind, used for replace decisions and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Null,
}

impl VNode {
    pub fn element(path: Path, tag: impl Into<String>) -> Self {
        VNode::Element(VElement {
            path,
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        })
    }

    pub fn text(path: Path, content: impl Into<String>) -> Self {
        VNode::Text(VText {
            path,
            content: content.into(),
        })
    }

    pub fn null(path: Path) -> Self {
        VNode::Null(VNull { path })
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element(ref mut element) = self {
            element.attributes.insert(name.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        if let VNode::Element(ref mut element) = self {
            element.children.push(child);
        }
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        if let VNode::Element(ref mut element) = self {
            element.children.extend(children);
        }
        self
    }

    pub fn path(&self) -> &Path {
        match self {
            VNode::Element(element) => &element.path,
            VNode::Text(text) => &text.path,
            VNode::Null(null) => &null.path,
        }
    }

    fn path_mut(&mut self) -> &mut Path {
        match self {
            VNode::Element(element) => &mut element.path,
            VNode::Text(text) => &mut text.path,
            VNode::Null(null) => &mut null.path,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            VNode::Element(_) => NodeKind::Element,
            VNode::Text(_) => NodeKind::Text,
            VNode::Null(_) => NodeKind::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, VNode::Null(_))
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element(element) => &element.children,
            _ => &[],
        }
    }

    /// Assign `path` to this node and gapped slots to every descendant, in
    /// child order. Used for trees produced without addresses.
    pub fn stamp(&mut self, path: Path) -> PathResult<()> {
        if let VNode::Element(element) = self {
            for (index, child) in element.children.iter_mut().enumerate() {
                child.stamp(path.child(index)?)?;
            }
        }
        *self.path_mut() = path;
        Ok(())
    }

    /// Rewrite every path moved by a rebalance
    pub fn remap_paths(&mut self, remap: &PathRemap) {
        if remap.is_empty() {
            return;
        }
        let moved = remap.resolve(self.path());
        *self.path_mut() = moved;
        if let VNode::Element(element) = self {
            for child in &mut element.children {
                child.remap_paths(remap);
            }
        }
    }

    /// Total nodes, Null placeholders included
    pub fn count_nodes(&self) -> usize {
        1 + self.children().iter().map(VNode::count_nodes).sum::<usize>()
    }

    /// Find the node at `path`
    pub fn find(&self, path: &Path) -> Option<&VNode> {
        if self.path() == path {
            return Some(self);
        }
        if !self.path().is_ancestor_of(path) {
            return None;
        }
        self.children()
            .iter()
            .find(|child| child.path().is_ancestor_or_self(path))
            .and_then(|child| child.find(path))
    }

    pub fn find_mut(&mut self, path: &Path) -> Option<&mut VNode> {
        if self.path() == path {
            return Some(self);
        }
        if !self.path().is_ancestor_of(path) {
            return None;
        }
        match self {
            VNode::Element(element) => element
                .children
                .iter_mut()
                .find(|child| child.path().is_ancestor_or_self(path))
                .and_then(|child| child.find_mut(path)),
            _ => None,
        }
    }

    /// Depth-first iterator over this node and all descendants
    pub fn walk(&self) -> impl Iterator<Item = &VNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }
}
