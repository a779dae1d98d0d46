//! The materialized tree as a remote consumer holds it: no paths, no Null
//! placeholders, addressed only by [`IndexPath`].

use crate::error::{VdomError, VdomResult};
use crate::index_path::IndexPath;
use crate::patch::Patch;
use crate::vnode::VNode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomNode {
    Element {
        tag: String,
        #[serde(default)]
        attributes: IndexMap<String, String>,
        #[serde(default)]
        children: Vec<DomNode>,
    },
    Text {
        content: String,
    },
}

impl DomNode {
    pub fn element(tag: impl Into<String>) -> Self {
        DomNode::Element {
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        DomNode::Text {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let DomNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(name.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: DomNode) -> Self {
        if let DomNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn children(&self) -> &[DomNode] {
        match self {
            DomNode::Element { children, .. } => children,
            DomNode::Text { .. } => &[],
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            DomNode::Element { .. } => "element",
            DomNode::Text { .. } => "text",
        }
    }

    pub fn at(&self, path: &IndexPath) -> Option<&DomNode> {
        path.as_slice()
            .iter()
            .try_fold(self, |node, &index| node.children().get(index))
    }

    fn at_mut(&mut self, indices: &[usize]) -> Option<&mut DomNode> {
        indices.iter().try_fold(self, |node, &index| match node {
            DomNode::Element { children, .. } => children.get_mut(index),
            DomNode::Text { .. } => None,
        })
    }

    /// Serialize back to markup, for diagnostics and the CLI
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            DomNode::Text { content } => escape_into(out, content, false),
            DomNode::Element {
                tag,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(out, value, true);
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn escape_into(out: &mut String, raw: &str, attribute: bool) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

impl VNode {
    /// Drop paths and Null placeholders. A Null root materializes to nothing.
    pub fn materialize(&self) -> Option<DomNode> {
        match self {
            VNode::Null(_) => None,
            VNode::Text(text) => Some(DomNode::text(text.content.clone())),
            VNode::Element(element) => Some(DomNode::Element {
                tag: element.tag.clone(),
                attributes: element.attributes.clone(),
                children: element
                    .children
                    .iter()
                    .filter_map(VNode::materialize)
                    .collect(),
            }),
        }
    }
}

/// Apply `patches` in order, checking each against the live tree first.
///
/// On error the patches before the failing one stay applied; callers treat
/// any error as a signal to resync from a full tree.
pub fn apply_patches(root: &mut Option<DomNode>, patches: &[Patch]) -> VdomResult<()> {
    for patch in patches {
        apply_patch(root, patch)?;
    }
    Ok(())
}

pub fn apply_patch(root: &mut Option<DomNode>, patch: &Patch) -> VdomResult<()> {
    let path = patch.path();
    trace!(index_path = %path, kind = ?patch.kind(), "Applying patch");

    match patch {
        Patch::Create { node, .. } => {
            if !path.is_root() {
                return Err(VdomError::invalid_patch(path, "create targets the root only"));
            }
            if root.is_some() {
                return Err(VdomError::invalid_patch(path, "target is not empty"));
            }
            *root = Some(node.clone());
        }

        Patch::UpdateText { content, .. } => match node_mut(root, path)? {
            DomNode::Text { content: current } => *current = content.clone(),
            other => {
                let found = other.kind_name();
                return Err(VdomError::invalid_patch(
                    path,
                    format!("expected text, found {}", found),
                ));
            }
        },

        Patch::SetAttribute { name, value, .. } => {
            attributes_mut(root, path)?.insert(name.clone(), value.clone());
        }

        Patch::RemoveAttribute { name, .. } => {
            attributes_mut(root, path)?.shift_remove(name);
        }

        Patch::Insert { node, .. } => {
            let (parent, index) = path
                .split_last()
                .ok_or_else(|| VdomError::invalid_patch(path, "insert needs a parent"))?;
            let children = children_mut(root, parent, path)?;
            if index > children.len() {
                return Err(VdomError::invalid_patch(
                    path,
                    format!("index {} past {} children", index, children.len()),
                ));
            }
            children.insert(index, node.clone());
        }

        Patch::Remove { .. } => match path.split_last() {
            None => {
                if root.take().is_none() {
                    return Err(VdomError::invalid_patch(path, "tree is empty"));
                }
            }
            Some((parent, index)) => {
                let children = children_mut(root, parent, path)?;
                if index >= children.len() {
                    return Err(VdomError::invalid_patch(
                        path,
                        format!("index {} out of {} children", index, children.len()),
                    ));
                }
                children.remove(index);
            }
        },

        Patch::Replace { node, .. } => {
            *node_mut(root, path)? = node.clone();
        }
    }

    Ok(())
}

fn node_mut<'a>(root: &'a mut Option<DomNode>, path: &IndexPath) -> VdomResult<&'a mut DomNode> {
    root.as_mut()
        .and_then(|node| node.at_mut(path.as_slice()))
        .ok_or_else(|| VdomError::invalid_patch(path, "no node at index path"))
}

fn attributes_mut<'a>(
    root: &'a mut Option<DomNode>,
    path: &IndexPath,
) -> VdomResult<&'a mut IndexMap<String, String>> {
    match node_mut(root, path)? {
        DomNode::Element { attributes, .. } => Ok(attributes),
        DomNode::Text { .. } => Err(VdomError::invalid_patch(
            path,
            "attribute patch on a text node",
        )),
    }
}

fn children_mut<'a>(
    root: &'a mut Option<DomNode>,
    parent: &[usize],
    path: &IndexPath,
) -> VdomResult<&'a mut Vec<DomNode>> {
    let node = root
        .as_mut()
        .and_then(|node| node.at_mut(parent))
        .ok_or_else(|| VdomError::invalid_patch(path, "parent does not exist"))?;
    match node {
        DomNode::Element { children, .. } => Ok(children),
        DomNode::Text { .. } => Err(VdomError::invalid_patch(path, "parent is a text node")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> DomNode {
        items.iter().fold(DomNode::element("ul"), |ul, item| {
            ul.with_child(DomNode::element("li").with_child(DomNode::text(*item)))
        })
    }

    #[test]
    fn test_create_into_empty_target() {
        let mut root = None;
        apply_patch(
            &mut root,
            &Patch::Create {
                path: IndexPath::root(),
                node: DomNode::text("hello"),
            },
        )
        .unwrap();
        assert_eq!(root, Some(DomNode::text("hello")));

        let again = apply_patch(
            &mut root,
            &Patch::Create {
                path: IndexPath::root(),
                node: DomNode::text("x"),
            },
        );
        assert!(matches!(again, Err(VdomError::InvalidPatch { .. })));
    }

    #[test]
    fn test_insert_and_remove_shift_siblings() {
        let mut root = Some(list(&["a", "c"]));
        apply_patches(
            &mut root,
            &[
                Patch::Insert {
                    path: IndexPath::from(vec![1]),
                    node: DomNode::element("li").with_child(DomNode::text("b")),
                },
                Patch::Remove {
                    path: IndexPath::from(vec![0]),
                },
            ],
        )
        .unwrap();
        assert_eq!(root, Some(list(&["b", "c"])));
    }

    #[test]
    fn test_rejects_out_of_range_and_mismatched_patches() {
        let mut root = Some(list(&["a"]));

        let past_end = Patch::Insert {
            path: IndexPath::from(vec![2]),
            node: DomNode::text("x"),
        };
        assert!(apply_patch(&mut root, &past_end).is_err());

        let text_on_element = Patch::UpdateText {
            path: IndexPath::from(vec![0]),
            content: "x".to_string(),
        };
        assert!(apply_patch(&mut root, &text_on_element).is_err());

        let attr_on_text = Patch::SetAttribute {
            path: IndexPath::from(vec![0, 0]),
            name: "id".to_string(),
            value: "x".to_string(),
        };
        assert!(apply_patch(&mut root, &attr_on_text).is_err());

        assert_eq!(root, Some(list(&["a"])));
    }

    #[test]
    fn test_attribute_patches_are_idempotent() {
        let mut root = Some(DomNode::element("div").with_attr("class", "a"));
        let patches = [
            Patch::SetAttribute {
                path: IndexPath::root(),
                name: "class".to_string(),
                value: "b".to_string(),
            },
            Patch::RemoveAttribute {
                path: IndexPath::root(),
                name: "title".to_string(),
            },
        ];
        apply_patches(&mut root, &patches).unwrap();
        apply_patches(&mut root, &patches).unwrap();
        assert_eq!(root, Some(DomNode::element("div").with_attr("class", "b")));
    }

    #[test]
    fn test_remove_root() {
        let mut root = Some(DomNode::text("x"));
        apply_patch(&mut root, &Patch::Remove { path: IndexPath::root() }).unwrap();
        assert!(root.is_none());
    }

    #[test]
    fn test_materialize_skips_null() {
        use anticipate_path::Path;
        let tree = VNode::element(Path::root(), "p")
            .with_child(VNode::null(Path::root().child(0).unwrap()))
            .with_child(VNode::text(Path::root().child(1).unwrap(), "x"));
        assert_eq!(
            tree.materialize(),
            Some(DomNode::element("p").with_child(DomNode::text("x")))
        );
        assert_eq!(tree.materialize().unwrap().to_html(), "<p>x</p>");
    }

    #[test]
    fn test_html_escapes_markup_characters() {
        let node = DomNode::element("p")
            .with_attr("title", "a \"b\" & <c>")
            .with_child(DomNode::text("1 < 2 && 3 > 2"));
        assert_eq!(
            node.to_html(),
            "<p title=\"a &quot;b&quot; &amp; &lt;c&gt;\">1 &lt; 2 &amp;&amp; 3 &gt; 2</p>"
        );
    }
}
