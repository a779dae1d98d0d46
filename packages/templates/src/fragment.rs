//! The build-time artifact: a component's render tree with every node
//! addressed, and dynamic parts expressed as templates.

use crate::binding::Binding;
use crate::condition::Condition;
use crate::dynamic::TextValue;
use anticipate_path::Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateArtifact {
    pub component: String,
    pub root: Fragment,
}

impl TemplateArtifact {
    pub fn new(component: impl Into<String>, root: Fragment) -> Self {
        Self {
            component: component.into(),
            root,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Fragment {
    Element {
        path: Path,
        tag: String,
        #[serde(default)]
        attributes: IndexMap<String, TextValue>,
        #[serde(default)]
        children: Vec<Fragment>,
    },
    Text {
        path: Path,
        text: TextValue,
    },
    /// Both branches are rooted at the conditional's own path. A missing
    /// branch renders a Null placeholder.
    Conditional {
        path: Path,
        condition: Condition,
        #[serde(default, rename = "then", skip_serializing_if = "Option::is_none")]
        then_branch: Option<Box<Fragment>>,
        #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
        else_branch: Option<Box<Fragment>>,
    },
    /// Renders a `tag` container with one child per collection item. The
    /// body's paths are relative to the item root: item `i` is rendered at
    /// `path.child(i)`.
    Loop {
        path: Path,
        tag: String,
        collection: Binding,
        #[serde(default = "default_item_var")]
        item: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<String>,
        body: Box<Fragment>,
    },
}

fn default_item_var() -> String {
    "item".to_string()
}

impl Fragment {
    pub fn path(&self) -> &Path {
        match self {
            Fragment::Element { path, .. }
            | Fragment::Text { path, .. }
            | Fragment::Conditional { path, .. }
            | Fragment::Loop { path, .. } => path,
        }
    }

    pub fn element(path: Path, tag: impl Into<String>) -> Self {
        Fragment::Element {
            path,
            tag: tag.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn text(path: Path, text: impl Into<TextValue>) -> Self {
        Fragment::Text {
            path,
            text: text.into(),
        }
    }

    pub fn conditional(
        path: Path,
        condition: Condition,
        then_branch: Option<Fragment>,
        else_branch: Option<Fragment>,
    ) -> Self {
        Fragment::Conditional {
            path,
            condition,
            then_branch: then_branch.map(Box::new),
            else_branch: else_branch.map(Box::new),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<TextValue>) -> Self {
        if let Fragment::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(name.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: Fragment) -> Self {
        if let Fragment::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    /// Every binding referenced by this fragment's own content, not
    /// descending into children
    pub fn own_bindings(&self) -> Vec<&Binding> {
        match self {
            Fragment::Element { attributes, .. } => {
                attributes.values().flat_map(TextValue::bindings).collect()
            }
            Fragment::Text { text, .. } => text.bindings().iter().collect(),
            Fragment::Conditional { condition, .. } => condition.bindings(),
            Fragment::Loop { collection, .. } => vec![collection],
        }
    }

    pub fn children(&self) -> &[Fragment] {
        match self {
            Fragment::Element { children, .. } => children,
            _ => &[],
        }
    }
}
