//! Input limits and structural checks for rendered trees

use crate::error::{VdomError, VdomResult};
use crate::vnode::VNode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    #[serde(default = "default_max_children")]
    pub max_children: usize,

    #[serde(default = "default_max_attribute_name_length")]
    pub max_attribute_name_length: usize,

    #[serde(default = "default_max_attribute_value_length")]
    pub max_attribute_value_length: usize,

    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

fn default_max_depth() -> usize {
    100
}

fn default_max_nodes() -> usize {
    10_000
}

fn default_max_children() -> usize {
    1_000
}

fn default_max_attribute_name_length() -> usize {
    256
}

fn default_max_attribute_value_length() -> usize {
    4_096
}

fn default_max_text_length() -> usize {
    1024 * 1024
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_nodes: default_max_nodes(),
            max_children: default_max_children(),
            max_attribute_name_length: default_max_attribute_name_length(),
            max_attribute_value_length: default_max_attribute_value_length(),
            max_text_length: default_max_text_length(),
        }
    }
}

/// Check a tree against `config`.
///
/// Besides the size limits this enforces the addressing invariants the
/// reconciler relies on: every child's path is a direct child of its
/// parent's path, and siblings are strictly increasing.
pub fn validate(tree: &VNode, config: &ValidationConfig) -> VdomResult<()> {
    let nodes = tree.count_nodes();
    if nodes > config.max_nodes {
        return Err(VdomError::TreeTooLarge {
            nodes,
            max: config.max_nodes,
        });
    }
    validate_node(tree, 0, config)
}

fn validate_node(node: &VNode, depth: usize, config: &ValidationConfig) -> VdomResult<()> {
    if depth > config.max_depth {
        return Err(VdomError::TreeTooDeep {
            depth,
            max: config.max_depth,
        });
    }

    match node {
        VNode::Null(_) => Ok(()),
        VNode::Text(text) => {
            if text.content.len() > config.max_text_length {
                return Err(VdomError::TextTooLong {
                    path: text.path.clone(),
                    length: text.content.len(),
                    max: config.max_text_length,
                });
            }
            Ok(())
        }
        VNode::Element(element) => {
            if element.children.len() > config.max_children {
                return Err(VdomError::TooManyChildren {
                    path: element.path.clone(),
                    count: element.children.len(),
                    max: config.max_children,
                });
            }

            for (name, value) in &element.attributes {
                let (length, max) = if name.len() > config.max_attribute_name_length {
                    (name.len(), config.max_attribute_name_length)
                } else if value.len() > config.max_attribute_value_length {
                    (value.len(), config.max_attribute_value_length)
                } else {
                    continue;
                };
                return Err(VdomError::AttributeTooLong {
                    path: element.path.clone(),
                    name: name.clone(),
                    length,
                    max,
                });
            }

            for child in &element.children {
                if !element.path.is_parent_of(child.path()) {
                    return Err(VdomError::MisplacedChild {
                        parent: element.path.clone(),
                        child: child.path().clone(),
                    });
                }
            }

            for pair in element.children.windows(2) {
                if pair[0].path() >= pair[1].path() {
                    return Err(VdomError::UnorderedSiblings {
                        parent: element.path.clone(),
                        left: pair[0].path().clone(),
                        right: pair[1].path().clone(),
                    });
                }
            }

            for child in &element.children {
                validate_node(child, depth + 1, config)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anticipate_path::Path;

    fn p(s: &str) -> Path {
        s.parse().unwrap()
    }

    #[test]
    fn test_valid_tree_passes() {
        let tree = VNode::element(Path::root(), "div")
            .with_child(VNode::text(p("10"), "a"))
            .with_child(VNode::null(p("20")));
        assert!(validate(&tree, &ValidationConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_unordered_siblings() {
        let tree = VNode::element(Path::root(), "div")
            .with_child(VNode::text(p("20"), "b"))
            .with_child(VNode::text(p("10"), "a"));
        assert!(matches!(
            validate(&tree, &ValidationConfig::default()),
            Err(VdomError::UnorderedSiblings { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_sibling_paths() {
        let tree = VNode::element(Path::root(), "div")
            .with_child(VNode::text(p("10"), "a"))
            .with_child(VNode::null(p("10")));
        assert!(matches!(
            validate(&tree, &ValidationConfig::default()),
            Err(VdomError::UnorderedSiblings { .. })
        ));
    }

    #[test]
    fn test_rejects_grandchild_path_under_parent() {
        let tree = VNode::element(Path::root(), "div").with_child(VNode::text(p("10.20"), "a"));
        assert!(matches!(
            validate(&tree, &ValidationConfig::default()),
            Err(VdomError::MisplacedChild { .. })
        ));
    }

    #[test]
    fn test_size_limits() {
        let config = ValidationConfig {
            max_depth: 1,
            max_children: 2,
            max_text_length: 3,
            ..ValidationConfig::default()
        };

        let deep = VNode::element(Path::root(), "a")
            .with_child(VNode::element(p("1"), "b").with_child(VNode::text(p("1.1"), "c")));
        assert!(matches!(
            validate(&deep, &config),
            Err(VdomError::TreeTooDeep { depth: 2, max: 1 })
        ));

        let wide = VNode::element(Path::root(), "a").with_children(
            (1..=3u64).map(|i| VNode::null(Path::root().with_segment(i).unwrap())),
        );
        assert!(matches!(
            validate(&wide, &config),
            Err(VdomError::TooManyChildren { count: 3, .. })
        ));

        let long = VNode::text(Path::root(), "abcd");
        assert!(matches!(
            validate(&long, &config),
            Err(VdomError::TextTooLong { length: 4, .. })
        ));
    }

    #[test]
    fn test_attribute_limits() {
        let config = ValidationConfig {
            max_attribute_value_length: 4,
            ..ValidationConfig::default()
        };
        let tree = VNode::element(Path::root(), "a").with_attr("href", "https://example.com");
        assert!(matches!(
            validate(&tree, &config),
            Err(VdomError::AttributeTooLong { ref name, .. }) if name == "href"
        ));
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: ValidationConfig = serde_json::from_str(r#"{"maxDepth": 12}"#).unwrap();
        assert_eq!(config.max_depth, 12);
        assert_eq!(config.max_nodes, 10_000);
        assert_eq!(config.max_children, 1_000);
    }
}
