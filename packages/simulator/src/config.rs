use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorConfig {
    /// Safety bound on the binding set of one table (2^n combinations)
    #[serde(default = "default_max_bindings")]
    pub max_bindings: usize,

    /// Also pin the bindings of conditionals that precede the node, or one
    /// of its ancestors, among their siblings. Without them a table only
    /// holds for the sibling state it was built under.
    #[serde(default = "default_include_sibling_bindings")]
    pub include_sibling_bindings: bool,
}

fn default_max_bindings() -> usize {
    20
}

fn default_include_sibling_bindings() -> bool {
    true
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_bindings: default_max_bindings(),
            include_sibling_bindings: default_include_sibling_bindings(),
        }
    }
}
