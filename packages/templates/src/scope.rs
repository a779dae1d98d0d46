use crate::value::{StateSnapshot, StateValue};
use std::collections::BTreeMap;

/// Boolean values pinned per binding source text
pub type Overrides = BTreeMap<String, bool>;

/// What bindings resolve against during one evaluation: the snapshot, loop
/// variables currently in scope, and optional pinned truth values.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    state: &'a StateSnapshot,
    locals: Vec<(String, StateValue)>,
    overrides: Option<&'a Overrides>,
}

impl<'a> Scope<'a> {
    pub fn new(state: &'a StateSnapshot) -> Self {
        Self {
            state,
            locals: Vec::new(),
            overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: &'a Overrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn with_local(mut self, name: impl Into<String>, value: StateValue) -> Self {
        self.push_local(name, value);
        self
    }

    pub fn push_local(&mut self, name: impl Into<String>, value: StateValue) {
        self.locals.push((name.into(), value));
    }

    pub fn pop_local(&mut self) {
        self.locals.pop();
    }

    pub fn state(&self) -> &'a StateSnapshot {
        self.state
    }

    /// Innermost local first, then the snapshot
    pub fn lookup(&self, root: &str) -> Option<&StateValue> {
        self.locals
            .iter()
            .rev()
            .find(|(name, _)| name == root)
            .map(|(_, value)| value)
            .or_else(|| self.state.get(root))
    }

    pub fn override_for(&self, source: &str) -> Option<bool> {
        self.overrides.and_then(|overrides| overrides.get(source).copied())
    }
}
