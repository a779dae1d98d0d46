use anticipate_templates::{Binding, Overrides, Scope, StateSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical encoding of boolean binding values: `name:bool` pairs sorted
/// by name and comma-joined, e.g. `isAdmin:false,loggedIn:true`. The empty
/// set encodes as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSignature(String);

impl StateSignature {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let mut pairs: Vec<(&str, bool)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs.dedup_by(|a, b| a.0 == b.0);

        let mut encoded = String::new();
        for (i, (name, value)) in pairs.iter().enumerate() {
            if i > 0 {
                encoded.push(',');
            }
            encoded.push_str(name);
            encoded.push(':');
            encoded.push_str(if *value { "true" } else { "false" });
        }
        Self(encoded)
    }

    pub fn from_assignment(assignment: &Overrides) -> Self {
        Self::from_pairs(assignment.iter().map(|(name, value)| (name.as_str(), *value)))
    }

    /// Truth values of `bindings` under live state
    pub fn from_state(bindings: &[Binding], state: &StateSnapshot) -> Self {
        let scope = Scope::new(state);
        Self::from_pairs(
            bindings
                .iter()
                .map(|binding| (binding.source(), binding.resolve(&scope).is_truthy())),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs_are_sorted() {
        let signature = StateSignature::from_pairs([("loggedIn", true), ("isAdmin", false)]);
        assert_eq!(signature.as_str(), "isAdmin:false,loggedIn:true");
        assert_eq!(StateSignature::from_pairs([]).as_str(), "");
    }

    #[test]
    fn test_state_and_assignment_agree() {
        let bindings = vec![
            Binding::parse("user.isAdmin").unwrap(),
            Binding::parse("open").unwrap(),
        ];
        let state = StateSnapshot::from(json!({"user": {"isAdmin": 1}, "open": ""}));

        let mut assignment = Overrides::new();
        assignment.insert("user.isAdmin".to_string(), true);
        assignment.insert("open".to_string(), false);

        assert_eq!(
            StateSignature::from_state(&bindings, &state),
            StateSignature::from_assignment(&assignment)
        );
    }
}
