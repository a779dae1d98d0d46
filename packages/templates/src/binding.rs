//! Typed accessors compiled once from binding source text

use crate::error::{TemplateError, TemplateResult};
use crate::scope::Scope;
use crate::value::{StateSnapshot, StateValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A compiled reference into the state snapshot, e.g. `user.address.city`
/// or `items[0].name`.
///
/// The first segment is always a key: either a loop variable in scope or a
/// root key of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Binding {
    source: String,
    segments: Vec<Segment>,
}

/// Outcome of resolving a binding. Missing data is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Value(StateValue),
    /// `missing` is the accessor prefix that did not resolve
    Undefined { missing: String },
}

impl Resolution {
    pub fn is_truthy(&self) -> bool {
        match self {
            Resolution::Value(value) => value.is_truthy(),
            Resolution::Undefined { .. } => false,
        }
    }

    pub fn value(&self) -> Option<&StateValue> {
        match self {
            Resolution::Value(value) => Some(value),
            Resolution::Undefined { .. } => None,
        }
    }

    /// Text substituted into a slot; undefined renders as the empty string
    pub fn display(&self) -> String {
        match self {
            Resolution::Value(value) => value.to_string(),
            Resolution::Undefined { .. } => String::new(),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

impl Binding {
    pub fn parse(source: &str) -> TemplateResult<Self> {
        let fail = |reason: &str| TemplateError::InvalidBinding {
            source_text: source.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut chars = source.trim().char_indices().peekable();
        let trimmed = source.trim();
        let mut expect_key = true;

        while let Some(&(start, c)) = chars.peek() {
            if expect_key {
                if !is_ident_start(c) {
                    return Err(fail("expected an identifier"));
                }
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                segments.push(Segment::Key(trimmed[start..end].to_string()));
                expect_key = false;
                continue;
            }

            match c {
                '.' => {
                    chars.next();
                    expect_key = true;
                }
                '[' => {
                    chars.next();
                    let mut digits = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if !c.is_ascii_digit() {
                            break;
                        }
                        digits.push(c);
                        chars.next();
                    }
                    if chars.next().map(|(_, c)| c) != Some(']') {
                        return Err(fail("unterminated index"));
                    }
                    let index = digits.parse().map_err(|_| fail("index must be a number"))?;
                    segments.push(Segment::Index(index));
                }
                _ => return Err(fail("unexpected character")),
            }
        }

        if segments.is_empty() || expect_key {
            return Err(fail("expected an identifier"));
        }

        Ok(Self {
            source: trimmed.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// First key; what state changes and dependency tracking key on
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(Segment::Key(key)) => key,
            _ => &self.source,
        }
    }

    pub fn resolve(&self, scope: &Scope<'_>) -> Resolution {
        let Some(mut current) = scope.lookup(self.root()) else {
            return self.undefined(1);
        };

        for (depth, segment) in self.segments.iter().enumerate().skip(1) {
            let next = match (segment, current) {
                (Segment::Key(key), StateValue::Map(map)) => map.get(key),
                (Segment::Index(index), StateValue::Array(items)) => items.get(*index),
                (Segment::Key(key), StateValue::Array(items)) if key == "length" => {
                    if depth + 1 == self.segments.len() {
                        return Resolution::Value(StateValue::Number(items.len() as f64));
                    }
                    None
                }
                (Segment::Key(key), StateValue::String(s)) if key == "length" => {
                    if depth + 1 == self.segments.len() {
                        return Resolution::Value(StateValue::Number(s.chars().count() as f64));
                    }
                    None
                }
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return self.undefined(depth + 1),
            }
        }

        Resolution::Value(current.clone())
    }

    /// Write `value` at this binding's location. Missing keys (and nulls
    /// on the way) become maps; array elements must already exist.
    pub fn assign(&self, state: &mut StateSnapshot, value: StateValue) -> TemplateResult<()> {
        let mut current = state.entry(self.root());
        for segment in self.segments.iter().skip(1) {
            current = descend(current, segment).map_err(|reason| TemplateError::InvalidBinding {
                source_text: self.source.clone(),
                reason,
            })?;
        }
        *current = value;
        Ok(())
    }

    fn undefined(&self, resolved_segments: usize) -> Resolution {
        let missing = render_segments(&self.segments[..resolved_segments]);
        debug!(binding = %self.source, missing = %missing, "Binding resolved to undefined");
        Resolution::Undefined { missing }
    }
}

fn descend<'v>(value: &'v mut StateValue, segment: &Segment) -> Result<&'v mut StateValue, String> {
    if matches!((&*value, segment), (StateValue::Null, Segment::Key(_))) {
        *value = StateValue::Map(IndexMap::new());
    }
    match (segment, value) {
        (Segment::Key(key), StateValue::Map(map)) => Ok(map.entry(key.clone()).or_default()),
        (Segment::Index(index), StateValue::Array(items)) => {
            let length = items.len();
            items
                .get_mut(*index)
                .ok_or_else(|| format!("index {} out of bounds for length {}", index, length))
        }
        (_, other) => Err(format!("cannot assign into {}", other.type_name())),
    }
}

fn render_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Key(key) => {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(key);
            }
            Segment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for Binding {
    type Error = TemplateError;

    fn try_from(source: String) -> TemplateResult<Self> {
        Binding::parse(&source)
    }
}

impl From<Binding> for String {
    fn from(binding: Binding) -> Self {
        binding.source
    }
}
