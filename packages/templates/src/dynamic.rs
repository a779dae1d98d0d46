//! Format strings with numbered slots, e.g. `"{0} of {1} done"`.
//! `{{` and `}}` escape literal braces.

use crate::binding::Binding;
use crate::error::{TemplateError, TemplateResult};
use crate::scope::Scope;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Part {
    Literal(String),
    Slot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDynamicText", into = "RawDynamicText")]
pub struct DynamicText {
    format: String,
    bindings: Vec<Binding>,
    /// Character offset of each slot placeholder in `format`, in order
    slots: Vec<usize>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct RawDynamicText {
    format: String,
    bindings: Vec<Binding>,
}

impl DynamicText {
    pub fn new(format: impl Into<String>, bindings: Vec<Binding>) -> TemplateResult<Self> {
        let format = format.into();
        let (parts, slots) = parse_format(&format)?;

        let mut used = vec![false; bindings.len()];
        for part in &parts {
            if let Part::Slot(index) = part {
                match used.get_mut(*index) {
                    Some(flag) => *flag = true,
                    None => {
                        return Err(TemplateError::SlotMismatch {
                            format,
                            slots: max_slot(&parts) + 1,
                            bindings: bindings.len(),
                        })
                    }
                }
            }
        }
        if used.iter().any(|flag| !flag) {
            let slots = used.iter().filter(|flag| **flag).count();
            return Err(TemplateError::SlotMismatch {
                format,
                slots,
                bindings: bindings.len(),
            });
        }

        Ok(Self {
            format,
            bindings,
            slots,
            parts,
        })
    }

    /// Parse binding sources and build in one step
    pub fn parse(format: impl Into<String>, bindings: &[&str]) -> TemplateResult<Self> {
        let bindings = bindings
            .iter()
            .map(|source| Binding::parse(source))
            .collect::<TemplateResult<Vec<_>>>()?;
        Self::new(format, bindings)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    pub fn render(&self, scope: &Scope<'_>) -> String {
        let mut out = String::with_capacity(self.format.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Slot(index) => {
                    if let Some(binding) = self.bindings.get(*index) {
                        out.push_str(&binding.resolve(scope).display());
                    }
                }
            }
        }
        out
    }
}

fn max_slot(parts: &[Part]) -> usize {
    parts
        .iter()
        .filter_map(|part| match part {
            Part::Slot(index) => Some(*index),
            Part::Literal(_) => None,
        })
        .max()
        .unwrap_or(0)
}

fn parse_format(format: &str) -> TemplateResult<(Vec<Part>, Vec<usize>)> {
    let fail = |reason: String| TemplateError::InvalidFormat {
        format: format.to_string(),
        reason,
    };

    let mut parts = Vec::new();
    let mut slots = Vec::new();
    let mut literal = String::new();
    let mut chars = format.chars().enumerate().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' if chars.peek().map(|(_, c)| *c) == Some('{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().map(|(_, c)| *c) == Some('}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, d)) if d.is_ascii_digit() => digits.push(d),
                        Some((at, other)) => {
                            return Err(fail(format!("unexpected '{}' in slot at {}", other, at)))
                        }
                        None => return Err(fail(format!("unterminated slot at {}", offset))),
                    }
                }
                let index = digits
                    .parse()
                    .map_err(|_| fail(format!("empty slot at {}", offset)))?;
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                parts.push(Part::Slot(index));
                slots.push(offset);
            }
            '}' => return Err(fail(format!("unmatched '}}' at {}", offset))),
            _ => literal.push(c),
        }
    }
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }

    Ok((parts, slots))
}

impl TryFrom<RawDynamicText> for DynamicText {
    type Error = TemplateError;

    fn try_from(raw: RawDynamicText) -> TemplateResult<Self> {
        DynamicText::new(raw.format, raw.bindings)
    }
}

impl From<DynamicText> for RawDynamicText {
    fn from(text: DynamicText) -> Self {
        RawDynamicText {
            format: text.format,
            bindings: text.bindings,
        }
    }
}

/// Text content or attribute value: a literal or a dynamic format.
///
/// In the artifact a plain JSON string is static; an object with `format`
/// and `bindings` is dynamic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Static(String),
    Dynamic(DynamicText),
}

impl TextValue {
    pub fn render(&self, scope: &Scope<'_>) -> String {
        match self {
            TextValue::Static(text) => text.clone(),
            TextValue::Dynamic(dynamic) => dynamic.render(scope),
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        match self {
            TextValue::Static(_) => &[],
            TextValue::Dynamic(dynamic) => dynamic.bindings(),
        }
    }
}

impl From<&str> for TextValue {
    fn from(text: &str) -> Self {
        TextValue::Static(text.to_string())
    }
}

impl From<DynamicText> for TextValue {
    fn from(dynamic: DynamicText) -> Self {
        TextValue::Dynamic(dynamic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::StateSnapshot;
    use serde_json::json;

    #[test]
    fn test_render_slots() {
        let state = StateSnapshot::from(json!({"done": 2, "total": 5}));
        let text = DynamicText::parse("{0} of {1} done", &["done", "total"]).unwrap();
        assert_eq!(text.render(&Scope::new(&state)), "2 of 5 done");
        assert_eq!(text.slots(), &[0, 7]);
    }

    #[test]
    fn test_repeated_slot_and_escapes() {
        let state = StateSnapshot::from(json!({"n": "x"}));
        let text = DynamicText::parse("{{{0}}} {0}", &["n"]).unwrap();
        assert_eq!(text.render(&Scope::new(&state)), "{x} x");
    }

    #[test]
    fn test_missing_binding_renders_empty() {
        let state = StateSnapshot::new();
        let text = DynamicText::parse("Hello, {0}!", &["user.name"]).unwrap();
        assert_eq!(text.render(&Scope::new(&state)), "Hello, !");
    }

    #[test]
    fn test_slot_binding_mismatch() {
        assert!(matches!(
            DynamicText::parse("{0} {1}", &["a"]),
            Err(TemplateError::SlotMismatch { bindings: 1, .. })
        ));
        assert!(matches!(
            DynamicText::parse("{0}", &["a", "b"]),
            Err(TemplateError::SlotMismatch { slots: 1, bindings: 2, .. })
        ));
        assert!(matches!(
            DynamicText::parse("{x}", &["a"]),
            Err(TemplateError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_text_value_json() {
        let value: TextValue = serde_json::from_value(json!("plain")).unwrap();
        assert_eq!(value, TextValue::Static("plain".into()));

        let value: TextValue =
            serde_json::from_value(json!({"format": "Hi {0}", "bindings": ["name"]})).unwrap();
        assert!(matches!(value, TextValue::Dynamic(_)));

        assert!(serde_json::from_value::<TextValue>(
            json!({"format": "Hi {0} {1}", "bindings": ["name"]})
        )
        .is_err());
    }
}
