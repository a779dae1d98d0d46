#![allow(dead_code)]

use anticipate_templates::{StateSnapshot, TemplateArtifact};
use anticipate_vdom::VNode;
use serde_json::json;

pub const ACCOUNT: &str = r#"{
  "component": "Account",
  "root": {
    "kind": "element", "path": "", "tag": "div",
    "children": [
      {"kind": "element", "path": "1", "tag": "h1",
       "attributes": {"class": {"format": "title-{0}", "bindings": ["theme"]}},
       "children": [
         {"kind": "text", "path": "1.1", "text": {"format": "{0}", "bindings": ["title"]}}
       ]},
      {"kind": "conditional", "path": "2", "condition": "showBanner",
       "then": {"kind": "element", "path": "2", "tag": "p", "children": [
         {"kind": "text", "path": "2.1", "text": "Banner"}
       ]}},
      {"kind": "conditional", "path": "3", "condition": "loggedIn",
       "then": {"kind": "element", "path": "3", "tag": "section", "children": [
         {"kind": "conditional", "path": "3.1", "condition": "isAdmin",
          "then": {"kind": "element", "path": "3.1", "tag": "span", "children": [
            {"kind": "text", "path": "3.1.1", "text": "Admin"}
          ]}},
         {"kind": "text", "path": "3.2", "text": "Welcome"}
       ]},
       "else": {"kind": "text", "path": "3", "text": "Sign in"}},
      {"kind": "text", "path": "4",
       "text": {"format": "{0} items", "bindings": ["items.length"]}},
      {"kind": "loop", "path": "5", "tag": "ul", "collection": "items", "item": "item",
       "body": {"kind": "element", "path": "", "tag": "li", "children": [
         {"kind": "text", "path": "1", "text": {"format": "{0}", "bindings": ["item.name"]}}
       ]}}
    ]
  }
}"#;

pub fn artifact() -> TemplateArtifact {
    serde_json::from_str(ACCOUNT).unwrap()
}

/// Same component with the heading retagged
pub fn retagged_artifact() -> TemplateArtifact {
    serde_json::from_str(&ACCOUNT.replace(r#""tag": "h1""#, r#""tag": "h2""#)).unwrap()
}

pub fn state() -> StateSnapshot {
    StateSnapshot::from(json!({
        "title": "Account",
        "theme": "light",
        "items": [{"name": "first"}]
    }))
}

pub fn html(tree: &VNode) -> String {
    tree.materialize().map(|dom| dom.to_html()).unwrap_or_default()
}

/// Small deterministic generator for scenario tests
pub struct Lcg(pub u64);

impl Lcg {
    pub fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}
