use crate::binding::Binding;
use crate::condition::Condition;
use crate::dynamic::{DynamicText, TextValue};
use crate::error::{TemplateError, TemplateResult};
use crate::fragment::{Fragment, TemplateArtifact};
use crate::render::{render_conditional, render_fragment, render_loop};
use crate::scope::{Overrides, Scope};
use crate::value::StateSnapshot;
use anticipate_path::{Path, PathConfig, PathSpace};
use anticipate_vdom::VNode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, instrument};

/// Where a template lives: a node path, plus the attribute name for
/// attribute templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateKey {
    pub path: Path,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl TemplateKey {
    pub fn node(path: Path) -> Self {
        Self {
            path,
            attribute: None,
        }
    }

    pub fn attribute(path: Path, name: impl Into<String>) -> Self {
        Self {
            path,
            attribute: Some(name.into()),
        }
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            f.write_str("<root>")?;
        } else {
            write!(f, "{}", self.path)?;
        }
        if let Some(attribute) = &self.attribute {
            write!(f, "@{}", attribute)?;
        }
        Ok(())
    }
}

/// Generation counter, bumped whenever tree shape (not just state) changes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StructuralVersion(pub u64);

impl StructuralVersion {
    pub fn initial() -> Self {
        Self(1)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StructuralVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Branch {
    Then,
    Else,
}

impl Branch {
    pub fn taken(condition_value: bool) -> Self {
        if condition_value {
            Branch::Then
        } else {
            Branch::Else
        }
    }
}

/// An enclosing conditional and the branch a node sits in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gate {
    pub key: TemplateKey,
    pub branch: Branch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    Static(String),
    Dynamic(DynamicText),
    Conditional {
        condition: Condition,
        then_branch: Option<Fragment>,
        else_branch: Option<Fragment>,
    },
    Loop {
        tag: String,
        collection: Binding,
        item: String,
        index: Option<String>,
        body: Fragment,
    },
}

impl Template {
    fn from_text(value: &TextValue) -> Self {
        match value {
            TextValue::Static(text) => Template::Static(text.clone()),
            TextValue::Dynamic(dynamic) => Template::Dynamic(dynamic.clone()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Template::Static(_) => "static",
            Template::Dynamic(_) => "dynamic",
            Template::Conditional { .. } => "conditional",
            Template::Loop { .. } => "loop",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateEntry {
    pub template: Template,
    /// Enclosing conditionals, outermost first
    pub gates: Vec<Gate>,
    /// Innermost enclosing loop. Entries inside loops are keyed at the
    /// path of the loop's first item.
    pub enclosing_loop: Option<TemplateKey>,
    /// Conditionals with a missing branch that precede this node, or one
    /// of its ancestors, among their siblings. Their truth values shift
    /// this node's materialized index.
    pub preceding: Vec<TemplateKey>,
}

impl TemplateEntry {
    /// Not gated by any conditional and not repeated by any loop
    pub fn is_unconditional(&self) -> bool {
        self.gates.is_empty() && self.enclosing_loop.is_none()
    }
}

/// Result of evaluating one template
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Text(String),
    Node(VNode),
}

#[derive(Clone)]
struct Context {
    gates: Vec<Gate>,
    preceding: Vec<TemplateKey>,
    enclosing_loop: Option<TemplateKey>,
    base: Path,
    locals: Vec<String>,
}

/// Path-keyed templates of one component at one structural version
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    component: String,
    version: StructuralVersion,
    fingerprint: u32,
    root: Fragment,
    entries: BTreeMap<TemplateKey, TemplateEntry>,
    dependencies: BTreeMap<String, Vec<TemplateKey>>,
    space: PathSpace,
}

impl TemplateRegistry {
    pub fn from_artifact(artifact: &TemplateArtifact) -> TemplateResult<Self> {
        Self::build(artifact, StructuralVersion::initial())
    }

    pub fn from_json(json: &str) -> TemplateResult<Self> {
        let artifact: TemplateArtifact = serde_json::from_str(json)?;
        Self::from_artifact(&artifact)
    }

    pub fn build(artifact: &TemplateArtifact, version: StructuralVersion) -> TemplateResult<Self> {
        Self::build_with(artifact, version, &PathConfig::default())
    }

    /// Build with an explicit allocation policy for the registry's
    /// `PathSpace`
    #[instrument(skip(artifact, paths), fields(component = %artifact.component))]
    pub fn build_with(
        artifact: &TemplateArtifact,
        version: StructuralVersion,
        paths: &PathConfig,
    ) -> TemplateResult<Self> {
        let mut indexer = Indexer {
            space: PathSpace::new(paths.clone()),
            entries: BTreeMap::new(),
            dependencies: BTreeMap::new(),
        };
        let context = Context {
            gates: Vec::new(),
            preceding: Vec::new(),
            enclosing_loop: None,
            base: Path::root(),
            locals: Vec::new(),
        };
        indexer.node(&artifact.root, &context, false)?;

        let registry = Self {
            component: artifact.component.clone(),
            version,
            fingerprint: fingerprint(artifact)?,
            root: artifact.root.clone(),
            entries: indexer.entries,
            dependencies: indexer.dependencies,
            space: indexer.space,
        };
        debug!(
            version = %registry.version,
            templates = registry.entries.len(),
            fingerprint = registry.fingerprint,
            "Template registry built"
        );
        Ok(registry)
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn version(&self) -> StructuralVersion {
        self.version
    }

    /// crc32 of the serialized artifact; equal fingerprints mean an
    /// identical structure.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn root(&self) -> &Fragment {
        &self.root
    }

    /// Every node path of the artifact outside branch roots. Clone it to
    /// allocate paths for nodes an authoring tool is about to add.
    pub fn paths(&self) -> &PathSpace {
        &self.space
    }

    pub fn get(&self, key: &TemplateKey) -> Option<&TemplateEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&TemplateKey, &TemplateEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn conditionals(&self) -> impl Iterator<Item = (&TemplateKey, &TemplateEntry)> {
        self.entries
            .iter()
            .filter(|(_, entry)| matches!(entry.template, Template::Conditional { .. }))
    }

    pub fn condition(&self, key: &TemplateKey) -> Option<&Condition> {
        match self.entries.get(key).map(|entry| &entry.template) {
            Some(Template::Conditional { condition, .. }) => Some(condition),
            _ => None,
        }
    }

    /// Templates that read the state key `root`
    pub fn dependents(&self, root: &str) -> &[TemplateKey] {
        self.dependencies.get(root).map_or(&[], Vec::as_slice)
    }

    /// Render the whole component tree
    #[instrument(skip_all, fields(component = %self.component))]
    pub fn render(&self, state: &StateSnapshot) -> TemplateResult<VNode> {
        let mut scope = Scope::new(state);
        render_fragment(&self.root, &mut scope, &Path::root())
    }

    /// Render with binding truth values pinned by source text
    pub fn render_with_overrides(
        &self,
        state: &StateSnapshot,
        overrides: &Overrides,
    ) -> TemplateResult<VNode> {
        let mut scope = Scope::new(state).with_overrides(overrides);
        render_fragment(&self.root, &mut scope, &Path::root())
    }

    /// Evaluate a single template against `state`
    pub fn evaluate(&self, key: &TemplateKey, state: &StateSnapshot) -> TemplateResult<Evaluation> {
        let entry = self.entries.get(key).ok_or_else(|| TemplateError::UnknownTemplate {
            key: key.to_string(),
        })?;
        if entry.enclosing_loop.is_some() {
            return Err(TemplateError::LoopScoped {
                key: key.to_string(),
            });
        }

        let mut scope = Scope::new(state);
        match &entry.template {
            Template::Static(text) => Ok(Evaluation::Text(text.clone())),
            Template::Dynamic(dynamic) => Ok(Evaluation::Text(dynamic.render(&scope))),
            Template::Conditional {
                condition,
                then_branch,
                else_branch,
            } => render_conditional(
                key.path.clone(),
                condition,
                then_branch.as_ref(),
                else_branch.as_ref(),
                &mut scope,
                &Path::root(),
            )
            .map(Evaluation::Node),
            Template::Loop {
                tag,
                collection,
                item,
                index,
                body,
            } => render_loop(
                key.path.clone(),
                tag,
                collection,
                item,
                index.as_deref(),
                body,
                &mut scope,
            )
            .map(Evaluation::Node),
        }
    }
}

fn fingerprint(artifact: &TemplateArtifact) -> TemplateResult<u32> {
    let bytes = serde_json::to_vec(artifact)?;
    Ok(crc32fast::hash(&bytes))
}

struct Indexer {
    space: PathSpace,
    entries: BTreeMap<TemplateKey, TemplateEntry>,
    dependencies: BTreeMap<String, Vec<TemplateKey>>,
}

impl Indexer {
    fn insert(&mut self, key: TemplateKey, template: Template, context: &Context) -> TemplateResult<()> {
        if self.entries.contains_key(&key) {
            return Err(TemplateError::invalid_fragment(&key.path, "duplicate template key"));
        }
        self.entries.insert(
            key,
            TemplateEntry {
                template,
                gates: context.gates.clone(),
                enclosing_loop: context.enclosing_loop.clone(),
                preceding: context.preceding.clone(),
            },
        );
        Ok(())
    }

    fn depend<'b>(
        &mut self,
        key: &TemplateKey,
        bindings: impl IntoIterator<Item = &'b Binding>,
        context: &Context,
    ) {
        let roots = bindings
            .into_iter()
            .map(Binding::root)
            .filter(|root| !context.locals.iter().any(|local| local == root))
            .map(str::to_string)
            .collect();
        self.record(key, roots);
    }

    fn record(&mut self, key: &TemplateKey, roots: BTreeSet<String>) {
        for root in roots {
            let keys = self.dependencies.entry(root).or_default();
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }

    fn node(&mut self, fragment: &Fragment, context: &Context, branch_root: bool) -> TemplateResult<()> {
        let path = context.base.join(fragment.path());
        if !branch_root {
            self.space.register(path.clone())?;
        }
        // Inside loops only structure is indexed; the loop entry owns the
        // dependencies and renders the items.
        let indexed = context.enclosing_loop.is_none() && !branch_root;

        match fragment {
            Fragment::Element {
                attributes,
                children,
                ..
            } => {
                if indexed {
                    for (name, value) in attributes {
                        let key = TemplateKey::attribute(path.clone(), name.as_str());
                        self.depend(&key, value.bindings(), context);
                        self.insert(key, Template::from_text(value), context)?;
                    }
                }
                self.children(fragment.path(), children, context)
            }

            Fragment::Text { text, .. } => {
                if indexed {
                    let key = TemplateKey::node(path);
                    self.depend(&key, text.bindings(), context);
                    self.insert(key, Template::from_text(text), context)?;
                }
                Ok(())
            }

            Fragment::Conditional {
                path: raw,
                condition,
                then_branch,
                else_branch,
            } => {
                if branch_root {
                    return Err(TemplateError::invalid_fragment(
                        &path,
                        "a branch must be an element or text",
                    ));
                }
                let key = TemplateKey::node(path.clone());

                for (branch, fragment) in [(Branch::Then, then_branch), (Branch::Else, else_branch)] {
                    let Some(fragment) = fragment else {
                        continue;
                    };
                    if fragment.path() != raw {
                        return Err(TemplateError::invalid_fragment(
                            fragment.path(),
                            format!("branch must share the conditional's path '{}'", raw),
                        ));
                    }
                    if context.enclosing_loop.is_none() {
                        self.depend(&key, fragment.own_bindings(), context);
                    }
                    let mut inner = context.clone();
                    inner.gates.push(Gate {
                        key: key.clone(),
                        branch,
                    });
                    self.node(fragment, &inner, true)?;
                }

                if context.enclosing_loop.is_none() {
                    self.depend(&key, condition.bindings(), context);
                }
                self.insert(
                    key,
                    Template::Conditional {
                        condition: condition.clone(),
                        then_branch: then_branch.as_deref().cloned(),
                        else_branch: else_branch.as_deref().cloned(),
                    },
                    context,
                )
            }

            Fragment::Loop {
                tag,
                collection,
                item,
                index,
                body,
                ..
            } => {
                if branch_root {
                    return Err(TemplateError::invalid_fragment(
                        &path,
                        "a branch must be an element or text",
                    ));
                }
                if !body.path().is_root() {
                    return Err(TemplateError::invalid_fragment(
                        body.path(),
                        "loop body paths are relative to the item root",
                    ));
                }
                let key = TemplateKey::node(path.clone());

                let mut inner = context.clone();
                inner.base = path.child(0)?;
                inner.enclosing_loop = Some(key.clone());
                inner.preceding = Vec::new();
                inner.locals.push(item.clone());
                inner.locals.extend(index.iter().cloned());

                if context.enclosing_loop.is_none() {
                    self.depend(&key, [collection], context);
                    let mut roots = BTreeSet::new();
                    collect_roots(body, &mut inner.locals.clone(), &mut roots);
                    self.record(&key, roots);
                }

                self.insert(
                    key,
                    Template::Loop {
                        tag: tag.clone(),
                        collection: collection.clone(),
                        item: item.clone(),
                        index: index.clone(),
                        body: (**body).clone(),
                    },
                    context,
                )?;
                self.node(body, &inner, false)
            }
        }
    }

    fn children(&mut self, parent: &Path, children: &[Fragment], context: &Context) -> TemplateResult<()> {
        let mut preceding = context.preceding.clone();
        let mut previous: Option<&Path> = None;

        for child in children {
            if !parent.is_parent_of(child.path()) {
                return Err(TemplateError::invalid_fragment(
                    child.path(),
                    format!("not a direct child of '{}'", parent),
                ));
            }
            if previous.is_some_and(|prev| prev >= child.path()) {
                return Err(TemplateError::invalid_fragment(
                    child.path(),
                    "children must be in increasing path order",
                ));
            }
            previous = Some(child.path());

            let mut inner = context.clone();
            inner.preceding = preceding.clone();
            self.node(child, &inner, false)?;

            if let Fragment::Conditional {
                then_branch,
                else_branch,
                ..
            } = child
            {
                if then_branch.is_none() || else_branch.is_none() {
                    preceding.push(TemplateKey::node(context.base.join(child.path())));
                }
            }
        }
        Ok(())
    }
}

/// State roots read anywhere below `fragment`, skipping loop variables
fn collect_roots(fragment: &Fragment, locals: &mut Vec<String>, out: &mut BTreeSet<String>) {
    for binding in fragment.own_bindings() {
        if !locals.iter().any(|local| local == binding.root()) {
            out.insert(binding.root().to_string());
        }
    }
    match fragment {
        Fragment::Element { children, .. } => {
            for child in children {
                collect_roots(child, locals, out);
            }
        }
        Fragment::Conditional {
            then_branch,
            else_branch,
            ..
        } => {
            for branch in [then_branch, else_branch].into_iter().flatten() {
                collect_roots(branch, locals, out);
            }
        }
        Fragment::Loop {
            item, index, body, ..
        } => {
            let depth = locals.len();
            locals.push(item.clone());
            locals.extend(index.iter().cloned());
            collect_roots(body, locals, out);
            locals.truncate(depth);
        }
        Fragment::Text { .. } => {}
    }
}
