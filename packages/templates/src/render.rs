use crate::binding::{Binding, Resolution};
use crate::condition::Condition;
use crate::error::TemplateResult;
use crate::fragment::Fragment;
use crate::scope::Scope;
use crate::value::StateValue;
use anticipate_path::Path;
use anticipate_vdom::VNode;
use tracing::debug;

/// Render `fragment` with its paths resolved against `base`
pub(crate) fn render_fragment(
    fragment: &Fragment,
    scope: &mut Scope<'_>,
    base: &Path,
) -> TemplateResult<VNode> {
    let path = base.join(fragment.path());

    match fragment {
        Fragment::Element {
            tag,
            attributes,
            children,
            ..
        } => {
            let mut node = VNode::element(path, tag.as_str());
            for (name, value) in attributes {
                node = node.with_attr(name.as_str(), value.render(scope));
            }
            for child in children {
                node = node.with_child(render_fragment(child, scope, base)?);
            }
            Ok(node)
        }
        Fragment::Text { text, .. } => Ok(VNode::text(path, text.render(scope))),
        Fragment::Conditional {
            condition,
            then_branch,
            else_branch,
            ..
        } => render_conditional(
            path,
            condition,
            then_branch.as_deref(),
            else_branch.as_deref(),
            scope,
            base,
        ),
        Fragment::Loop {
            tag,
            collection,
            item,
            index,
            body,
            ..
        } => render_loop(path, tag, collection, item, index.as_deref(), body, scope),
    }
}

pub(crate) fn render_conditional(
    path: Path,
    condition: &Condition,
    then_branch: Option<&Fragment>,
    else_branch: Option<&Fragment>,
    scope: &mut Scope<'_>,
    base: &Path,
) -> TemplateResult<VNode> {
    let branch = if condition.evaluate(scope) {
        then_branch
    } else {
        else_branch
    };
    match branch {
        Some(fragment) => render_fragment(fragment, scope, base),
        None => Ok(VNode::null(path)),
    }
}

pub(crate) fn render_loop(
    path: Path,
    tag: &str,
    collection: &Binding,
    item: &str,
    index: Option<&str>,
    body: &Fragment,
    scope: &mut Scope<'_>,
) -> TemplateResult<VNode> {
    let items = match collection.resolve(scope) {
        Resolution::Value(StateValue::Array(items)) => items,
        Resolution::Value(other) => {
            debug!(path = %path, binding = %collection, found = other.type_name(), "Loop collection is not an array");
            Vec::new()
        }
        Resolution::Undefined { missing } => {
            debug!(path = %path, binding = %collection, missing = %missing, "Loop collection is undefined");
            Vec::new()
        }
    };

    let mut container = VNode::element(path.clone(), tag);
    for (i, value) in items.into_iter().enumerate() {
        let item_root = path.child(i)?;
        scope.push_local(item, value);
        if let Some(index) = index {
            scope.push_local(index, StateValue::Number(i as f64));
        }

        let rendered = render_fragment(body, scope, &item_root);

        if index.is_some() {
            scope.pop_local();
        }
        scope.pop_local();
        container = container.with_child(rendered?);
    }
    Ok(container)
}
