use super::read_json;
use anticipate_runtime::EngineConfig;
use anticipate_vdom::{DomNode, Patch, Reconciler, VNode};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Tree before the change (JSON)
    pub old: PathBuf,

    /// Tree after the change (JSON)
    pub new: PathBuf,

    /// Print the patch list as JSON
    #[arg(long)]
    pub json: bool,

    /// Print reconciliation statistics
    #[arg(long)]
    pub stats: bool,
}

pub fn diff(args: DiffArgs, config: &EngineConfig) -> Result<()> {
    let old: VNode = read_json(&args.old)?;
    let new: VNode = read_json(&args.new)?;

    let reconciler = Reconciler::new(config.validation.clone());
    let (patches, stats) = reconciler.reconcile_with_stats(Some(&old), &new)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&patches)?);
    } else if patches.is_empty() {
        println!("{}", "No changes".dimmed());
    } else {
        for patch in &patches {
            println!("  {}", describe(patch));
        }
    }

    if args.stats {
        eprintln!();
        eprintln!(
            "{} {} patches, {} nodes visited",
            "Stats:".bright_blue().bold(),
            stats.total_patches(),
            stats.nodes_visited
        );
        eprintln!(
            "  creates {}  inserts {}  removes {}  replaces {}  text {}  attrs +{} -{}",
            stats.creates,
            stats.inserts,
            stats.removes,
            stats.replaces,
            stats.text_updates,
            stats.attribute_sets,
            stats.attribute_removals
        );
    }

    Ok(())
}

/// One-line rendering of a patch for terminal output
pub(crate) fn describe(patch: &Patch) -> String {
    match patch {
        Patch::Create { path, node } => format!("{} {} {}", "create".green(), path, summary(node)),
        Patch::Insert { path, node } => format!("{} {} {}", "insert".green(), path, summary(node)),
        Patch::Replace { path, node } => {
            format!("{} {} {}", "replace".yellow(), path, summary(node))
        }
        Patch::Remove { path } => format!("{} {}", "remove".red(), path),
        Patch::UpdateText { path, content } => {
            format!("{} {} {:?}", "text".cyan(), path, content)
        }
        Patch::SetAttribute { path, name, value } => {
            format!("{} {} {}={:?}", "attr".cyan(), path, name, value)
        }
        Patch::RemoveAttribute { path, name } => {
            format!("{} {} {}", "unattr".red(), path, name)
        }
    }
}

fn summary(node: &DomNode) -> String {
    const LIMIT: usize = 60;
    let html = node.to_html();
    if html.chars().count() > LIMIT {
        let cut: String = html.chars().take(LIMIT).collect();
        format!("{}…", cut)
    } else {
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anticipate_vdom::IndexPath;

    #[test]
    fn test_describe_patches() {
        colored::control::set_override(false);

        let remove = Patch::Remove {
            path: IndexPath::from(vec![1, 2]),
        };
        assert_eq!(describe(&remove), "remove [1, 2]");

        let insert = Patch::Insert {
            path: IndexPath::from(vec![0]),
            node: DomNode::element("p").with_child(DomNode::text("hi")),
        };
        assert_eq!(describe(&insert), "insert [0] <p>hi</p>");

        let attr = Patch::SetAttribute {
            path: IndexPath::root(),
            name: "class".into(),
            value: "a".into(),
        };
        assert_eq!(describe(&attr), "attr [] class=\"a\"");
    }

    #[test]
    fn test_long_nodes_are_truncated() {
        let node = DomNode::text("x".repeat(100));
        let text = summary(&node);
        assert_eq!(text.chars().count(), 61);
        assert!(text.ends_with('…'));
    }
}
