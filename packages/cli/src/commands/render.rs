use super::{read_artifact, read_state};
use anticipate_runtime::EngineConfig;
use anticipate_templates::{StructuralVersion, TemplateRegistry};
use anticipate_vdom::validate;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Template artifact (JSON)
    pub artifact: PathBuf,

    /// State snapshot (JSON object)
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Print the path-stamped tree as JSON instead of HTML
    #[arg(long)]
    pub tree: bool,
}

pub fn render(args: RenderArgs, config: &EngineConfig) -> Result<()> {
    let artifact = read_artifact(&args.artifact)?;
    let state = read_state(args.state.as_deref())?;

    let registry =
        TemplateRegistry::build_with(&artifact, StructuralVersion::initial(), &config.paths)?;
    let tree = registry.render(&state)?;
    validate(&tree, &config.validation)?;

    if args.tree {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else if let Some(dom) = tree.materialize() {
        println!("{}", dom.to_html());
    }
    Ok(())
}
