use super::read_artifact;
use anticipate_path::Path;
use anticipate_runtime::EngineConfig;
use anticipate_templates::{StructuralVersion, TemplateRegistry};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct PlaceArgs {
    /// Template artifact (JSON)
    pub artifact: PathBuf,

    /// Parent of the new node; omit for the root
    #[arg(long, default_value = "")]
    pub parent: String,

    /// Existing sibling the new node follows
    #[arg(long)]
    pub after: Option<String>,

    /// Existing sibling the new node precedes
    #[arg(long)]
    pub before: Option<String>,
}

pub fn place(args: PlaceArgs, config: &EngineConfig) -> Result<()> {
    let artifact = read_artifact(&args.artifact)?;
    let registry =
        TemplateRegistry::build_with(&artifact, StructuralVersion::initial(), &config.paths)?;

    let parse = |raw: &str| -> Result<Path> {
        raw.parse::<Path>().map_err(|e| anyhow!("{}: {}", raw, e))
    };
    let parent = parse(&args.parent)?;
    let after = args.after.as_deref().map(parse).transpose()?;
    let before = args.before.as_deref().map(parse).transpose()?;

    let mut space = registry.paths().clone();
    let allocation = space.insert_between(&parent, after.as_ref(), before.as_ref())?;

    println!("{}", allocation.path);
    if let Some(remap) = &allocation.remap {
        eprintln!(
            "{} {} siblings renumbered:",
            "Rebalanced".yellow().bold(),
            remap.len()
        );
        for (from, to) in remap.iter() {
            eprintln!("  {} → {}", from, to);
        }
    }
    Ok(())
}
