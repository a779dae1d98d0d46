use super::{read_artifact, read_state};
use anticipate_runtime::EngineConfig;
use anticipate_simulator::{PathVariant, PathVariantTable, SimulationReport, Simulator};
use anticipate_templates::{StructuralVersion, TemplateRegistry};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Template artifact (JSON)
    pub artifact: PathBuf,

    /// State used for bindings outside each table
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Print the tables as JSON
    #[arg(long)]
    pub json: bool,

    /// Override the binding safety bound from the config
    #[arg(long)]
    pub max_bindings: Option<usize>,
}

pub fn simulate(args: SimulateArgs, config: &EngineConfig) -> Result<()> {
    let artifact = read_artifact(&args.artifact)?;
    let state = read_state(args.state.as_deref())?;

    let registry =
        TemplateRegistry::build_with(&artifact, StructuralVersion::initial(), &config.paths)?;
    let mut simulation = config.simulation.clone();
    if let Some(max_bindings) = args.max_bindings {
        simulation.max_bindings = max_bindings;
    }
    let report = Simulator::new(simulation).simulate(&registry, &state);

    if args.json {
        let tables: Vec<_> = report.tables.values().collect();
        println!("{}", serde_json::to_string_pretty(&tables)?);
        return Ok(());
    }

    print_report(registry.component(), &report);
    Ok(())
}

fn print_report(component: &str, report: &SimulationReport) {
    println!("{} {}", "Simulated".bright_blue().bold(), component.bold());
    print_tables(report.tables.values());

    if !report.unavailable.is_empty() {
        println!();
        for (key, error) in &report.unavailable {
            println!("  {} {} {}", "unavailable".yellow(), key, error);
        }
    }

    println!();
    println!(
        "{} tables, {} variants ({} rendered, {} pruned), {} renders",
        report.tables.len(),
        report.variant_count(),
        report.materialized,
        report.pruned,
        report.renders
    );
}

pub(crate) fn print_tables<'a>(tables: impl IntoIterator<Item = &'a PathVariantTable>) {
    for table in tables {
        let bindings: Vec<&str> = table.bindings.iter().map(|b| b.source()).collect();
        println!();
        println!(
            "  {} {} [{}]",
            "conditional".green(),
            table.key,
            bindings.join(", ").dimmed()
        );
        for (signature, variant) in &table.variants {
            let signature = if signature.as_str().is_empty() {
                "(no bindings)".to_string()
            } else {
                signature.to_string()
            };
            match variant {
                PathVariant::At(index_path) => println!("    {} → {}", signature, index_path),
                PathVariant::Absent => println!("    {} → {}", signature, "absent".dimmed()),
            }
        }
    }
}
