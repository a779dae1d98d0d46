use super::{read_artifact, read_state};
use crate::commands::diff::describe;
use crate::commands::simulate::print_tables;
use anticipate_runtime::{ComponentStore, EngineConfig};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use tracing::warn;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Template artifact (JSON)
    pub artifact: PathBuf,

    /// State snapshot (JSON object)
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Print full tables after every reload
    #[arg(long)]
    pub tables: bool,
}

pub fn watch(args: WatchArgs, config: &EngineConfig) -> Result<()> {
    let artifact = read_artifact(&args.artifact)?;
    let state = read_state(args.state.as_deref())?;
    let id = artifact.component.clone();

    let store = ComponentStore::new(config.clone());
    let update = store.mount(id.clone(), artifact, state)?;
    println!(
        "{} {} {} ({} tables)",
        "Mounted".green().bold(),
        id.bold(),
        update.version,
        update.tables.len()
    );

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        Config::default(),
    )?;
    watcher
        .watch(&args.artifact, RecursiveMode::NonRecursive)
        .with_context(|| format!("Cannot watch {}", args.artifact.display()))?;

    println!("{}", "👀 Watching for changes...".bright_blue());

    for event in rx {
        match event {
            Ok(Event {
                kind: EventKind::Modify(_) | EventKind::Create(_),
                ..
            }) => reload(&store, &id, &args),
            Ok(_) => {}
            Err(error) => warn!(error = %error, "Watch error"),
        }
    }
    Ok(())
}

fn reload(store: &ComponentStore, id: &str, args: &WatchArgs) {
    let result = read_artifact(&args.artifact)
        .and_then(|artifact| Ok(store.hot_reload(id, artifact)?));

    match result {
        Ok(None) => println!("  {} structure unchanged", "·".dimmed()),
        Ok(Some(update)) => {
            println!(
                "  {} {} ({} tables, {} unavailable)",
                "✓".green(),
                update.version,
                update.tables.len(),
                update.unavailable.len()
            );
            for patch in &update.patches {
                println!("    {}", describe(patch));
            }
            if args.tables {
                print_tables(&update.tables);
            }
        }
        Err(error) => eprintln!("  {} {:#}", "✗".red(), error),
    }
}
