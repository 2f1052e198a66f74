//! `swr graph` - Show every dependency edge of a blueprint.

use std::path::PathBuf;

use clap::Args;
use stackwright_common::constants::DEFAULT_BLUEPRINT_FILE;

use crate::blueprint::Blueprint;
use crate::output;

/// Arguments for the `graph` command.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Path to the blueprint file.
    #[arg(default_value = DEFAULT_BLUEPRINT_FILE)]
    pub file: PathBuf,
}

/// Executes the `graph` command.
///
/// Lists each declaration in dependency order with the declarations it
/// waits for and why.
///
/// # Errors
///
/// Returns an error if loading, composing, or ordering fails.
pub fn execute(args: &GraphArgs) -> anyhow::Result<()> {
    let blueprint = Blueprint::load(&args.file)?;
    let ctx = blueprint.compose()?;
    let graph = ctx.graph()?;
    let order = graph.resolve_order()?;

    println!("Dependency graph for: {}", args.file.display());
    println!("{}", output::rule());
    println!();

    let mut edges = 0;
    for urn in &order {
        println!("  {}", urn.name());
        for (dependency, kind) in graph.dependencies_of(urn) {
            println!("      <- {} ({})", dependency.name(), kind.as_str());
            edges += 1;
        }
    }

    println!();
    println!("  {} node(s), {edges} edge(s).", graph.len());
    Ok(())
}
