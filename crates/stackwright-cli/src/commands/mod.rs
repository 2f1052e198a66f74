//! CLI command definitions and dispatch.

pub mod graph;
pub mod plan;

use clap::{Parser, Subcommand};

/// Stackwright - infrastructure blueprints for static sites and container APIs.
#[derive(Parser, Debug)]
#[command(name = "swr", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "SWR_LOG_JSON")]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the resources a blueprint declares, dependencies first.
    Plan(plan::PlanArgs),
    /// Show every dependency edge of a blueprint.
    Graph(graph::GraphArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(&args),
        Command::Graph(args) => graph::execute(&args),
    }
}
