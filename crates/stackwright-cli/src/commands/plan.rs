//! `swr plan` - Show the resources a blueprint declares.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use stackwright_common::constants::DEFAULT_BLUEPRINT_FILE;
use stackwright_runtime::Plan;

use crate::blueprint::Blueprint;
use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the blueprint file.
    #[arg(default_value = DEFAULT_BLUEPRINT_FILE)]
    pub file: PathBuf,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanReport<'a> {
    generated_at: DateTime<Utc>,
    blueprint: String,
    #[serde(flatten)]
    plan: &'a Plan,
}

/// Executes the `plan` command.
///
/// Loads the blueprint, composes it against the planning engine, and
/// prints every declaration in dependency order followed by the exports.
///
/// # Errors
///
/// Returns an error if loading, composing, or ordering fails.
pub fn execute(args: &PlanArgs) -> anyhow::Result<()> {
    let blueprint = Blueprint::load(&args.file)?;
    let ctx = blueprint.compose()?;
    let plan = Plan::capture(&ctx)?;
    tracing::info!(resources = plan.resources.len(), "plan captured");

    if args.json {
        let report = PlanReport {
            generated_at: Utc::now(),
            blueprint: args.file.display().to_string(),
            plan: &plan,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Plan for: {} ({}, {}/{})",
        args.file.display(),
        blueprint.kind(),
        plan.project,
        plan.stack
    );
    println!("{}", output::rule());
    println!();

    for resource in &plan.resources {
        println!("  + {} {}", resource.kind, resource.name);
        for line in output::resource_details(resource) {
            println!("      {line}");
        }
    }

    println!();
    println!("  {} resource(s) will be declared.", plan.resources.len());

    if !plan.exports.is_empty() {
        println!();
        println!("  Exports:");
        for (name, value) in &plan.exports {
            println!("    {name} = {}", output::render_value(value));
        }
    }

    Ok(())
}
