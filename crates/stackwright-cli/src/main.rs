//! # swr - Stackwright CLI
//!
//! Plans static-web and container API stacks from a YAML blueprint without
//! touching any cloud account.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod blueprint;
mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    commands::execute(cli)
}
