//! sitesmith - a static site build pipeline.
//!
//! Markdown and HTML with YAML front matter go through a fixed stage chain
//! into `build/`; Sass compiles into `build/css/`; `serve` adds a dev server
//! with live reload.

mod build;
mod cli;
mod compiler;
mod config;
mod logger;
mod reload;
mod serve;
mod tasks;
mod utils;
mod watch;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::SiteConfig;
use std::process::ExitCode;
use tasks::{TaskGraph, run_task};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log!("error"; "{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Load the configuration and run the requested task with its dependencies.
fn run(cli: &Cli) -> Result<()> {
    let config = SiteConfig::load(cli)?;
    let graph = TaskGraph::standard()?;

    graph.run(cli.command.task(), |task| run_task(task, &config))
}
