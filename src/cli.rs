//! Command-line interface definitions.
//!
//! Each subcommand names a task in the task graph; see [`crate::tasks`].

use crate::config::CONFIG_FILE;
use crate::tasks::Task;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sitesmith static site build pipeline
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Keep records marked `draft: true`
    #[arg(long, global = true)]
    pub drafts: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render content: front matter, markdown, permalinks, templates
    #[command(alias = "metalsmith")]
    Content,

    /// Compile stylesheets and add vendor prefixes
    #[command(alias = "css")]
    Style,

    /// Run both content and style
    Build,

    /// Build, then serve the output with live reload
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },
}

impl Commands {
    /// Task this subcommand runs.
    pub const fn task(&self) -> Task {
        match self {
            Self::Content => Task::Content,
            Self::Style => Task::Style,
            Self::Build => Task::Build,
            Self::Serve { .. } => Task::Serve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_map_to_tasks() {
        let cli = Cli::parse_from(["sitesmith", "metalsmith"]);
        assert_eq!(cli.command.task(), Task::Content);

        let cli = Cli::parse_from(["sitesmith", "css"]);
        assert_eq!(cli.command.task(), Task::Style);
    }

    #[test]
    fn test_serve_args() {
        let cli = Cli::parse_from(["sitesmith", "serve", "-p", "8080", "--watch"]);
        match cli.command {
            Commands::Serve { port, watch, interface } => {
                assert_eq!(port, Some(8080));
                assert_eq!(watch, Some(true));
                assert_eq!(interface, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sitesmith", "build", "--drafts", "--root", "site"]);
        assert!(cli.drafts);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE));
    }
}
