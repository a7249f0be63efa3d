//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{publish::PublishCommand, resolve::ResolveCommand};

/// semdist - Release Asset Distributor
///
/// Resolves glob-based asset specifications after a semantic release and
/// uploads the matches to the release's hosting provider.
#[derive(Parser, Debug)]
#[command(name = "semdist")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve asset specifications and show what would be uploaded
    Resolve(ResolveCommand),

    /// Upload release assets to GitHub or GitLab
    Publish(PublishCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // Set up terminal colors
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        // Execute the subcommand
        match self.command {
            Commands::Resolve(cmd) => cmd.execute(self.verbose),
            Commands::Publish(cmd) => cmd.execute(self.verbose),
        }
    }
}
