//! semdist CLI - release asset distribution for semantic releases
//!
//! After a release is cut, semdist expands glob-based asset specifications
//! into concrete build artifacts and uploads them to the release's hosting
//! provider, with zero provider SDK dependency.
//!
//! ## Architecture
//!
//! ```text
//! CLI → Distributor → assets (glob resolution) → publish (GitHub | GitLab)
//! ```

mod assets;
mod cli;
mod commands;
mod config;
mod distributor;
mod error;
mod publish;
mod utils;

use anyhow::Result;
use clap::Parser;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute()
}
