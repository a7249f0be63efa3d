//! Resolve command implementation
//!
//! Dry view of asset resolution: parses the specification list, expands the
//! globs against the working directory, and prints the resulting upload
//! plan without contacting any provider.

use anyhow::Result;
use clap::Args;
use console::style;

use crate::assets;
use crate::commands::unwrap_or_exit;
use crate::config::{SemdistConfig, SystemEnv};
use crate::distributor::{Distributor, InitOptions};
use crate::utils::terminal;

/// Resolve asset specifications and show what would be uploaded
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Asset specifications, whitespace-separated PATTERN[:TEMPLATE][@PACKAGE] tokens
    #[arg(long, env = "SEMREL_ASSETS")]
    pub assets: Option<String>,

    /// Show the capture pattern derived from each glob
    #[arg(long)]
    pub explain: bool,
}

impl ResolveCommand {
    /// Execute the resolve command
    pub fn execute(self, verbose: bool) -> Result<()> {
        eprintln!("=== Resolving release assets ===\n");

        let config = unwrap_or_exit(SemdistConfig::load());

        // Flag and SEMREL_ASSETS first (clap env), then SEMDIST.toml
        let spec_text = self
            .assets
            .filter(|s| !s.trim().is_empty())
            .or(config.distribute.assets);

        if self.explain || verbose {
            if let Some(text) = &spec_text {
                let specs = unwrap_or_exit(assets::parse_list(text));
                for spec in &specs {
                    println!("{} {}", style("pattern:").bold(), spec.pattern.glob());
                    println!(
                        "  captures as {} ({} group(s))",
                        style(spec.pattern.regex_str()).dim(),
                        spec.pattern.capture_count()
                    );
                    if let Some(template) = &spec.rename_template {
                        println!("  renames to  {}", template);
                    }
                    if let Some(package) = &spec.package {
                        println!("  packaged in {}", package);
                    }
                }
                println!();
            }
        }

        let options = InitOptions {
            assets: spec_text,
            ..Default::default()
        };
        let distributor = unwrap_or_exit(Distributor::init(options, &SystemEnv));
        let assets = distributor.assets();

        if assets.is_empty() {
            terminal::print_warning("No files matched the asset specification");
            return Ok(());
        }

        println!("{}", "-".repeat(60));
        for asset in assets {
            let mut line = format!(
                "  {} -> {}",
                asset.source_path.display(),
                style(&asset.upload_name).bold()
            );
            if let Some(package) = &asset.package {
                line.push_str(&format!(" {}", style(format!("@{}", package)).dim()));
            }
            println!("{}", line);
        }
        println!("{}", "-".repeat(60));

        terminal::print_success(&format!("{} asset(s) resolved", assets.len()));
        Ok(())
    }
}
