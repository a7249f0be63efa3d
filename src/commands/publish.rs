//! Publish command implementation
//!
//! Resolves the asset specifications, then drives the distributor lifecycle
//! for an already-created release: init, publish each asset, summary.

use anyhow::Result;
use clap::Args;
use console::style;

use crate::commands::unwrap_or_exit;
use crate::config::{SemdistConfig, SystemEnv};
use crate::distributor::{Distributor, InitOptions, ReleaseOutcome};
use crate::error::{hints, DistError, ResultExt};
use crate::publish::Provider;
use crate::utils::terminal;

/// Upload release assets to GitHub or GitLab
#[derive(Args, Debug)]
pub struct PublishCommand {
    /// Repository owner (user or group)
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Version that was released (e.g. 1.4.0 or v1.4.0)
    #[arg(long)]
    pub release_version: String,

    /// Asset specifications, whitespace-separated PATTERN[:TEMPLATE][@PACKAGE] tokens
    #[arg(long, env = "SEMREL_ASSETS")]
    pub assets: Option<String>,

    /// Hosting provider (github or gitlab)
    #[arg(long)]
    pub provider: Option<String>,

    /// Provider option as KEY=VALUE, repeatable (e.g. gitlab_projectid=42)
    #[arg(long = "provider-opt", value_name = "KEY=VALUE")]
    pub provider_opts: Vec<String>,

    /// Authentication token, shorthand for --provider-opt token=...
    #[arg(long)]
    pub token: Option<String>,

    /// Resolve and print the upload plan without contacting the provider
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(self, _verbose: bool) -> Result<()> {
        eprintln!("=== Publishing release assets ===\n");

        let config = unwrap_or_exit(SemdistConfig::load());
        let version = unwrap_or_exit(normalize_version(&self.release_version));

        // Options from SEMDIST.toml first, flags override
        let mut provider_opts = config.provider_opts;
        for pair in &self.provider_opts {
            let (key, value) = unwrap_or_exit(parse_key_value(pair));
            provider_opts.insert(key.to_string(), value.to_string());
        }
        if let Some(token) = self.token {
            provider_opts.insert("token".to_string(), token);
        }

        let options = InitOptions {
            assets: self
                .assets
                .filter(|s| !s.trim().is_empty())
                .or(config.distribute.assets),
            provider: self.provider.or(config.distribute.provider),
            provider_opts,
        };
        let distributor = unwrap_or_exit(Distributor::init(options, &SystemEnv));
        let assets = distributor.assets();

        // Canonical name when recognized, raw text otherwise (it will fail
        // with a hint at publish time)
        let provider_label = match Provider::from_name(distributor.provider()) {
            Some(provider) => provider.to_string(),
            None if distributor.provider().is_empty() => "(not set)".to_string(),
            None => distributor.provider().to_string(),
        };

        println!("Repository: {}/{}", self.owner, self.repo);
        println!("Version:    {}", version);
        println!("Provider:   {}", provider_label);
        println!("Assets:     {}", assets.len());
        println!();

        if self.dry_run {
            println!("{}", "-".repeat(60));
            for asset in assets {
                println!(
                    "  {} -> {} {}",
                    asset.source_path.display(),
                    style(&asset.upload_name).bold(),
                    style(format!("@{}", asset.package_or(&self.repo))).dim()
                );
            }
            println!("{}", "-".repeat(60));
            terminal::print_info("Dry run, nothing uploaded");
            return Ok(());
        }

        let outcome = ReleaseOutcome {
            owner: self.owner,
            repo: self.repo,
            version,
        };
        let summary = unwrap_or_exit(distributor.success(&outcome, &SystemEnv));

        println!();
        if summary.failed > 0 {
            terminal::print_warning(&format!(
                "{} asset(s) uploaded, {} failed",
                summary.uploaded, summary.failed
            ));
        } else {
            terminal::print_success(&format!("{} asset(s) uploaded", summary.uploaded));
        }
        Ok(())
    }
}

/// Strip an optional leading `v` and validate the remainder as semver
fn normalize_version(raw: &str) -> Result<String, DistError> {
    let version = raw.strip_prefix('v').unwrap_or(raw);
    semver::Version::parse(version).context_with_hint(
        format!("invalid release version '{}'", raw),
        hints::release_version(),
    )?;
    Ok(version.to_string())
}

/// Split one `--provider-opt KEY=VALUE` pair
fn parse_key_value(pair: &str) -> Result<(&str, &str), DistError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(DistError::config_error(format!(
            "provider option '{}' is not in KEY=VALUE form",
            pair
        ))),
    }
}
