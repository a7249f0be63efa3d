//! Release asset publishing
//!
//! Once a release exists, the resolved assets are handed to one of two
//! provider back ends: GitHub release-asset upload ([`github`]) or GitLab
//! generic packages with release links ([`gitlab`]). The loop in
//! [`publish_assets`] is shared. A failing asset is reported and skipped,
//! never aborting the assets after it; only provider setup and the GitHub
//! release lookup are fatal.
//!
//! Uploads are not idempotent. Re-running against the same release uploads
//! every asset again.

pub mod github;
pub mod gitlab;

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::assets::ResolvedAsset;
use crate::config::{Environment, ProviderOptions};
use crate::distributor::ReleaseOutcome;
use crate::error::{hints, DistError};
use crate::utils::terminal;

use github::GithubPublisher;
use gitlab::GitlabPublisher;

/// Supported hosting providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
    GitLab,
}

impl Provider {
    /// Parse a provider name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "github" => Some(Provider::GitHub),
            "gitlab" => Some(Provider::GitLab),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::GitHub => write!(f, "github"),
            Provider::GitLab => write!(f, "gitlab"),
        }
    }
}

/// One provider back end driven by the publish loop
///
/// `prepare` runs once before any asset and its failure is fatal.
/// `publish` uploads a single asset from an already opened file and
/// returns the download URL; its failure skips only that asset. The file
/// is taken by value so each attempt closes its handle when it returns.
pub trait AssetPublisher {
    /// One-time setup before the per-asset loop
    fn prepare(&mut self, _outcome: &ReleaseOutcome) -> Result<(), DistError> {
        Ok(())
    }

    /// Upload one asset, consuming the opened source file
    fn publish(
        &self,
        asset: &ResolvedAsset,
        file: File,
        outcome: &ReleaseOutcome,
    ) -> Result<String, DistError>;
}

/// Construct the publisher for a provider name
///
/// Unknown names and missing credentials fail here, before any asset is
/// touched.
pub fn create_publisher(
    name: &str,
    options: &ProviderOptions,
    env: &dyn Environment,
) -> Result<Box<dyn AssetPublisher>, DistError> {
    let display_name = if name.is_empty() { "(none)" } else { name };
    let provider = Provider::from_name(name).ok_or_else(|| {
        DistError::provider_init_with_hint(
            display_name,
            "no such provider",
            hints::unknown_provider(),
        )
    })?;

    match provider {
        Provider::GitHub => Ok(Box::new(GithubPublisher::from_options(options, env)?)),
        Provider::GitLab => Ok(Box::new(GitlabPublisher::from_options(options, env)?)),
    }
}

/// Counts reported after a publish run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    /// Assets uploaded successfully
    pub uploaded: usize,
    /// Assets skipped after a read or upload failure
    pub failed: usize,
}

/// Drive the per-asset upload loop
///
/// Assets are processed strictly in resolved order. A file that cannot be
/// read or an upload the provider rejects is reported and skipped; the run
/// itself still succeeds and returns the summary.
pub fn publish_assets(
    publisher: &mut dyn AssetPublisher,
    assets: &[ResolvedAsset],
    outcome: &ReleaseOutcome,
) -> Result<PublishSummary, DistError> {
    publisher.prepare(outcome)?;

    let mut summary = PublishSummary::default();
    for asset in assets {
        match upload_one(publisher, asset, outcome) {
            Ok(url) => {
                terminal::print_success(&format!("{} -> {}", asset.upload_name, url));
                summary.uploaded += 1;
            }
            Err(err) => {
                terminal::print_error(&err.to_string());
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn upload_one(
    publisher: &dyn AssetPublisher,
    asset: &ResolvedAsset,
    outcome: &ReleaseOutcome,
) -> Result<String, DistError> {
    let file =
        File::open(&asset.source_path).map_err(|e| DistError::asset_io(&asset.source_path, e))?;
    let size = file
        .metadata()
        .map_err(|e| DistError::asset_io(&asset.source_path, e))?
        .len();
    let digest = compute_file_sha256(&asset.source_path)
        .map_err(|e| DistError::asset_io(&asset.source_path, e))?;
    let short_digest: String = digest.chars().take(12).collect();

    terminal::print_info(&format!(
        "{} ({}, sha256 {})",
        asset.upload_name,
        format_bytes(size),
        short_digest
    ));

    let spinner = terminal::create_spinner(&format!("Uploading {}...", asset.upload_name));
    let result = publisher.publish(asset, file, outcome);
    spinner.finish_and_clear();
    result
}

/// HTTP client both providers share
pub(crate) fn build_http_client() -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("semdist/{}", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Hex SHA-256 of a file's contents
pub fn compute_file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    fn format_scaled(value: u64, unit: u64, suffix: &str) -> String {
        let whole = value / unit;
        let tenths = (value % unit) * 10 / unit;
        format!("{}.{} {}", whole, tenths, suffix)
    }

    if bytes >= MB {
        format_scaled(bytes, MB, "MB")
    } else if bytes >= KB {
        format_scaled(bytes, KB, "KB")
    } else {
        format!("{} B", bytes)
    }
}
