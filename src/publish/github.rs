//! GitHub release-asset uploads
//!
//! The publisher fetches the most recently published release once, then
//! attaches each asset to it through the release's upload endpoint. No
//! release to attach to is fatal; a rejected upload skips one asset.
//!
//! Token precedence: the `token` option, then `GITHUB_TOKEN`, then
//! `GH_TOKEN`. When `github_enterprise_host` (or the matching environment
//! variable) is set, the API base becomes `https://{host}/api/v3`.

use std::fs::File;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::assets::ResolvedAsset;
use crate::config::{Environment, OptionChain, ProviderOptions};
use crate::distributor::ReleaseOutcome;
use crate::error::{hints, DistError};
use crate::utils::terminal;

use super::{build_http_client, AssetPublisher};

/// Public GitHub API endpoint
const GITHUB_API: &str = "https://api.github.com";

/// Attaches assets to the latest GitHub release
pub struct GithubPublisher {
    client: reqwest::blocking::Client,
    api_base: String,
    token: String,
    release: Option<Release>,
}

/// Release metadata from `releases/latest`
#[derive(Debug, Clone, Deserialize)]
struct Release {
    id: u64,
    tag_name: String,
    upload_url: String,
    created_at: Option<DateTime<Utc>>,
}

/// Upload endpoint response
#[derive(Debug, Deserialize)]
struct UploadedAsset {
    browser_download_url: String,
}

impl GithubPublisher {
    /// Build a publisher from provider options and the environment
    pub fn from_options(
        options: &ProviderOptions,
        env: &dyn Environment,
    ) -> Result<Self, DistError> {
        let chain = OptionChain::new(options, env);

        let token = chain
            .resolve("token", &["GITHUB_TOKEN", "GH_TOKEN"])
            .ok_or_else(|| {
                DistError::provider_init_with_hint(
                    "github",
                    "github token missing",
                    hints::github_token(),
                )
            })?;

        let api_base = match chain.resolve("github_enterprise_host", &["GITHUB_ENTERPRISE_HOST"]) {
            Some(host) => format!("https://{}/api/v3", host),
            None => GITHUB_API.to_string(),
        };

        let client = build_http_client().map_err(|e| {
            DistError::provider_init_with_source(
                "github",
                "failed to create HTTP client",
                e.into(),
            )
        })?;

        Ok(Self {
            client,
            api_base,
            token,
            release: None,
        })
    }
}

impl AssetPublisher for GithubPublisher {
    fn prepare(&mut self, outcome: &ReleaseOutcome) -> Result<(), DistError> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base, outcome.owner, outcome.repo
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| {
                DistError::provider_init_with_source(
                    "github",
                    "failed to get latest release",
                    e.into(),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DistError::provider_init(
                "github",
                format!(
                    "failed to get latest release for {}/{}: HTTP {}",
                    outcome.owner,
                    outcome.repo,
                    status.as_u16()
                ),
            ));
        }

        let release: Release = response.json().map_err(|e| {
            DistError::provider_init_with_source(
                "github",
                "failed to parse release response",
                e.into(),
            )
        })?;

        let mut line = format!("Release {} (id {})", release.tag_name, release.id);
        if let Some(created) = release.created_at {
            line.push_str(&format!(", created {}", created.format("%Y-%m-%d %H:%M UTC")));
        }
        terminal::print_info(&line);

        self.release = Some(release);
        Ok(())
    }

    fn publish(
        &self,
        asset: &ResolvedAsset,
        file: File,
        _outcome: &ReleaseOutcome,
    ) -> Result<String, DistError> {
        let release = self
            .release
            .as_ref()
            .ok_or_else(|| DistError::upload_error(&asset.upload_name, "no release prepared"))?;

        // upload_url arrives as a URI template ending in `{?name,label}`
        let endpoint = release
            .upload_url
            .split('{')
            .next()
            .unwrap_or(&release.upload_url);

        let response = self
            .client
            .post(endpoint)
            .query(&[("name", asset.upload_name.as_str())])
            .bearer_auth(&self.token)
            .header("Content-Type", "application/octet-stream")
            .body(file)
            .send()
            .map_err(|e| {
                DistError::upload_error_with_source(&asset.upload_name, "request failed", e.into())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DistError::upload_error(
                &asset.upload_name,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let uploaded: UploadedAsset = response.json().map_err(|e| {
            DistError::upload_error_with_source(
                &asset.upload_name,
                "failed to parse upload response",
                e.into(),
            )
        })?;

        Ok(uploaded.browser_download_url)
    }
}
