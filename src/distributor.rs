//! Release lifecycle surface
//!
//! A release run drives three entry points in order: [`Distributor::init`]
//! parses configuration and resolves the asset list before any release
//! activity, [`Distributor::success`] publishes the resolved assets once a
//! release exists, and [`Distributor::no_release`] acknowledges a run that
//! produced nothing to distribute. The CLI commands are thin wrappers
//! around this type.

use std::collections::HashMap;

use crate::assets::{self, ResolvedAsset};
use crate::config::{Environment, ProviderOptions};
use crate::error::{hints, DistError};
use crate::publish::{self, PublishSummary};

/// Metadata about the release that was just created
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    /// Repository owner (user or group)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Released version, without a leading `v`
    pub version: String,
}

/// Options consumed once at initialization
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Whitespace-separated asset specification list
    pub assets: Option<String>,
    /// Hosting provider name, validated at publish time
    pub provider: Option<String>,
    /// Provider options such as `token` or `gitlab_projectid`
    pub provider_opts: HashMap<String, String>,
}

/// Resolves assets at init time and publishes them on success
pub struct Distributor {
    provider: String,
    options: ProviderOptions,
    assets: Vec<ResolvedAsset>,
}

impl Distributor {
    /// Parse configuration and resolve the asset list
    ///
    /// The asset list comes from the options, falling back to the
    /// `SEMREL_ASSETS` environment variable. Configuration problems are
    /// fatal here, before any release is attempted. A missing provider or
    /// token is deliberately not checked until publish time.
    pub fn init(opts: InitOptions, env: &dyn Environment) -> Result<Self, DistError> {
        let spec_text = opts
            .assets
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env.var("SEMREL_ASSETS"))
            .ok_or_else(|| {
                DistError::config_error_with_hint(
                    "asset specification missing",
                    None,
                    hints::assets_option(),
                )
            })?;

        Ok(Self {
            provider: opts.provider.unwrap_or_default(),
            options: ProviderOptions::new(opts.provider_opts),
            assets: assets::resolve(&spec_text)?,
        })
    }

    /// The assets resolved at init time, in upload order
    pub fn assets(&self) -> &[ResolvedAsset] {
        &self.assets
    }

    /// Provider name the publish step will use
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Publish every resolved asset for a just-created release
    ///
    /// Provider setup failures abort before any asset is touched. A single
    /// asset failing to read or upload is reported and skipped; the run
    /// still returns its summary.
    pub fn success(
        &self,
        outcome: &ReleaseOutcome,
        env: &dyn Environment,
    ) -> Result<PublishSummary, DistError> {
        let mut publisher = publish::create_publisher(&self.provider, &self.options, env)?;
        publish::publish_assets(publisher.as_mut(), &self.assets, outcome)
    }

    /// Nothing to distribute when no release was warranted
    pub fn no_release(&self, _reason: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::{Path, PathBuf};

    use serial_test::serial;

    /// Restores the working directory when dropped
    struct DirGuard {
        original: PathBuf,
    }

    impl DirGuard {
        fn enter(path: &Path) -> Self {
            let original = std::env::current_dir().unwrap();
            std::env::set_current_dir(path).unwrap();
            Self { original }
        }
    }

    impl Drop for DirGuard {
        fn drop(&mut self) {
            std::env::set_current_dir(&self.original).unwrap();
        }
    }

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn empty_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    #[serial]
    fn test_init_resolves_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app-linux.tar.gz"), "a").unwrap();
        std::fs::write(dir.path().join("app-macos.tar.gz"), "b").unwrap();
        let _guard = DirGuard::enter(dir.path());

        let opts = InitOptions {
            assets: Some("app-*.tar.gz:release-$1.tar.gz".to_string()),
            provider: Some("github".to_string()),
            provider_opts: HashMap::new(),
        };
        let distributor = Distributor::init(opts, &empty_env()).unwrap();

        assert_eq!(distributor.provider(), "github");
        let names: Vec<&str> = distributor
            .assets()
            .iter()
            .map(|a| a.upload_name.as_str())
            .collect();
        assert_eq!(names, vec!["release-linux.tar.gz", "release-macos.tar.gz"]);
    }

    #[test]
    #[serial]
    fn test_init_falls_back_to_semrel_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.zip"), "z").unwrap();
        let _guard = DirGuard::enter(dir.path());

        let env = env_of(&[("SEMREL_ASSETS", "*.zip")]);
        let distributor = Distributor::init(InitOptions::default(), &env).unwrap();

        assert_eq!(distributor.assets().len(), 1);
        assert_eq!(distributor.assets()[0].upload_name, "out.zip");
    }

    #[test]
    fn test_init_requires_assets() {
        let err = Distributor::init(InitOptions::default(), &empty_env())
            .err()
            .unwrap();
        assert!(err.to_string().contains("asset specification missing"));
    }

    #[test]
    fn test_init_blank_assets_falls_through_to_env() {
        let opts = InitOptions {
            assets: Some("   ".to_string()),
            ..Default::default()
        };
        let err = Distributor::init(opts, &empty_env()).err().unwrap();
        assert!(err.to_string().contains("asset specification missing"));
    }

    #[test]
    #[serial]
    fn test_init_propagates_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let _guard = DirGuard::enter(dir.path());

        let opts = InitOptions {
            assets: Some("*.zip:".to_string()),
            ..Default::default()
        };
        assert!(Distributor::init(opts, &empty_env()).is_err());
    }

    #[test]
    #[serial]
    fn test_no_release_leaves_assets_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.zip"), "a").unwrap();
        let _guard = DirGuard::enter(dir.path());

        let opts = InitOptions {
            assets: Some("*.zip".to_string()),
            ..Default::default()
        };
        let distributor = Distributor::init(opts, &empty_env()).unwrap();
        distributor.no_release("no relevant commits since last release");

        assert_eq!(distributor.assets().len(), 1);
    }

    #[test]
    #[serial]
    fn test_success_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.zip"), "a").unwrap();
        let _guard = DirGuard::enter(dir.path());

        let opts = InitOptions {
            assets: Some("*.zip".to_string()),
            provider: Some("bitbucket".to_string()),
            provider_opts: HashMap::new(),
        };
        let distributor = Distributor::init(opts, &empty_env()).unwrap();

        let outcome = ReleaseOutcome {
            owner: "acme".to_string(),
            repo: "widget".to_string(),
            version: "1.0.0".to_string(),
        };
        let err = distributor.success(&outcome, &empty_env()).err().unwrap();
        assert!(err.to_string().contains("bitbucket"));
    }
}
