//! Error types and helpers for user-friendly error messages
//!
//! This module provides custom error types with actionable hints and suggestions
//! to help users quickly resolve common issues.

use std::path::PathBuf;

use thiserror::Error;

/// Custom error types with helpful context and suggestions
#[derive(Error, Debug)]
pub enum DistError {
    /// Asset specification or configuration file errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },

    /// Provider setup errors (unknown provider, missing credentials, failed release lookup)
    #[error("Provider setup failed for '{provider}': {message}")]
    ProviderInit {
        provider: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },

    /// A resolved asset could not be read from disk
    #[error("Cannot read asset '{}'", path.display())]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The provider rejected an asset upload
    #[error("Upload failed for '{name}': {message}")]
    Upload {
        name: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The provider rejected a release link after a successful upload
    #[error("Release link failed for '{name}': {message}")]
    LinkCreation {
        name: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl DistError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    /// Create a configuration error with source and hint
    pub fn config_error_with_hint(
        message: impl Into<String>,
        source: Option<anyhow::Error>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source,
            hint: Some(hint.into()),
        }
    }

    /// Create a provider setup error
    pub fn provider_init(
        provider: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ProviderInit {
            provider: provider.into(),
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    /// Create a provider setup error with hint
    pub fn provider_init_with_hint(
        provider: impl Into<String>,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::ProviderInit {
            provider: provider.into(),
            message: message.into(),
            source: None,
            hint: Some(hint.into()),
        }
    }

    /// Create a provider setup error with source
    pub fn provider_init_with_source(
        provider: impl Into<String>,
        message: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::ProviderInit {
            provider: provider.into(),
            message: message.into(),
            source: Some(source),
            hint: None,
        }
    }

    /// Create an asset read error
    pub fn asset_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::AssetIo {
            path: path.into(),
            source,
        }
    }

    /// Create an upload error
    pub fn upload_error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an upload error with source
    pub fn upload_error_with_source(
        name: impl Into<String>,
        message: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::Upload {
            name: name.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a release link error
    pub fn link_error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LinkCreation {
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a release link error with source
    pub fn link_error_with_source(
        name: impl Into<String>,
        message: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::LinkCreation {
            name: name.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        match self {
            DistError::Config { hint, .. } | DistError::ProviderInit { hint, .. } => {
                if let Some(h) = hint {
                    eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
                }
            }
            DistError::AssetIo { .. }
            | DistError::Upload { .. }
            | DistError::LinkCreation { .. } => {}
        }

        eprintln!();
    }
}

/// Helper trait for adding hints to Result types
pub trait ResultExt<T> {
    /// Add context with a hint
    fn context_with_hint(
        self,
        context: impl Into<String>,
        hint: impl Into<String>,
    ) -> Result<T, DistError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context_with_hint(
        self,
        context: impl Into<String>,
        hint: impl Into<String>,
    ) -> Result<T, DistError> {
        self.map_err(|e| DistError::config_error_with_hint(
            format!("{}: {}", context.into(), e),
            Some(e.into()),
            hint,
        ))
    }
}

/// Common error hints for missing configuration
pub mod hints {
    /// Get hint for a missing asset specification
    pub fn assets_option() -> &'static str {
        "Tell semdist which files to upload:\n\
         • Pass --assets 'dist/*.tar.gz'\n\
         • Or set the SEMREL_ASSETS environment variable\n\
         • Or add 'assets = \"...\"' under [distribute] in SEMDIST.toml\n\
         \n\
         Each specification is PATTERN[:TEMPLATE][@PACKAGE], for example:\n\
         • build-*.tar.gz:release-$1.tar.gz\n\
         • out/*.zip@mypackage"
    }

    /// Get hint for an unrecognized provider name
    pub fn unknown_provider() -> &'static str {
        "Supported providers:\n\
         • github - attach assets to the latest GitHub release\n\
         • gitlab - publish assets as GitLab generic packages\n\
         \n\
         Set it with --provider or 'provider = \"...\"' under [distribute] in SEMDIST.toml."
    }

    /// Get hint for a missing GitHub token
    pub fn github_token() -> &'static str {
        "Provide a GitHub token with write access to the repository:\n\
         • Set the GITHUB_TOKEN or GH_TOKEN environment variable\n\
         • Or pass --token <TOKEN>\n\
         \n\
         In GitHub Actions, use the workflow token:\n\
         • env: GITHUB_TOKEN: ${{ secrets.GITHUB_TOKEN }}"
    }

    /// Get hint for a missing GitLab token
    pub fn gitlab_token() -> &'static str {
        "Provide a GitLab token with api scope:\n\
         • Set the GITLAB_TOKEN environment variable\n\
         • Or pass --token <TOKEN>\n\
         \n\
         In GitLab CI, the job token is picked up automatically from CI_JOB_TOKEN."
    }

    /// Get hint for a missing GitLab project id
    pub fn gitlab_project_id() -> &'static str {
        "GitLab needs the target project id or path:\n\
         • Pass --provider-opt gitlab_projectid=12345\n\
         • Or use the project path: --provider-opt gitlab_projectid=group/project\n\
         \n\
         The id is shown on the project's Settings → General page."
    }

    /// Get hint for an invalid SEMDIST.toml
    pub fn invalid_semdist_toml() -> &'static str {
        "SEMDIST.toml is invalid. Common issues:\n\
         • Invalid TOML syntax (check quotes, brackets, commas)\n\
         • Values under [distribute] and [provider_opts] must be strings\n\
         \n\
         A minimal file looks like:\n\
         [distribute]\n\
         assets = \"dist/*.tar.gz\"\n\
         provider = \"github\""
    }

    /// Get hint for an invalid release version
    pub fn release_version() -> &'static str {
        "--release-version must be the semantic version that was released:\n\
         • 1.4.0\n\
         • v1.4.0 (the leading 'v' is stripped)\n\
         • 2.0.0-rc.1"
    }
}
