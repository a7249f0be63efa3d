//! SEMDIST.toml configuration and environment lookup
//!
//! An optional `SEMDIST.toml` in the working directory supplies defaults
//! for the CLI flags:
//!
//! ```toml
//! [distribute]
//! assets = "dist/*.tar.gz:release-$1.tar.gz"
//! provider = "github"
//!
//! [provider_opts]
//! github_enterprise_host = "git.example.com"
//! ```
//!
//! Precedence is always flags first, then environment variables, then this
//! file. Credential lookups go through [`OptionChain`] with an injected
//! [`Environment`] so tests never touch the process environment.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{hints, DistError, ResultExt};

/// Default configuration file name
pub const CONFIG_FILE: &str = "SEMDIST.toml";

/// Root configuration from SEMDIST.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemdistConfig {
    /// Distribution defaults
    #[serde(default)]
    pub distribute: DistributeConfig,

    /// Provider options, lowest precedence in the credential chain
    #[serde(default)]
    pub provider_opts: HashMap<String, String>,
}

/// The `[distribute]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistributeConfig {
    /// Whitespace-separated asset specification list
    pub assets: Option<String>,

    /// Hosting provider name (github or gitlab)
    pub provider: Option<String>,
}

impl SemdistConfig {
    /// Load SEMDIST.toml from the working directory
    ///
    /// A missing file is not an error; it yields the default (empty)
    /// configuration.
    pub fn load() -> Result<Self, DistError> {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from a specific path, defaulting when absent
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, DistError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| DistError::Config {
            message: format!("Failed to read {}", path.display()),
            source: Some(e.into()),
            hint: None,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, DistError> {
        toml::from_str(content).context_with_hint(
            format!("Failed to parse {}", CONFIG_FILE),
            hints::invalid_semdist_toml(),
        )
    }
}

/// Environment variable access, injectable for tests
///
/// Empty values are treated as unset everywhere, matching how CI systems
/// pass through undefined variables.
pub trait Environment {
    /// Look up a variable, `None` when unset or empty
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty()).cloned()
    }
}

/// Provider options collected from flags and SEMDIST.toml
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    values: HashMap<String, String>,
}

impl ProviderOptions {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Get an option value, treating empty strings as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Ordered lookup: explicit option first, then environment variables
pub struct OptionChain<'a> {
    options: &'a ProviderOptions,
    env: &'a dyn Environment,
}

impl<'a> OptionChain<'a> {
    pub fn new(options: &'a ProviderOptions, env: &'a dyn Environment) -> Self {
        Self { options, env }
    }

    /// Resolve `option_key`, falling back to `env_vars` in order
    ///
    /// The first non-empty value wins.
    pub fn resolve(&self, option_key: &str, env_vars: &[&str]) -> Option<String> {
        if let Some(value) = self.options.get(option_key) {
            return Some(value.to_string());
        }
        env_vars.iter().find_map(|name| self.env.var(name))
    }
}
