//! Asset specification parsing and resolution
//!
//! An asset specification tells semdist which local files to upload and how
//! to name them. Specifications are whitespace separated; each token is
//! `PATTERN[:TEMPLATE][@PACKAGE]`:
//!
//! ```text
//! dist/*.tar.gz                        upload matches under their own name
//! build-*.tar.gz:release-$1.tar.gz     rename using wildcard captures
//! out/*.zip@cli-bundles                publish into the cli-bundles package
//! ```
//!
//! `TEMPLATE` renames the uploaded file, substituting `$1`, `$2`, ... with
//! the text each wildcard matched (see [`pattern`]). `PACKAGE` selects the
//! GitLab generic package; the GitHub publisher ignores it.

pub mod pattern;

use std::path::{Path, PathBuf};

use crate::error::{hints, DistError};
use pattern::WildcardPattern;

/// One parsed asset specification token
#[derive(Debug, Clone)]
pub struct AssetSpec {
    /// Glob selecting the files to upload
    pub pattern: WildcardPattern,
    /// Optional rename template with `$N` placeholders
    pub rename_template: Option<String>,
    /// Optional target package name
    pub package: Option<String>,
}

impl AssetSpec {
    /// Parse one `PATTERN[:TEMPLATE][@PACKAGE]` token
    pub fn parse(token: &str) -> Result<Self, DistError> {
        let (raw_pattern, rename_template, package) = split_token(token)?;
        let pattern = WildcardPattern::compile(raw_pattern)?;

        if let Some(template) = &rename_template {
            if template.contains('/') || template.contains('\\') {
                return Err(DistError::config_error(format!(
                    "rename template '{}' must not contain path separators",
                    template
                )));
            }
        }

        Ok(Self {
            pattern,
            rename_template,
            package,
        })
    }

    /// Expand the pattern against the working directory
    ///
    /// Matches are restricted to files and sorted by path, so the result is
    /// deterministic. Zero matches is not an error.
    pub fn expand(&self) -> Result<Vec<ResolvedAsset>, DistError> {
        let paths = glob::glob(self.pattern.glob()).map_err(|e| {
            DistError::config_error(format!(
                "invalid asset pattern '{}': {}",
                self.pattern.glob(),
                e
            ))
        })?;

        let mut matches: Vec<PathBuf> = paths
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .collect();
        matches.sort();

        let mut resolved = Vec::with_capacity(matches.len());
        for path in matches {
            let upload_name = self.upload_name(&path)?;
            resolved.push(ResolvedAsset {
                source_path: path,
                upload_name,
                package: self.package.clone(),
            });
        }
        Ok(resolved)
    }

    fn upload_name(&self, path: &Path) -> Result<String, DistError> {
        let name = match &self.rename_template {
            Some(template) => self.pattern.rename(&path.to_string_lossy(), template)?,
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    DistError::config_error(format!(
                        "asset path '{}' has no file name",
                        path.display()
                    ))
                })?,
        };

        if name.is_empty() {
            return Err(DistError::config_error(format!(
                "upload name for '{}' is empty after applying template '{}'",
                path.display(),
                self.rename_template.as_deref().unwrap_or("")
            )));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(DistError::config_error(format!(
                "upload name '{}' for '{}' contains a path separator",
                name,
                path.display()
            )));
        }
        Ok(name)
    }
}

/// A concrete file selected for upload
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    /// Local path the glob matched
    pub source_path: PathBuf,
    /// File name to publish under
    pub upload_name: String,
    /// Target package for providers that group uploads
    pub package: Option<String>,
}

impl ResolvedAsset {
    /// Package to publish into, falling back to the repository name
    pub fn package_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.package.as_deref().unwrap_or(default)
    }
}

/// Parse a whitespace-separated asset specification list
pub fn parse_list(spec_text: &str) -> Result<Vec<AssetSpec>, DistError> {
    let specs: Vec<AssetSpec> = spec_text
        .split_whitespace()
        .map(AssetSpec::parse)
        .collect::<Result<_, _>>()?;

    if specs.is_empty() {
        return Err(DistError::config_error_with_hint(
            "asset specification is empty",
            None,
            hints::assets_option(),
        ));
    }
    Ok(specs)
}

/// Resolve a specification list into upload-ready assets
///
/// Assets appear in token order; within a token they follow the sorted glob
/// matches.
pub fn resolve(spec_text: &str) -> Result<Vec<ResolvedAsset>, DistError> {
    let mut assets = Vec::new();
    for spec in parse_list(spec_text)? {
        assets.extend(spec.expand()?);
    }
    Ok(assets)
}

/// Split a token into pattern, template, and package parts
///
/// The first `:` introduces the template, the first `@` after it the
/// package. Without a `:`, the first `@` introduces the package directly.
fn split_token(token: &str) -> Result<(&str, Option<String>, Option<String>), DistError> {
    let (raw_pattern, template, package) = match token.split_once(':') {
        Some((pattern, rest)) => match rest.split_once('@') {
            Some((template, package)) => (pattern, Some(template), Some(package)),
            None => (pattern, Some(rest), None),
        },
        None => match token.split_once('@') {
            Some((pattern, package)) => (pattern, None, Some(package)),
            None => (token, None, None),
        },
    };

    if raw_pattern.is_empty() {
        return Err(DistError::config_error(format!(
            "asset specification '{}' has no pattern",
            token
        )));
    }
    let template = match template {
        Some("") => {
            return Err(DistError::config_error(format!(
                "asset specification '{}' has an empty rename template",
                token
            )))
        }
        other => other.map(str::to_string),
    };
    let package = match package {
        Some("") => {
            return Err(DistError::config_error(format!(
                "asset specification '{}' has an empty package name",
                token
            )))
        }
        other => other.map(str::to_string),
    };

    Ok((raw_pattern, template, package))
}
