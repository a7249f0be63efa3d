//! GitLab generic-package publishing with release links
//!
//! Each asset is uploaded as a generic package file, then linked to the
//! release `v{version}` so it shows up on the release page. The link is a
//! convenience: when linking fails after a successful upload, the asset
//! still counts as published and only a warning is printed.
//!
//! Token precedence: the `token` option, then `GITLAB_TOKEN` (both sent as
//! `PRIVATE-TOKEN`), then `CI_JOB_TOKEN` (sent as `JOB-TOKEN`). The base
//! URL comes from `gitlab_baseurl`, `CI_SERVER_URL`, or gitlab.com. The
//! target project (`gitlab_projectid`, id or full path) is required.

use std::fs::File;

use serde::Serialize;

use crate::assets::ResolvedAsset;
use crate::config::{Environment, OptionChain, ProviderOptions};
use crate::distributor::ReleaseOutcome;
use crate::error::{hints, DistError};
use crate::utils::terminal;

use super::{build_http_client, AssetPublisher};

/// Public GitLab endpoint
const GITLAB_URL: &str = "https://gitlab.com";

/// Publishes assets as generic packages and links them to the release
pub struct GitlabPublisher {
    client: reqwest::blocking::Client,
    base_url: String,
    /// Project id or path, already percent-encoded
    project: String,
    auth: GitlabAuth,
}

/// How requests authenticate against the API
enum GitlabAuth {
    /// Personal or project access token
    Private(String),
    /// CI job token
    Job(String),
}

impl GitlabAuth {
    fn header(&self) -> (&'static str, &str) {
        match self {
            GitlabAuth::Private(token) => ("PRIVATE-TOKEN", token),
            GitlabAuth::Job(token) => ("JOB-TOKEN", token),
        }
    }
}

/// Payload for the release link endpoint
#[derive(Debug, Serialize)]
struct ReleaseLink<'a> {
    name: &'a str,
    url: &'a str,
    link_type: &'a str,
}

impl GitlabPublisher {
    /// Build a publisher from provider options and the environment
    pub fn from_options(
        options: &ProviderOptions,
        env: &dyn Environment,
    ) -> Result<Self, DistError> {
        let chain = OptionChain::new(options, env);

        let base_url = chain
            .resolve("gitlab_baseurl", &["CI_SERVER_URL"])
            .unwrap_or_else(|| GITLAB_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let project = chain.resolve("gitlab_projectid", &[]).ok_or_else(|| {
            DistError::provider_init_with_hint(
                "gitlab",
                "gitlab project id missing",
                hints::gitlab_project_id(),
            )
        })?;

        let auth = match chain.resolve("token", &["GITLAB_TOKEN"]) {
            Some(token) => GitlabAuth::Private(token),
            None => match env.var("CI_JOB_TOKEN") {
                Some(token) => GitlabAuth::Job(token),
                None => {
                    return Err(DistError::provider_init_with_hint(
                        "gitlab",
                        "gitlab token missing",
                        hints::gitlab_token(),
                    ))
                }
            },
        };

        let client = build_http_client().map_err(|e| {
            DistError::provider_init_with_source("gitlab", "failed to create HTTP client", e.into())
        })?;

        Ok(Self {
            client,
            base_url,
            project: encode_component(&project),
            auth,
        })
    }

    /// Download URL of one package file, also used as the release link
    fn package_file_url(&self, asset: &ResolvedAsset, outcome: &ReleaseOutcome) -> String {
        format!(
            "{}/api/v4/projects/{}/packages/generic/{}/{}/{}",
            self.base_url,
            self.project,
            encode_component(asset.package_or(&outcome.repo)),
            encode_component(&outcome.version),
            encode_component(&asset.upload_name),
        )
    }

    fn create_release_link(
        &self,
        asset: &ResolvedAsset,
        outcome: &ReleaseOutcome,
        url: &str,
    ) -> Result<(), DistError> {
        let endpoint = format!(
            "{}/api/v4/projects/{}/releases/v{}/assets/links",
            self.base_url,
            self.project,
            encode_component(&outcome.version),
        );
        let payload = ReleaseLink {
            name: &asset.upload_name,
            url,
            link_type: "other",
        };

        let (header, token) = self.auth.header();
        let response = self
            .client
            .post(&endpoint)
            .header(header, token)
            .json(&payload)
            .send()
            .map_err(|e| {
                DistError::link_error_with_source(&asset.upload_name, "request failed", e.into())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DistError::link_error(
                &asset.upload_name,
                format!("HTTP {}", status.as_u16()),
            ));
        }
        Ok(())
    }
}

impl AssetPublisher for GitlabPublisher {
    fn publish(
        &self,
        asset: &ResolvedAsset,
        file: File,
        outcome: &ReleaseOutcome,
    ) -> Result<String, DistError> {
        let url = self.package_file_url(asset, outcome);

        let (header, token) = self.auth.header();
        let response = self
            .client
            .put(&url)
            .header(header, token)
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

        // The upload already succeeded; a failed link is only a warning.
        if let Err(err) = self.create_release_link(asset, outcome, &url) {
            terminal::print_warning(&err.to_string());
        }

        Ok(url)
    }
}

/// Percent-encode a URL path segment (project paths contain `/`)
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::path::PathBuf;

    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn outcome() -> ReleaseOutcome {
        ReleaseOutcome {
            owner: "acme".to_string(),
            repo: "widget".to_string(),
            version: "1.4.0".to_string(),
        }
    }

    fn asset(path: PathBuf, name: &str, package: Option<&str>) -> ResolvedAsset {
        ResolvedAsset {
            source_path: path,
            upload_name: name.to_string(),
            package: package.map(|p| p.to_string()),
        }
    }

    /// Publisher wired to a mock server instead of gitlab.com
    fn test_publisher(server: &Server, auth: GitlabAuth) -> GitlabPublisher {
        GitlabPublisher {
            client: build_http_client().unwrap(),
            base_url: server.url_str("/").trim_end_matches('/').to_string(),
            project: "42".to_string(),
            auth,
        }
    }

    #[test]
    fn test_from_options_requires_project_id() {
        let options = ProviderOptions::default();
        let env = env_of(&[("GITLAB_TOKEN", "t")]);

        let err = GitlabPublisher::from_options(&options, &env).err().unwrap();
        assert!(err.to_string().contains("gitlab project id missing"));
    }

    #[test]
    fn test_from_options_requires_token() {
        let mut values = HashMap::new();
        values.insert("gitlab_projectid".to_string(), "42".to_string());
        let options = ProviderOptions::new(values);
        let env: HashMap<String, String> = HashMap::new();

        let err = GitlabPublisher::from_options(&options, &env).err().unwrap();
        assert!(err.to_string().contains("gitlab token missing"));
    }

    #[test]
    fn test_from_options_prefers_private_over_job_token() {
        let mut values = HashMap::new();
        values.insert("gitlab_projectid".to_string(), "42".to_string());
        let options = ProviderOptions::new(values);
        let env = env_of(&[("GITLAB_TOKEN", "private"), ("CI_JOB_TOKEN", "job")]);

        let publisher = GitlabPublisher::from_options(&options, &env).unwrap();
        match publisher.auth {
            GitlabAuth::Private(token) => assert_eq!(token, "private"),
            GitlabAuth::Job(_) => panic!("job token must not win over GITLAB_TOKEN"),
        }
    }

    #[test]
    fn test_from_options_falls_back_to_job_token() {
        let mut values = HashMap::new();
        values.insert("gitlab_projectid".to_string(), "group/app".to_string());
        let options = ProviderOptions::new(values);
        let env = env_of(&[
            ("CI_JOB_TOKEN", "job"),
            ("CI_SERVER_URL", "https://git.example.com/"),
        ]);

        let publisher = GitlabPublisher::from_options(&options, &env).unwrap();
        assert!(matches!(publisher.auth, GitlabAuth::Job(_)));
        assert_eq!(publisher.base_url, "https://git.example.com");
        assert_eq!(publisher.project, "group%2Fapp");
    }

    #[test]
    fn test_publish_uploads_and_links() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.zip");
        std::fs::write(&path, "zip-bytes").unwrap();

        let server = Server::run();
        let download_url =
            server.url_str("/api/v4/projects/42/packages/generic/widget/1.4.0/app.zip");
        server.expect(
            Expectation::matching(all_of![
                request::method_path(
                    "PUT",
                    "/api/v4/projects/42/packages/generic/widget/1.4.0/app.zip",
                ),
                request::headers(contains(("private-token", "secret"))),
                request::body(matches("zip-bytes")),
            ])
            .respond_with(status_code(201)),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/api/v4/projects/42/releases/v1.4.0/assets/links"),
                request::headers(contains(("private-token", "secret"))),
                request::body(json_decoded(eq(json!({
                    "name": "app.zip",
                    "url": download_url,
                    "link_type": "other",
                })))),
            ])
            .respond_with(status_code(201)),
        );

        let publisher = test_publisher(&server, GitlabAuth::Private("secret".to_string()));
        let file = File::open(&path).unwrap();
        let url = publisher
            .publish(&asset(path, "app.zip", None), file, &outcome())
            .unwrap();

        assert!(url.ends_with("/packages/generic/widget/1.4.0/app.zip"));
    }

    #[test]
    fn test_publish_uses_asset_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.zip");
        std::fs::write(&path, "data").unwrap();

        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "PUT",
                "/api/v4/projects/42/packages/generic/bundles/1.4.0/cli.zip",
            ))
            .respond_with(status_code(201)),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/api/v4/projects/42/releases/v1.4.0/assets/links",
            ))
            .respond_with(status_code(201)),
        );

        let publisher = test_publisher(&server, GitlabAuth::Private("secret".to_string()));
        let file = File::open(&path).unwrap();
        publisher
            .publish(&asset(path, "cli.zip", Some("bundles")), file, &outcome())
            .unwrap();
    }

    #[test]
    fn test_job_token_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.zip");
        std::fs::write(&path, "data").unwrap();

        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path(
                    "PUT",
                    "/api/v4/projects/42/packages/generic/widget/1.4.0/app.zip",
                ),
                request::headers(contains(("job-token", "ci-job"))),
            ])
            .respond_with(status_code(201)),
        );
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/api/v4/projects/42/releases/v1.4.0/assets/links"),
                request::headers(contains(("job-token", "ci-job"))),
            ])
            .respond_with(status_code(201)),
        );

        let publisher = test_publisher(&server, GitlabAuth::Job("ci-job".to_string()));
        let file = File::open(&path).unwrap();
        publisher
            .publish(&asset(path, "app.zip", None), file, &outcome())
            .unwrap();
    }

    #[test]
    fn test_link_failure_keeps_upload_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.zip");
        std::fs::write(&path, "data").unwrap();

        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "PUT",
                "/api/v4/projects/42/packages/generic/widget/1.4.0/app.zip",
            ))
            .respond_with(status_code(201)),
        );
        server.expect(
            Expectation::matching(request::method_path(
                "POST",
                "/api/v4/projects/42/releases/v1.4.0/assets/links",
            ))
            .respond_with(status_code(500)),
        );

        let publisher = test_publisher(&server, GitlabAuth::Private("secret".to_string()));
        let file = File::open(&path).unwrap();
        let result = publisher.publish(&asset(path, "app.zip", None), file, &outcome());

        assert!(result.is_ok());
    }

    #[test]
    fn test_failed_upload_skips_link() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.zip");
        std::fs::write(&path, "data").unwrap();

        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "PUT",
                "/api/v4/projects/42/packages/generic/widget/1.4.0/app.zip",
            ))
            .respond_with(status_code(403)),
        );

        let publisher = test_publisher(&server, GitlabAuth::Private("secret".to_string()));
        let file = File::open(&path).unwrap();
        let err = publisher
            .publish(&asset(path, "app.zip", None), file, &outcome())
            .err()
            .unwrap();

        assert!(err.to_string().contains("HTTP 403"));
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("group/app"), "group%2Fapp");
        assert_eq!(encode_component("my file.zip"), "my%20file.zip");
        assert_eq!(encode_component("plain-1.2.3_x86.tar.gz"), "plain-1.2.3_x86.tar.gz");
    }
}
