//! Hudson/Jenkins CI API client.
//!
//! The CI server exposes job, build and artifact metadata as JSON at
//! `<entity_url>/api/json`. This module holds the typed wire model and a
//! blocking HTTP client behind the [`CiApi`] seam so resolution logic can
//! be tested without a server.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{Error, Result};

/// One entry of the server's top-level job index.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRef {
    pub name: String,
    pub url: String,
}

/// Response of `<ci_base_url>/api/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobIndex {
    #[serde(default)]
    pub jobs: Vec<JobRef>,
}

/// Reference to one build of a job.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildRef {
    pub url: String,
}

/// Response of `<job_url>/api/json`. Builds are ordered newest-first by
/// the server.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDetail {
    #[serde(default)]
    pub builds: Vec<BuildRef>,
}

/// A file produced by a build, addressed relative to the build URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub relative_path: String,
}

/// Response of `<build_url>/api/json`.
///
/// `result` is `null` on the wire while the build is still running.
#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    pub number: u64,
    pub url: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub building: bool,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Read access to the CI server's JSON API.
pub trait CiApi {
    fn job_index(&self, base_url: &str) -> Result<JobIndex>;
    fn job(&self, job_url: &str) -> Result<JobDetail>;
    fn build(&self, build_url: &str) -> Result<Build>;
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking HTTP implementation of [`CiApi`].
pub struct HttpCi {
    client: Client,
}

impl HttpCi {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network("(client init)", e.to_string()))?;
        Ok(Self { client })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, entity_url: &str) -> Result<T> {
        let url = format!("{}/api/json", entity_url.trim_end_matches('/'));

        let response = self.client.get(&url).send().map_err(|e| {
            if e.is_timeout() {
                Error::network_timeout(&url)
            } else {
                Error::network(&url, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(
                &url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        // Malformed JSON is a network-class failure: the server spoke,
        // but not the API we expect.
        response.json::<T>().map_err(|e| {
            if e.is_timeout() {
                Error::network_timeout(&url)
            } else {
                Error::network(&url, e.to_string())
            }
        })
    }
}

impl CiApi for HttpCi {
    fn job_index(&self, base_url: &str) -> Result<JobIndex> {
        self.get_json(base_url)
    }

    fn job(&self, job_url: &str) -> Result<JobDetail> {
        self.get_json(job_url)
    }

    fn build(&self, build_url: &str) -> Result<Build> {
        self.get_json(build_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_deserializes_null_result_and_missing_artifacts() {
        let build: Build = serde_json::from_str(
            r#"{"number": 12, "url": "http://ci/job/app/12/", "result": null, "building": true}"#,
        )
        .unwrap();

        assert_eq!(build.number, 12);
        assert!(build.building);
        assert!(build.result.is_none());
        assert!(build.artifacts.is_empty());
    }

    #[test]
    fn artifact_uses_camel_case_relative_path() {
        let artifact: Artifact =
            serde_json::from_str(r#"{"relativePath": "target/app-1.0.tar.gz"}"#).unwrap();
        assert_eq!(artifact.relative_path, "target/app-1.0.tar.gz");
    }
}
