//! Deployment configuration.
//!
//! Loaded once per invocation from `capstan.json` in the working
//! directory, validated eagerly, then merged with the selected
//! environment profile into an immutable [`EffectiveConfig`] before any
//! resolution or remote work starts.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const CONFIG_FILE: &str = "capstan.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Staging,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Staging
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(Error::validation_invalid_argument(
                "env",
                "Unknown environment (expected 'staging' or 'production')",
                Some(other.to_string()),
            )),
        }
    }
}

/// On-disk shape of `capstan.json`. Everything is optional at parse time;
/// required keys are enforced by [`CapstanConfig::validate`] so a missing
/// key reports its name instead of a serde type error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapstanConfig {
    pub application: Option<String>,
    pub user: Option<String>,
    pub launch_command: Option<String>,
    pub directory: Option<String>,
    #[serde(default)]
    pub ci: CiSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub vars: HashMap<String, String>,
    #[serde(default)]
    pub env: EnvSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiSection {
    pub url: Option<String>,
    pub job: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSection {
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvSection {
    #[serde(default)]
    pub staging: Profile,
    #[serde(default)]
    pub production: Profile,
}

/// Per-environment overrides merged over the top-level defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: Option<String>,
    pub launch_command: Option<String>,
    pub directory: Option<String>,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

impl CapstanConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::internal_io(
                e.to_string(),
                Some(format!("read {}", path.display())),
            )
            .with_hint("Run 'capstan init' to create a starter capstan.json")
        })?;

        serde_json::from_str(&raw)
            .map_err(|e| Error::config_invalid_json(e, path.display().to_string()))
    }

    fn profile(&self, environment: Environment) -> &Profile {
        match environment {
            Environment::Staging => &self.env.staging,
            Environment::Production => &self.env.production,
        }
    }

    /// Merges the selected profile over the defaults and enforces
    /// required keys. Fails with `config.missing_key` naming the first
    /// missing field.
    pub fn resolve(&self, environment: Environment) -> Result<EffectiveConfig> {
        let profile = self.profile(environment);

        let application = require(self.application.clone(), "application")?;
        let user = require(
            profile.user.clone().or_else(|| self.user.clone()),
            "user",
        )?;
        let launch_command = require(
            profile
                .launch_command
                .clone()
                .or_else(|| self.launch_command.clone()),
            "launchCommand",
        )?;
        let ci_url = require(self.ci.url.clone(), "ci.url")?;
        let ci_job = require(self.ci.job.clone(), "ci.job")?;
        let host = require(
            profile.server.host.clone().or_else(|| self.server.host.clone()),
            "server.host",
        )?;

        let directory = profile
            .directory
            .clone()
            .or_else(|| self.directory.clone())
            .unwrap_or_else(|| format!("/opt/{}", application));

        let mut vars = self.vars.clone();
        vars.extend(profile.vars.clone());

        Ok(EffectiveConfig {
            environment,
            application,
            user: user.clone(),
            launch_command,
            directory,
            ci: CiSettings {
                url: ci_url,
                job: ci_job,
                timeout_secs: self
                    .ci
                    .timeout_secs
                    .unwrap_or(crate::ci::DEFAULT_TIMEOUT_SECS),
            },
            server: ServerSettings {
                host,
                user: profile
                    .server
                    .user
                    .clone()
                    .or_else(|| self.server.user.clone())
                    .unwrap_or(user),
                port: profile.server.port.or(self.server.port).unwrap_or(22),
                identity_file: profile
                    .server
                    .identity_file
                    .clone()
                    .or_else(|| self.server.identity_file.clone()),
            },
            vars,
        })
    }
}

fn require(value: Option<String>, key: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::config_missing_key(key, None)),
    }
}

/// Validated, immutable configuration for one deployment invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    pub environment: Environment,
    pub application: String,
    pub user: String,
    pub launch_command: String,
    pub directory: String,
    pub ci: CiSettings,
    pub server: ServerSettings,
    pub vars: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CiSettings {
    pub url: String,
    pub job: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub host: String,
    pub user: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
}

impl EffectiveConfig {
    pub fn releases_dir(&self) -> String {
        format!("{}/releases", self.directory)
    }

    pub fn current_link(&self) -> String {
        format!("{}/releases/current", self.directory)
    }

    pub fn release_dir(&self, timestamp: i64) -> String {
        format!("{}/releases/{}", self.directory, timestamp)
    }
}
