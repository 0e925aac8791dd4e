use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    CiJobNotFound,
    CiNoBuilds,
    CiBuildNotSuccessful,
    CiBuildInProgress,
    CiNoArtifacts,
    CiInvalidSelection,
    CiNetwork,
    CiTimeout,

    SshServerInvalid,
    RemoteCommandFailed,

    DeployDownloadFailed,
    DeployUploadFailed,

    InternalIoError,
    InternalJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::CiJobNotFound => "ci.job_not_found",
            ErrorCode::CiNoBuilds => "ci.no_builds",
            ErrorCode::CiBuildNotSuccessful => "ci.build_not_successful",
            ErrorCode::CiBuildInProgress => "ci.build_in_progress",
            ErrorCode::CiNoArtifacts => "ci.no_artifacts",
            ErrorCode::CiInvalidSelection => "ci.invalid_selection",
            ErrorCode::CiNetwork => "ci.network",
            ErrorCode::CiTimeout => "ci.timeout",

            ErrorCode::SshServerInvalid => "ssh.server_invalid",
            ErrorCode::RemoteCommandFailed => "remote.command_failed",

            ErrorCode::DeployDownloadFailed => "deploy.download_failed",
            ErrorCode::DeployUploadFailed => "deploy.upload_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
        }
    }

    /// Stable process exit code for this error family.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::ConfigMissingKey
            | ErrorCode::ConfigInvalidJson
            | ErrorCode::ConfigInvalidValue
            | ErrorCode::ValidationInvalidArgument => 2,

            ErrorCode::CiJobNotFound
            | ErrorCode::CiNoBuilds
            | ErrorCode::CiBuildNotSuccessful
            | ErrorCode::CiBuildInProgress
            | ErrorCode::CiNoArtifacts
            | ErrorCode::CiInvalidSelection => 10,

            ErrorCode::SshServerInvalid | ErrorCode::RemoteCommandFailed => 20,

            ErrorCode::CiNetwork | ErrorCode::CiTimeout => 30,

            ErrorCode::DeployDownloadFailed
            | ErrorCode::DeployUploadFailed
            | ErrorCode::InternalIoError
            | ErrorCode::InternalJsonError => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStateDetails {
    pub job: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidSelectionDetails {
    pub index: usize,
    pub available: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub host: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshServerInvalidDetails {
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn details_value<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let key = key.into();
        let message = format!("Required configuration key '{}' is not set", key);
        Self::new(
            ErrorCode::ConfigMissingKey,
            message,
            details_value(ConfigMissingKeyDetails { key, path }),
        )
    }

    pub fn config_invalid_json(err: serde_json::Error, path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Configuration file is not valid JSON",
            serde_json::json!({ "path": path.into(), "error": err.to_string() }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        problem: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            serde_json::json!({ "key": key.into(), "problem": problem.into(), "value": value }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details_value(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
                value,
            }),
        )
    }

    pub fn job_not_found(job: impl Into<String>, ci_url: impl Into<String>) -> Self {
        let job = job.into();
        Self::new(
            ErrorCode::CiJobNotFound,
            format!("No CI job named '{}' could be found", job),
            serde_json::json!({ "job": job, "ciUrl": ci_url.into() }),
        )
        .with_hint("Check the 'ci.job' value against the CI server's job list")
    }

    pub fn no_builds(job: impl Into<String>) -> Self {
        let job = job.into();
        Self::new(
            ErrorCode::CiNoBuilds,
            format!("There are no existing builds for job '{}'", job),
            details_value(BuildStateDetails {
                job,
                build_number: None,
                result: None,
            }),
        )
    }

    pub fn build_not_successful(
        job: impl Into<String>,
        build_number: u64,
        result: Option<String>,
    ) -> Self {
        let shown = result.as_deref().unwrap_or("(none)");
        let message = format!("The last build was not successful: {}", shown);
        Self::new(
            ErrorCode::CiBuildNotSuccessful,
            message,
            details_value(BuildStateDetails {
                job: job.into(),
                build_number: Some(build_number),
                result,
            }),
        )
    }

    pub fn build_in_progress(job: impl Into<String>, build_number: u64) -> Self {
        Self::new(
            ErrorCode::CiBuildInProgress,
            "The job is currently building. Wait until it finishes.",
            details_value(BuildStateDetails {
                job: job.into(),
                build_number: Some(build_number),
                result: None,
            }),
        )
    }

    pub fn no_artifacts(job: impl Into<String>, build_number: u64) -> Self {
        Self::new(
            ErrorCode::CiNoArtifacts,
            "The eligible build produced no artifacts",
            details_value(BuildStateDetails {
                job: job.into(),
                build_number: Some(build_number),
                result: Some("SUCCESS".to_string()),
            }),
        )
    }

    pub fn invalid_selection(index: usize, available: usize) -> Self {
        Self::new(
            ErrorCode::CiInvalidSelection,
            format!(
                "Artifact selection {} is out of range (0..{})",
                index, available
            ),
            details_value(InvalidSelectionDetails { index, available }),
        )
    }

    pub fn network(url: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CiNetwork,
            "CI server request failed",
            serde_json::json!({ "url": url.into(), "error": problem.into() }),
        )
    }

    pub fn network_timeout(url: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CiTimeout,
            "CI server request timed out",
            serde_json::json!({ "url": url.into() }),
        )
    }

    pub fn ssh_server_invalid(missing_fields: Vec<String>) -> Self {
        Self::new(
            ErrorCode::SshServerInvalid,
            "Server is not properly configured",
            details_value(SshServerInvalidDetails { missing_fields }),
        )
    }

    pub fn remote_command_failed(details: RemoteCommandFailedDetails) -> Self {
        let message = format!("Remote command failed: {}", details.command);
        Self::new(
            ErrorCode::RemoteCommandFailed,
            message,
            details_value(details),
        )
    }

    pub fn download_failed(url: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DeployDownloadFailed,
            "Artifact download failed",
            serde_json::json!({ "url": url.into(), "error": problem.into() }),
        )
    }

    pub fn upload_failed(path: impl Into<String>, problem: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DeployUploadFailed,
            "Upload to remote host failed",
            serde_json::json!({ "path": path.into(), "error": problem.into() }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }
}
