use std::fs;

use capstan::config::{CapstanConfig, Environment};
use capstan::error::ErrorCode;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("capstan.json");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_and_resolves_a_full_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "application": "app",
            "user": "deployer",
            "launchCommand": "sh launch.sh",
            "directory": "/srv/app",
            "ci": { "url": "http://ci", "job": "app-release", "timeoutSecs": 5 },
            "server": { "host": "app1.example.com", "port": 2222, "identityFile": "~/.ssh/key" }
        }"#,
    );

    let config = CapstanConfig::load(&path).unwrap();
    let effective = config.resolve(Environment::Staging).unwrap();

    assert_eq!(effective.application, "app");
    assert_eq!(effective.directory, "/srv/app");
    assert_eq!(effective.ci.timeout_secs, 5);
    assert_eq!(effective.server.port, 2222);
    assert_eq!(effective.releases_dir(), "/srv/app/releases");
}

#[test]
fn missing_file_error_hints_at_init() {
    let dir = TempDir::new().unwrap();

    let err = CapstanConfig::load(&dir.path().join("capstan.json")).unwrap_err();

    assert_eq!(err.code, ErrorCode::InternalIoError);
    assert!(err
        .hints
        .iter()
        .any(|h| h.message.contains("capstan init")));
}

#[test]
fn invalid_json_reports_the_path() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{ not json");

    let err = CapstanConfig::load(&path).unwrap_err();

    assert_eq!(err.code, ErrorCode::ConfigInvalidJson);
    assert_eq!(
        err.details.get("path").and_then(|v| v.as_str()),
        Some(path.display().to_string().as_str())
    );
}

#[test]
fn each_required_key_is_reported_when_missing() {
    let dir = TempDir::new().unwrap();
    let cases = [
        (r#"{}"#, "application"),
        (r#"{"application": "app"}"#, "user"),
        (r#"{"application": "app", "user": "u"}"#, "launchCommand"),
        (
            r#"{"application": "app", "user": "u", "launchCommand": "sh run.sh"}"#,
            "ci.url",
        ),
        (
            r#"{"application": "app", "user": "u", "launchCommand": "sh run.sh",
                "ci": {"url": "http://ci"}}"#,
            "ci.job",
        ),
        (
            r#"{"application": "app", "user": "u", "launchCommand": "sh run.sh",
                "ci": {"url": "http://ci", "job": "j"}}"#,
            "server.host",
        ),
    ];

    for (contents, expected_key) in cases {
        let path = write_config(&dir, contents);
        let config = CapstanConfig::load(&path).unwrap();
        let err = config.resolve(Environment::Staging).unwrap_err();

        assert_eq!(err.code, ErrorCode::ConfigMissingKey, "case: {}", expected_key);
        assert_eq!(
            err.details.get("key").and_then(|v| v.as_str()),
            Some(expected_key)
        );
    }
}

#[test]
fn blank_values_count_as_missing() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "application": "  ",
            "user": "u",
            "launchCommand": "sh run.sh",
            "ci": { "url": "http://ci", "job": "j" },
            "server": { "host": "h" }
        }"#,
    );

    let err = CapstanConfig::load(&path)
        .unwrap()
        .resolve(Environment::Staging)
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ConfigMissingKey);
    assert_eq!(err.details.get("key").and_then(|v| v.as_str()), Some("application"));
}
