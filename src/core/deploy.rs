//! Deployment orchestration.
//!
//! Ties the release resolver to the remote release steps: resolve, stage
//! locally, confirm, then create directories, transfer, swap the
//! `current` symlink and restart on the remote host. Any failed remote
//! step aborts the run.

use std::env;
use std::time::Duration;

use serde::Serialize;

use crate::ci::HttpCi;
use crate::config::{EffectiveConfig, Environment};
use crate::error::{Error, Result};
use crate::prompt::PromptEngine;
use crate::resolver::{FixedChooser, ResolvedRelease, Resolver};
use crate::ssh::SshClient;
use crate::stage::{self, StagedBuild};
use crate::utils::shell;
use crate::utils::template::render_map;

pub struct DeployOptions {
    pub artifact_index: Option<usize>,
    pub yes: bool,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutcome {
    pub release: ResolvedRelease,
    pub environment: Environment,
    pub host: String,
    pub release_dir: String,
    pub staged_entries: Vec<String>,
    pub confirmed: bool,
    pub dry_run: bool,
    pub steps: Vec<String>,
}

/// Resolves the release for the configured job without deploying.
pub fn resolve_release(
    config: &EffectiveConfig,
    artifact_index: Option<usize>,
) -> Result<ResolvedRelease> {
    let ci = HttpCi::new(Duration::from_secs(config.ci.timeout_secs))?;
    let resolver = Resolver::new(ci, &config.ci.url, &config.ci.job);

    match artifact_index {
        Some(index) => resolver.resolve(&config.application, &config.user, &FixedChooser(index)),
        None => {
            let prompt = PromptEngine::new();
            resolver.resolve(&config.application, &config.user, &prompt)
        }
    }
}

/// Runs the full deployment pipeline for one release.
pub fn run(config: &EffectiveConfig, options: &DeployOptions) -> Result<DeployOutcome> {
    let release = resolve_release(config, options.artifact_index)?;

    let timestamp = chrono::Utc::now().timestamp();
    let release_dir = config.release_dir(timestamp);

    let project_dir = env::current_dir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("resolve working directory".to_string())))?;

    let vars = stage::template_vars(config, &release, &release_dir)?;
    let mut staged = stage::stage(&project_dir, &vars)?;

    let mut outcome = DeployOutcome {
        release: release.clone(),
        environment: config.environment,
        host: config.server.host.clone(),
        release_dir: release_dir.clone(),
        staged_entries: Vec::new(),
        confirmed: false,
        dry_run: options.dry_run,
        steps: Vec::new(),
    };

    if options.dry_run {
        outcome.staged_entries = staged.entries.clone();
        return Ok(outcome);
    }

    stage::download_artifact(
        &mut staged,
        &release.artifact_url,
        Duration::from_secs(config.ci.timeout_secs),
    )?;
    outcome.staged_entries = staged.entries.clone();

    if !confirm_plan(config, &release, &release_dir, &staged, options.yes) {
        log_status!("deploy", "Aborted before any remote changes");
        return Ok(outcome);
    }
    outcome.confirmed = true;

    let client = SshClient::from_server(&config.server)?;

    ensure_directory(&client, &config.directory, &config.user)?;
    outcome.steps.push("ensure_directory".to_string());

    make_release_directory(&client, &release_dir, &config.user)?;
    outcome.steps.push("make_release_directory".to_string());

    transfer_build(&client, &staged, &release_dir, &config.user, timestamp)?;
    outcome.steps.push("transfer_build".to_string());

    swap_symlink(&client, config, &release_dir)?;
    outcome.steps.push("symlink".to_string());

    restart(&client, config, &release_dir, &vars)?;
    outcome.steps.push("restart".to_string());

    log_status!(
        "deploy",
        "Deployed {} build #{} to {}",
        release.application,
        release.build_num,
        config.server.host
    );

    Ok(outcome)
}

fn confirm_plan(
    config: &EffectiveConfig,
    release: &ResolvedRelease,
    release_dir: &str,
    staged: &StagedBuild,
    yes: bool,
) -> bool {
    if yes {
        return true;
    }

    let mut items = vec![
        format!("application: {}", release.application),
        format!("build: #{}", release.build_num),
        format!("artifact: {}", release.artifact_url),
        format!("target: {}@{}:{}", config.server.user, config.server.host, release_dir),
    ];
    items.extend(staged.entries.iter().map(|e| format!("ship: {}", e)));

    PromptEngine::new().confirm_list("Deployment plan:", &items, "Is this what you want?")
}

fn ensure_directory(client: &SshClient, directory: &str, owner: &str) -> Result<()> {
    log_status!("deploy", "Ensuring {}", directory);
    client.execute_checked(&format!("sudo mkdir -p {}", shell::quote_path(directory)))?;
    client.execute_checked(&format!(
        "sudo chown -R {} {}",
        shell::quote_arg(owner),
        shell::quote_path(directory)
    ))?;
    Ok(())
}

fn make_release_directory(client: &SshClient, release_dir: &str, owner: &str) -> Result<()> {
    log_status!("deploy", "Creating release directory {}", release_dir);
    client.execute_checked(&format!("sudo mkdir -p {}", shell::quote_path(release_dir)))?;
    client.execute_checked(&format!(
        "sudo chown -R {} {}",
        shell::quote_arg(owner),
        shell::quote_path(release_dir)
    ))?;
    Ok(())
}

fn transfer_build(
    client: &SshClient,
    staged: &StagedBuild,
    release_dir: &str,
    owner: &str,
    timestamp: i64,
) -> Result<()> {
    for (index, entry) in staged.entries.iter().enumerate() {
        let local = staged.path().join(entry);
        // Upload lands in /tmp first because the deploy user owns the
        // release directory only after the sudo chown that follows.
        let tmp_path = format!("/tmp/capstan-{}-{}", timestamp, index);

        let dest = format!("{}/{}", release_dir, entry);

        log_status!("deploy", "Transferring {}", entry);
        client.upload(&local.to_string_lossy(), &tmp_path)?;
        client.execute_checked(&format!(
            "sudo mv {} {}",
            shell::quote_path(&tmp_path),
            shell::quote_path(&dest),
        ))?;
        client.execute_checked(&format!(
            "sudo chown -R {owner}:{owner} {path}",
            owner = shell::quote_arg(owner),
            path = shell::quote_path(&dest),
        ))?;
    }
    Ok(())
}

fn swap_symlink(client: &SshClient, config: &EffectiveConfig, release_dir: &str) -> Result<()> {
    let link = config.current_link();
    log_status!("deploy", "Pointing {} at {}", link, release_dir);
    client.execute_checked(&format!(
        "sudo rm {} || true",
        shell::quote_path(&link)
    ))?;
    client.execute_checked(&format!(
        "sudo ln -sfn {} {}",
        shell::quote_path(release_dir),
        shell::quote_path(&link)
    ))?;
    Ok(())
}

fn restart(
    client: &SshClient,
    config: &EffectiveConfig,
    release_dir: &str,
    vars: &std::collections::HashMap<String, String>,
) -> Result<()> {
    let command = render_map(&config.launch_command, vars);
    log_status!("deploy", "Restarting: {}", command);
    client.execute_checked(&format!(
        "cd {} && {}",
        shell::quote_path(release_dir),
        command
    ))?;
    Ok(())
}
