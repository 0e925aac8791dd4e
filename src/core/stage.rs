//! Local staging for a deployment.
//!
//! Builds a throwaway directory holding everything that will be shipped
//! to the remote host: the project's local files, rendered templates and
//! the downloaded CI artifact. The directory lives for one deployment
//! attempt and is removed on drop.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use crate::config::EffectiveConfig;
use crate::error::{Error, Result};
use crate::resolver::ResolvedRelease;
use crate::utils::artifact::filename_from_url;
use crate::utils::template::{render_map, TemplateVars};

pub const TEMPLATES_DIR: &str = "templates";

pub struct StagedBuild {
    dir: TempDir,
    pub entries: Vec<String>,
}

impl StagedBuild {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Variables available to templates and the launch command.
pub fn template_vars(
    config: &EffectiveConfig,
    release: &ResolvedRelease,
    release_dir: &str,
) -> Result<HashMap<String, String>> {
    let mut vars = config.vars.clone();
    vars.insert(
        TemplateVars::APPLICATION.to_string(),
        release.application.clone(),
    );
    vars.insert(TemplateVars::USER.to_string(), release.user.clone());
    vars.insert(
        TemplateVars::BUILD_NUM.to_string(),
        release.build_num.to_string(),
    );
    vars.insert(
        TemplateVars::ARTIFACT_URL.to_string(),
        release.artifact_url.clone(),
    );
    vars.insert(
        TemplateVars::ARTIFACT_FILE.to_string(),
        filename_from_url(&release.artifact_url)?,
    );
    vars.insert(TemplateVars::RELEASE_DIR.to_string(), release_dir.to_string());
    vars.insert(
        TemplateVars::ENVIRONMENT.to_string(),
        config.environment.to_string(),
    );
    Ok(vars)
}

/// Copies the project's local entries and rendered templates into a new
/// staging directory.
///
/// Hidden entries, `capstan.json` and the `templates/` directory itself
/// are skipped; templates are rendered with [`template_vars`] and land in
/// the staging root under their own names.
pub fn stage(project_dir: &Path, vars: &HashMap<String, String>) -> Result<StagedBuild> {
    let dir = TempDir::with_prefix("capstan-").map_err(|e| {
        Error::internal_io(e.to_string(), Some("create staging directory".to_string()))
    })?;

    let mut entries = Vec::new();

    for entry in read_dir(project_dir)? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.')
            || name == crate::config::CONFIG_FILE
            || name == TEMPLATES_DIR
        {
            continue;
        }
        copy_recursively(&entry.path(), &dir.path().join(&name))?;
        log_status!("stage", "Copied {}", name);
        entries.push(name);
    }

    let templates_dir = project_dir.join(TEMPLATES_DIR);
    if templates_dir.is_dir() {
        for entry in read_dir(&templates_dir)? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let raw = fs::read_to_string(entry.path()).map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("read template {}", name)))
            })?;
            let rendered = render_map(&raw, vars);
            fs::write(dir.path().join(&name), rendered).map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("write template {}", name)))
            })?;
            log_status!("stage", "Rendered template {}", name);
            entries.push(name);
        }
    }

    entries.sort();
    Ok(StagedBuild { dir, entries })
}

/// Downloads the resolved artifact into the staging directory.
pub fn download_artifact(
    staged: &mut StagedBuild,
    artifact_url: &str,
    timeout: Duration,
) -> Result<String> {
    let filename = filename_from_url(artifact_url)?;
    let dest = staged.path().join(&filename);

    log_status!("stage", "Downloading {}", artifact_url);

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::download_failed(artifact_url, e.to_string()))?;

    let response = client
        .get(artifact_url)
        .send()
        .map_err(|e| Error::download_failed(artifact_url, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::download_failed(
            artifact_url,
            format!("HTTP {}", status.as_u16()),
        ));
    }

    let bytes = response
        .bytes()
        .map_err(|e| Error::download_failed(artifact_url, e.to_string()))?;
    fs::write(&dest, &bytes).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("write {}", dest.display())))
    })?;

    staged.entries.push(filename.clone());
    staged.entries.sort();
    Ok(filename)
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>> {
    let iter = fs::read_dir(dir).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", dir.display())))
    })?;
    let mut entries = Vec::new();
    for entry in iter {
        entries.push(entry.map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("read {}", dir.display())))
        })?);
    }
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

fn copy_recursively(from: &Path, to: &Path) -> Result<()> {
    if from.is_dir() {
        fs::create_dir_all(to).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create {}", to.display())))
        })?;
        for entry in read_dir(from)? {
            copy_recursively(&entry.path(), &to.join(entry.file_name()))?;
        }
        return Ok(());
    }

    fs::copy(from, to).map_err(|e| {
        Error::internal_io(
            e.to_string(),
            Some(format!("copy {} to {}", from.display(), to.display())),
        )
    })?;
    Ok(())
}
