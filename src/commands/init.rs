use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use capstan::config::CONFIG_FILE;
use capstan::error::Error;

use super::CmdResult;

#[derive(Args)]
pub struct InitArgs {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOutput {
    pub path: String,
    pub created: bool,
}

const STARTER_CONFIG: &str = r#"{
  "application": "my-app",
  "user": "deployer",
  "launchCommand": "sh launch.sh",
  "ci": {
    "url": "http://ci.example.com",
    "job": "my-app-release"
  },
  "server": {
    "host": "staging.example.com"
  },
  "env": {
    "production": {
      "server": { "host": "prod.example.com" }
    }
  }
}
"#;

pub fn run(_args: InitArgs, global: &super::GlobalArgs) -> CmdResult<InitOutput> {
    let path = global
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    if path.exists() {
        return Err(Error::validation_invalid_argument(
            "config",
            "Refusing to overwrite an existing config file",
            Some(path.display().to_string()),
        ));
    }

    std::fs::write(&path, STARTER_CONFIG).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })?;

    Ok((
        InitOutput {
            path: path.display().to_string(),
            created: true,
        },
        0,
    ))
}
