use std::path::PathBuf;

use capstan::config::{CapstanConfig, EffectiveConfig, Environment, CONFIG_FILE};

pub type CmdResult<T> = capstan::Result<(T, i32)>;

pub struct GlobalArgs {
    pub config_path: Option<PathBuf>,
}

impl GlobalArgs {
    fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Loads the config file and merges the selected environment profile.
    pub fn load_effective(&self, env: &str) -> capstan::Result<EffectiveConfig> {
        let environment: Environment = env.parse()?;
        let config = CapstanConfig::load(&self.config_path())?;
        config.resolve(environment)
    }
}

pub mod config;
pub mod deploy;
pub mod init;
pub mod resolve;

macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (capstan::Result<serde_json::Value>, i32) {
    crate::tty::status("capstan is working...");

    match command {
        crate::Commands::Init(args) => dispatch!(args, global, init),
        crate::Commands::Resolve(args) => dispatch!(args, global, resolve),
        crate::Commands::Deploy(args) => dispatch!(args, global, deploy),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
