use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{config, deploy, init, resolve};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "capstan")]
#[command(version = VERSION)]
#[command(about = "CLI for deploying CI-built artifacts to remote application servers")]
struct Cli {
    /// Path to the config file (default: ./capstan.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter capstan.json
    Init(init::InitArgs),
    /// Resolve the latest eligible CI build without deploying
    Resolve(resolve::ResolveArgs),
    /// Deploy the latest eligible CI build to the remote server
    Deploy(deploy::DeployArgs),
    /// Show the effective configuration for an environment
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        config_path: cli.config,
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
