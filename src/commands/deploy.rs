use clap::Args;

use capstan::deploy::{self, DeployOptions, DeployOutcome};

use super::CmdResult;

#[derive(Args)]
pub struct DeployArgs {
    /// Environment profile to use
    #[arg(long, default_value = "staging")]
    pub env: String,

    /// Artifact index to select when the build produced several
    #[arg(long)]
    pub artifact: Option<usize>,

    /// Skip the interactive plan confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Resolve and stage only; make no remote changes
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: DeployArgs, global: &super::GlobalArgs) -> CmdResult<DeployOutcome> {
    let config = global.load_effective(&args.env)?;
    let options = DeployOptions {
        artifact_index: args.artifact,
        yes: args.yes,
        dry_run: args.dry_run,
    };

    let outcome = deploy::run(&config, &options)?;

    // An unconfirmed (declined) plan is not a success, but it is not an
    // error envelope either.
    let exit_code = if outcome.dry_run || outcome.confirmed {
        0
    } else {
        1
    };

    Ok((outcome, exit_code))
}
