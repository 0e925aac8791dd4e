use clap::Args;
use serde::Serialize;

use capstan::deploy;
use capstan::resolver::ResolvedRelease;

use super::CmdResult;

#[derive(Args)]
pub struct ResolveArgs {
    /// Environment profile to use
    #[arg(long, default_value = "staging")]
    pub env: String,

    /// Artifact index to select when the build produced several
    #[arg(long)]
    pub artifact: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOutput {
    pub environment: String,
    pub job: String,
    pub release: ResolvedRelease,
}

pub fn run(args: ResolveArgs, global: &super::GlobalArgs) -> CmdResult<ResolveOutput> {
    let config = global.load_effective(&args.env)?;
    let release = deploy::resolve_release(&config, args.artifact)?;

    Ok((
        ResolveOutput {
            environment: config.environment.to_string(),
            job: config.ci.job.clone(),
            release,
        },
        0,
    ))
}
