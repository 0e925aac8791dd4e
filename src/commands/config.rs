use clap::Args;

use capstan::config::EffectiveConfig;

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    /// Environment profile to use
    #[arg(long, default_value = "staging")]
    pub env: String,
}

pub fn run(args: ConfigArgs, global: &super::GlobalArgs) -> CmdResult<EffectiveConfig> {
    let config = global.load_effective(&args.env)?;
    Ok((config, 0))
}
