//! Targets command

use crate::app::{OutputFormat, TargetsArgs};
use crate::output;
use anyhow::Result;
use nutrirag_core::{compute_targets, Config};

pub async fn run(args: TargetsArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let targets = compute_targets(&args.profile.to_profile(), &config.targets)?;
    print!("{}", output::format_targets(&targets, format));
    Ok(())
}
