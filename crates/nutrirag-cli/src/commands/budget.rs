//! Budget command

use crate::app::{BudgetArgs, OutputFormat};
use crate::output;
use anyhow::Result;
use nutrirag_core::{budget, Config};

pub async fn run(args: BudgetArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let start_date = args
        .start_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let labs = args.labs.to_panel();

    let budget = budget::plan(
        &args.profile.to_profile(),
        labs.as_ref(),
        &config.targets,
        args.period,
        start_date,
        !args.strict,
    )?;

    print!("{}", output::format_budget(&budget, format));
    Ok(())
}
