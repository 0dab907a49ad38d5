use anyhow::{bail, Result};
use clap::Args;
use levelwatch_lib::{Monitor, MonitorConfig};

use crate::output::{print_check_report, print_json, OutputFormat};

#[derive(Args)]
pub struct CheckArgs {
    /// Run the check without sending any alert
    #[arg(long)]
    pub no_alert: bool,
}

pub async fn run(args: &CheckArgs, mut config: MonitorConfig, format: &OutputFormat) -> Result<()> {
    if args.no_alert {
        config.email_alert = false;
    }
    let monitor = Monitor::new(config)?;
    let report = monitor.run_check_once().await;

    match format {
        OutputFormat::Table => print_check_report(&report),
        OutputFormat::Json => print_json(&report.summary),
    }

    if !report.ok {
        bail!("{}", report.result_text);
    }
    Ok(())
}
