use anyhow::Result;
use chrono::Local;
use clap::Args;
use levelwatch_lib::{Monitor, MonitorConfig};

use crate::output::{print_classes_table, print_json, OutputFormat};

#[derive(Args)]
pub struct ClassesArgs {
    /// Level heading to look for instead of TARGET_LEVEL (e.g. "Level 03")
    #[arg(long)]
    pub level: Option<String>,

    /// Also try the structural fallback when no heading or date match is found
    #[arg(long)]
    pub salvage: bool,
}

pub async fn run(args: &ClassesArgs, mut config: MonitorConfig, format: &OutputFormat) -> Result<()> {
    if let Some(level) = &args.level {
        config.target_level = level.clone();
    }
    config.table_salvage |= args.salvage;

    let monitor = Monitor::new(config)?;
    let classes = monitor.fetch_classes(Local::now().date_naive()).await?;

    match format {
        OutputFormat::Table => {
            println!("{} ({} classes)", monitor.config().target_level, classes.len());
            print_classes_table(&classes);
        }
        OutputFormat::Json => print_json(&classes),
    }
    Ok(())
}
