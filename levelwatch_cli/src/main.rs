mod commands;
mod output;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use levelwatch_lib::MonitorConfig;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "levelwatch")]
#[command(about = "Watch a class schedule page for open seats")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one check cycle and print the result
    Check(commands::check::CheckArgs),
    /// Fetch and print the parsed classes for the target level
    Classes(commands::classes::ClassesArgs),
    /// Serve the HTTP endpoints and run the check loop in the background
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("levelwatch=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    let config = MonitorConfig::from_env();

    match &cli.command {
        Commands::Check(args) => commands::check::run(args, config, &format).await?,
        Commands::Classes(args) => commands::classes::run(args, config, &format).await?,
        Commands::Serve(args) => commands::serve::run(args, config).await?,
    }

    Ok(())
}
