//! azcost - Aggregate an Azure billing export into cost reports

use azcost::{
    cli::Cli,
    config::{ReportConfig, load_dotenv},
    error::Result,
    output::get_formatter,
    pipeline::run_reports,
};
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(cli: &Cli) {
    // --quiet and --verbose override RUST_LOG
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::new("azcost=debug,azcost_source_blob=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new("azcost=info,azcost_source_blob=info")
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(is_terminal::is_terminal(std::io::stderr())),
        )
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let config = ReportConfig::from_cli(cli)?;
    info!(
        "Generating cost reports from {} into {}",
        config.source,
        config.out_dir.display()
    );

    let summary = run_reports(&config).await?;

    let formatter = get_formatter(config.json);
    println!(
        "{}",
        formatter.format_summary(&summary.reports, &summary.totals)
    );

    summary.into_result().map(|_| ())
}

#[tokio::main]
async fn main() -> ExitCode {
    // The .env file has to be loaded before clap reads STORAGE_URL and OUT_FOLDER
    load_dotenv();
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
