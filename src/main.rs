use anyhow::{Context, Result};
use clap::{Arg, Command};
use notfis_relay::models::parse_iso_date;
use notfis_relay::{run_with_notification, AppConfig, RelayReport, Ssh2Connector};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("NOTFIS Relay")
        .version("0.1")
        .about("Relays the daily NOTFIS export from the provider API to the partner SFTP server")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Set the log level (trace, debug, info, warn, error)")
                .default_value("info"),
        )
        .arg(
            Arg::new("reference-date")
                .long("reference-date")
                .value_name("YYYY-MM-DD")
                .help("Last day of the export window (defaults to today)"),
        )
        .arg(
            Arg::new("skip-upload")
                .long("skip-upload")
                .help("Download and validate the export without writing to SFTP")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| "info".to_string());

    // Initialize logging
    initialize_logging(&log_level)?;

    // Load environment variables
    load_environment_variables();

    let config = create_app_config(&matches, log_level)?;

    run_application(config).await
}

/// Combine environment secrets with command line options
fn create_app_config(matches: &clap::ArgMatches, log_level: String) -> Result<AppConfig> {
    let reference_date = matches
        .get_one::<String>("reference-date")
        .map(|value| parse_iso_date(value))
        .transpose()
        .context("Invalid reference-date value")?;

    Ok(AppConfig {
        reference_date,
        skip_upload: matches.get_flag("skip-upload"),
        log_level,
        ..AppConfig::from_env()
    })
}

/// Initialize structured logging with tracing
fn initialize_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("rustls=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

/// Load a .env file if present; secrets are validated by the pipeline
fn load_environment_variables() {
    if dotenvy::dotenv().is_err() {
        info!("No .env file found, using system environment variables");
    }
}

async fn run_application(config: AppConfig) -> Result<()> {
    info!("Starting NOTFIS relay");
    info!("Configuration: {:#?}", config);

    let range = config.date_range();
    let report = run_with_notification(&config, &range, Ssh2Connector).await?;

    print_relay_report(&report, config.skip_upload);
    info!("Relay completed successfully");
    Ok(())
}

fn print_relay_report(report: &RelayReport, skip_upload: bool) {
    info!("=== RELAY REPORT ===");
    if skip_upload {
        info!("Dry run: nothing was written to SFTP");
    }
    info!("Archive members processed: {}", report.total_processed());
    info!("Files uploaded: {}", report.uploaded.len());
    info!("Members skipped: {}", report.skipped.len());
    info!("Bytes uploaded: {}", report.uploaded_bytes());

    for file in &report.uploaded {
        info!(
            "  {} -> {} ({} bytes, sha256 {})",
            file.source_name, file.remote_path, file.size_bytes, file.sha256
        );
    }
}
