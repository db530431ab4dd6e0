//! CLI entry point for the SEMS daily summary tool.
//!
//! Provides subcommands for summarizing one inverter-day from the SEMS
//! portal, summarizing the local mock document, checking credentials and
//! serving the HTTP API.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use sems_daily::{
    api::{AppState, create_router},
    fetch::BasicClient,
    infra::{SemsConfig, sems::SemsClient},
    mock::{MockDocument, filter_date},
    output::{append_summary, print_json, print_pretty, render_report, write_table_csv},
    pipeline::{fetch_daily_table, parse_column_list},
    services::SemsApi,
    summary::summarize,
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sems_daily")]
#[command(about = "Daily summaries of GoodWe inverters from the SEMS portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one day of telemetry from SEMS and print its summary
    Summary {
        /// Inverter serial number
        #[arg(short, long, env = "SEMS_DEVICE_ID")]
        device: String,

        /// Day to summarize (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Comma separated SEMS columns
        #[arg(short, long, default_value = "Pac,Eday,Cbattery1")]
        columns: String,

        /// Export the aligned table to this CSV file
        #[arg(long)]
        csv: Option<String>,

        /// Gzip the exported CSV
        #[arg(long, default_value_t = false, requires = "csv")]
        gzip: bool,

        /// CSV file to append the summary to
        #[arg(long)]
        history: Option<String>,

        /// Print the Portuguese text report instead of JSON
        #[arg(long, default_value_t = false)]
        report: bool,
    },
    /// Summarize the local mock document
    Mock {
        #[arg(short, long, env = "SEMS_MOCK_PATH", default_value = "data/mock_today.json")]
        path: PathBuf,

        /// Keep only rows from this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the Portuguese text report instead of JSON
        #[arg(long, default_value_t = false)]
        report: bool,
    },
    /// Check SEMS credentials by logging in
    Login,
    /// Run the HTTP API
    Serve {
        #[arg(short, long, env = "SEMS_BIND", default_value = "0.0.0.0:8000")]
        bind: String,

        #[arg(long, env = "SEMS_MOCK_PATH", default_value = "data/mock_today.json")]
        mock_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sems_daily.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sems_daily.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summary {
            device,
            date,
            columns,
            csv,
            gzip,
            history,
            report,
        } => {
            let config = SemsConfig::from_env()?;
            let credentials = config.credentials()?;
            let client = sems_client(&config);

            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let columns = parse_column_list(Some(&columns));

            let outcome = fetch_daily_table(&client, &credentials, &device, date, &columns).await?;
            for empty in &outcome.empty_columns {
                warn!(column = %empty.column, "Column returned no data");
            }

            if let Some(path) = &csv {
                write_table_csv(path, &outcome.table, gzip)?;
            }

            let summary = outcome.summary();
            match &summary {
                Some(s) => {
                    print_pretty(s);
                    if let Some(path) = &history {
                        append_summary(path, &device, date, s)?;
                        info!(path = %path, "Summary appended to history");
                    }
                }
                None => warn!(device = %device, date = %date, "No data for this day"),
            }

            emit(summary.as_ref(), report)?;
        }
        Commands::Mock { path, date, report } => {
            let doc = MockDocument::load(&path)?;
            let mut table = doc.into_table();
            if let Some(date) = date {
                filter_date(&mut table, date);
            }
            info!(path = %path.display(), rows = table.len(), "Mock document loaded");

            emit(summarize(&table).as_ref(), report)?;
        }
        Commands::Login => {
            let config = SemsConfig::from_env()?;
            let credentials = config.credentials()?;
            let client = sems_client(&config);

            client.login(&credentials).await?;
            info!(region = %credentials.login_region, "SEMS login succeeded");
        }
        Commands::Serve { bind, mock_path } => {
            let config = SemsConfig::from_env()?;
            let credentials = match config.credentials() {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(error = %e, "Live routes disabled");
                    None
                }
            };

            let state = AppState {
                sems: Arc::new(sems_client(&config)),
                credentials,
                mock_path,
            };
            let app = create_router(state);

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            info!(addr = %bind, "Server listening");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("Server stopped");
        }
    }

    Ok(())
}

fn sems_client(config: &SemsConfig) -> SemsClient {
    SemsClient::new(BasicClient::with_timeout(config.timeout), config.base_urls())
}

fn emit(summary: Option<&sems_daily::summary::DailySummary>, report: bool) -> Result<()> {
    if report {
        println!("{}", render_report(summary));
        Ok(())
    } else {
        print_json(summary)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
