//! salespivot - Pivot monthly sales and accounting aggregates

use clap::Parser;
use salespivot::{
    cli::{Cli, Command},
    data_loader::DataLoader,
    error::Result,
    http_source::HttpSource,
    live_monitor::LiveMonitor,
    report::{ReportOptions, missing_rows, render_columns, render_pivot},
    session::PivotSession,
    source::RecordSource,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Pick the record source from the CLI flags
///
/// Returns the source and the paths to watch in live mode.
fn open_source(cli: &Cli, show_progress: bool) -> Result<(Arc<dyn RecordSource>, Vec<PathBuf>)> {
    if let Some(endpoint) = &cli.endpoint {
        info!("Loading records from endpoint {}", endpoint);
        let source: Arc<dyn RecordSource> = Arc::new(HttpSource::new(endpoint.clone())?);
        return Ok((source, Vec::new()));
    }

    let loader = DataLoader::new(cli.data.clone())?.with_progress(show_progress);
    info!("Loading records from {}", loader.describe());
    let paths = loader.paths().to_vec();
    let source: Arc<dyn RecordSource> = Arc::new(loader);
    Ok((source, paths))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Without --verbose only warnings and errors are shown.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("salespivot=info"))
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = cli.command();
    let query = cli.query()?;
    let options = ReportOptions::from(&cli);

    let show_progress = !cli.json
        && !matches!(command, Command::Watch { .. })
        && is_terminal::is_terminal(std::io::stderr());
    let (source, watch_paths) = open_source(&cli, show_progress)?;

    let mut session = PivotSession::new(cli.dimension);
    *session.expansion_mut() = cli.expansion();

    match command {
        Command::Report => {
            info!("Running pivot report");
            session.replace_data(source.load_all(&query).await?);

            for id in missing_rows(&mut session) {
                warn!("No row with id '{}' to expand", id);
            }
            println!("{}", render_pivot(&mut session, options));
        }
        Command::Columns => {
            info!("Listing column keys");
            session.replace_data(source.load_all(&query).await?);
            println!("{}", render_columns(&mut session, options));
        }
        Command::Watch { interval } => {
            info!("Starting live monitoring mode");
            let monitor = LiveMonitor::new(source, watch_paths, query, session, options, interval);
            monitor.run().await?;
        }
    }

    Ok(())
}
