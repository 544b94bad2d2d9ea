use std::path::{Path, PathBuf};

use chrono::Local;

use crate::api::{build_app, AppState};
use crate::app::{AppContext, HarvestError, Result};
use crate::config::Config;
use crate::domain::SearchParams;
use crate::export::{self, ExportFormat, ResultsPayload};
use crate::scraper::{CancelFlag, ChromeFactory, DriverFactory, HarvestSettings, LogSink};

pub async fn serve(ctx: &AppContext, bind: Option<&str>) -> Result<()> {
    let port = std::env::var("PORT").ok();
    let addr = ctx.config.server.resolve_bind(bind, port.as_deref());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    println!("Listening on http://{}", addr);

    let app = build_app(AppState {
        jobs: ctx.jobs.clone(),
    });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Received shutdown signal, stopping server");
}

/// Options of the one-shot `search` command.
pub struct SearchOptions {
    pub category: String,
    pub location: String,
    pub max_results: usize,
    pub format: String,
    pub output: Option<PathBuf>,
    pub headed: bool,
}

pub async fn search(ctx: &AppContext, opts: SearchOptions) -> Result<()> {
    let mut settings = ctx.config.harvest_settings();
    if opts.headed {
        settings.scraper.headless = false;
    }

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("Interrupted, finishing current listing...");
            on_interrupt.cancel();
        }
    });

    let (path, count) = run_search(&ChromeFactory, &settings, &opts, &cancel).await?;
    println!("Saved {} unique listings to {}", count, path.display());
    Ok(())
}

/// Harvest with `factory` and write the export; returns the file and record count.
async fn run_search(
    factory: &dyn DriverFactory,
    settings: &HarvestSettings,
    opts: &SearchOptions,
    cancel: &CancelFlag,
) -> Result<(PathBuf, usize)> {
    let format: ExportFormat = opts.format.parse()?;
    let max_results = opts.max_results.to_string();
    let params = SearchParams::new(
        Some(opts.category.as_str()),
        Some(opts.location.as_str()),
        Some(max_results.as_str()),
    )?;

    println!(
        "Searching for '{}' (up to {} listings)...",
        params.query(&settings.scraper.query_template),
        params.max_results
    );

    let report = factory.run(settings, &params, &LogSink, cancel).await?;
    if report.cancelled {
        println!("Search cancelled, keeping {} listings", report.records.len());
    }
    if report.records.is_empty() {
        return Err(HarvestError::NoResults);
    }

    let count = report.records.len();
    let payload = ResultsPayload::new(Some(params), report.records);
    let bytes = export::render(format, &payload)?;

    let path = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format.file_name(&Local::now())));
    std::fs::write(&path, bytes)?;

    Ok((path, count))
}

pub fn show_config(config_path: Option<&Path>, show: bool) -> Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => Config::default_config_path().map_err(|e| HarvestError::Config(e.to_string()))?,
    };
    println!("Config file: {}", path.display());

    if show {
        let config = Config::load_from(&path).map_err(|e| HarvestError::Config(e.to_string()))?;
        let rendered = config
            .to_toml()
            .map_err(|e| HarvestError::Config(e.to_string()))?;
        println!("\n{}", rendered);
    }
    Ok(())
}
