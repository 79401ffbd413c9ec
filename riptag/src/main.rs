//! # riptag
//!
//! Interactive terminal wizard: search for a song (or paste a video URL),
//! match it against MusicBrainz, confirm the tags and save a FLAC file with
//! cover art and lyrics embedded.
//!
//! Configuration is resolved before the terminal is taken over, so a bad
//! config file or value is reported on plain stderr. Once the UI is up all
//! diagnostics go to `<root>/logs/riptag.log`.

mod tui;

use std::{
    fs::OpenOptions,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use riptag_config::{Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use riptag_core::{
    catalog::{CatalogSettings, HttpCatalog},
    fetch::{AssetFetcher, FetchSettings},
    tools::{CommandLineTools, ToolSettings},
    workflow::{Dispatcher, Services},
};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "riptag", version)]
#[command(
    about = "Find a song, match it against MusicBrainz and save a tagged FLAC"
)]
struct Cli {
    /// Path to riptag.toml (defaults to ./riptag.toml or ./config/riptag.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Dotenv file to load before reading the environment
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Directory holding downloads/, temp/ and logs/
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Log filter written to the log file (e.g. info, debug, riptag_core=trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ConfigLoad { config, warnings } =
        ConfigLoader::with_options(ConfigLoaderOptions {
            config_path: cli.config,
            env_file: cli.env_file,
            root: cli.root,
            log_level: cli.log_level,
            environment: None,
        })
        .load()
        .context("failed to load configuration")?;

    config.ensure_directories().with_context(|| {
        format!(
            "failed to create application directories under {}",
            config.layout.root().display()
        )
    })?;
    init_logging(&config)?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }
    info!(
        root = %config.layout.root().display(),
        timeouts.tool = ?config.timeouts.tool,
        timeouts.download = ?config.timeouts.download,
        timeouts.transcode = ?config.timeouts.transcode,
        timeouts.http = ?config.timeouts.http,
        search.videos = config.search.videos,
        search.releases = config.search.releases,
        "configuration in effect"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("riptag-worker")
        .build()
        .context("failed to start the async runtime")?;

    let (events_tx, events_rx) = unbounded_channel();
    let dispatcher = {
        let _entered = runtime.enter();
        let services = build_services(&config)?;
        Dispatcher::new(runtime.handle().clone(), services, events_tx)
    };

    let result = tui::run(dispatcher, events_rx);

    // Dropping in-flight tasks kills child processes and removes their
    // scratch areas.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    match &result {
        Ok(()) => info!("riptag exited"),
        Err(err) => warn!(error = %err, "riptag exited with an error"),
    }
    result
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let path = config.layout.log_file();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .with_context(|| {
            format!("invalid log filter '{}'", config.logging.level)
        })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("failed to install the log subscriber")?;
    Ok(())
}

fn build_services(config: &Config) -> anyhow::Result<Services> {
    let working_dir = std::env::current_dir()
        .context("failed to read the current directory")?;

    let tools = Arc::new(CommandLineTools::new(ToolSettings {
        extractor_override: config.tools.extractor.clone(),
        transcoder_override: config.tools.transcoder.clone(),
        working_dir,
        tool_timeout: config.timeouts.tool,
        download_timeout: config.timeouts.download,
        transcode_timeout: config.timeouts.transcode,
        video_results: config.search.videos,
    }));

    let catalog = Arc::new(
        HttpCatalog::new(&CatalogSettings {
            user_agent: config.http.user_agent.clone(),
            timeout: config.timeouts.http,
            release_results: config.search.releases,
        })
        .context("failed to build the HTTP client")?,
    );

    let fetcher = AssetFetcher::new(
        tools.clone(),
        catalog.clone(),
        FetchSettings {
            output_dir: config.layout.output_dir(),
            scratch_dir: config.layout.scratch_dir(),
            // The cover lookup may take two requests.
            asset_timeout: config.timeouts.http.saturating_mul(2),
        },
    );

    Ok(Services {
        tools,
        catalog,
        fetcher,
    })
}
