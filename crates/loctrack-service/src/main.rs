//! loctrack - periodic location sampling in the foreground.
//!
//! Run with: `cargo run -p loctrack-service -- run`

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use loctrack_service::collaborators::{build_permission, build_provider, build_resolver};
use loctrack_service::{
    AppState, Config, ForegroundHost, HostCommand, Sampler, SamplingOptions, TerminalIndicator,
    TodayView, watch_today,
};
use loctrack_store::{SampleQuery, Store};

/// loctrack - periodic location sampling with a local history.
#[derive(Parser, Debug)]
#[command(name = "loctrack")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides config).
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Track in the foreground (default). Type `start`, `stop` or `quit`.
    Run {
        /// Minutes between samples (overrides config).
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// List today's samples.
    Today {
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent sample.
    Latest {
        /// Output JSON.
        #[arg(long)]
        json: bool,
    },

    /// List every sample, newest first.
    History {
        /// Maximum number of samples.
        #[arg(short = 'n', long)]
        limit: Option<u32>,

        /// Output JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Args {
        command,
        config: config_path,
        database,
    } = Args::parse();

    // Logs go to stderr so list output can be piped
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("loctrack_service=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_default(),
    };

    if let Some(db_path) = database {
        config.storage.path = db_path;
    }

    match command.unwrap_or(Command::Run { interval: None }) {
        Command::Run { interval } => run_tracker(config, interval).await,
        Command::Today { json } => show_today(&config, json),
        Command::Latest { json } => show_latest(&config, json),
        Command::History { limit, json } => show_history(&config, limit, json),
    }
}

async fn run_tracker(mut config: Config, interval: Option<u64>) -> anyhow::Result<()> {
    if let Some(minutes) = interval {
        config.tracking.interval_minutes = minutes;
    }
    config.validate()?;

    info!("Opening database at {:?}", config.storage.path);
    let store = Store::open(&config.storage.path)?;

    let provider = build_provider(&config.provider)?;
    let resolver = build_resolver(&config.geocoder)?;
    let permission = build_permission(&config.permission);
    let options = SamplingOptions::from(&config.tracking);

    let state = AppState::new(store);
    let sampler = Arc::new(Sampler::new(
        Arc::clone(&state),
        provider,
        resolver,
        permission,
    ));
    let host = ForegroundHost::new(sampler, Arc::new(TerminalIndicator), options);

    let cancel = CancellationToken::new();
    let watcher = watch_today(Arc::clone(&state), cancel.clone(), |view| {
        print!("{}", view.render());
    });

    host.handle(HostCommand::StartTracking).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let input = line.trim();
                    if matches!(input, "quit" | "exit") {
                        break;
                    } else if !input.is_empty() {
                        match input.parse::<HostCommand>() {
                            Ok(command) => {
                                host.handle(command).await;
                            }
                            Err(e) => eprintln!("{} (expected start, stop or quit)", e),
                        }
                    }
                }
                Ok(None) => {
                    debug!("stdin closed, waiting for Ctrl-C");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    stdin_open = false;
                }
            },
        }
    }

    host.handle(HostCommand::StopTracking).await;
    cancel.cancel();
    let _ = watcher.await;

    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    debug!("Opening database at {:?}", config.storage.path);
    Ok(Store::open(&config.storage.path)?)
}

fn show_today(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let view = TodayView::load(&store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view.samples)?);
    } else {
        print!("{}", view.render_list());
    }
    Ok(())
}

fn show_latest(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let latest = store.most_recent()?;

    match (latest, json) {
        (latest, true) => println!("{}", serde_json::to_string_pretty(&latest)?),
        (Some(sample), false) => println!("{}", sample),
        (None, false) => println!("No locations recorded"),
    }
    Ok(())
}

fn show_history(config: &Config, limit: Option<u32>, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let samples = match limit {
        Some(limit) => store.query_samples(&SampleQuery::new().limit(limit))?,
        None => store.list_all()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&samples)?);
    } else if samples.is_empty() {
        println!("No locations recorded");
    } else {
        for sample in &samples {
            println!("{}", sample);
        }
    }
    Ok(())
}
