//! lamco-rdp-multihead - monitor layout replay
//!
//! Replays recorded client monitor layouts through the multi-head engine
//! against in-memory compositor outputs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lamco_rdp_multihead::compositor::VirtualOutputs;
use lamco_rdp_multihead::config::Config;
use lamco_rdp_multihead::multimon::{MonitorLayoutMessage, MonitorManager};
use lamco_rdp_multihead::server::{DisplayControlHandler, DisplayLoop};
use lamco_rdp_multihead::utils::{format_head_dump, format_user_error};

/// Command-line arguments for lamco-rdp-multihead
#[derive(Parser, Debug)]
#[command(name = "lamco-rdp-multihead")]
#[command(version, about = "Replay RDP monitor layouts through the multi-head engine", long_about = None)]
pub struct Args {
    /// JSON file holding an array of layout messages
    pub layouts: PathBuf,

    /// Configuration file path
    #[arg(short, long, env = "LAMCO_MULTIHEAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Force a desktop scale factor (percent) on every monitor
    #[arg(long)]
    pub debug_scale: Option<u32>,

    /// Print the head dump once the replay is done
    #[arg(long)]
    pub dump: bool,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => Config::load(path),
        None => Config::default_config(),
    };
    let config_error = loaded.as_ref().err().map(|e| format!("{:#}", e));
    let config = match loaded {
        Ok(config) => config,
        Err(_) => Config::default_config()?,
    }
    .with_overrides(args.verbose, args.debug_scale);

    let _log_guard = init_logging(&args, &config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  lamco-rdp-multihead v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    if let Some(e) = config_error {
        warn!("Failed to load config: {}, using defaults", e);
    }
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = config.validate() {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    let layouts = match read_layouts(&args.layouts) {
        Ok(layouts) => layouts,
        Err(e) => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
    };
    info!("Replaying {} layouts from {}", layouts.len(), args.layouts.display());

    let manager = MonitorManager::from_config(&config);
    let (display_loop, submitter) = DisplayLoop::new(manager, VirtualOutputs::new());
    let main_loop = std::thread::Builder::new()
        .name("display-loop".to_string())
        .spawn(move || {
            let mut display_loop = display_loop;
            let result = display_loop.run();
            (result, display_loop)
        })
        .context("Failed to spawn display loop thread")?;

    let handler = DisplayControlHandler::new(submitter);
    let mut rejected = 0usize;

    for (i, layout) in layouts.into_iter().enumerate() {
        match handler.request_layout(layout).await {
            Ok(ack) => {
                println!(
                    "layout {}: ack generation={} arrangement={:?} scaling={} desktop={}x{} \
                     fast={} reused={} created={} moved={} destroyed={}",
                    i,
                    ack.generation,
                    ack.arrangement,
                    ack.scaling_applied,
                    ack.client_bounds.width,
                    ack.client_bounds.height,
                    ack.report.fast_matched,
                    ack.report.reused,
                    ack.report.created.len(),
                    ack.report.moved,
                    ack.report.destroyed
                );
            }
            Err(e) if e.is_fatal_internal() => {
                println!("layout {}: fatal: {}", i, e);
                break;
            }
            Err(e) => {
                println!("layout {}: nack: {}", i, e);
                rejected += 1;
            }
        }
    }
    drop(handler);

    let (result, display_loop) = tokio::task::spawn_blocking(move || main_loop.join())
        .await
        .context("Failed to join display loop")?
        .map_err(|_| anyhow::anyhow!("Display loop thread panicked"))?;

    if args.dump {
        print!("{}", format_head_dump(display_loop.manager()));
    }

    if let Err(e) = result {
        error!("Display loop stopped: {}", e);
        let e = anyhow::Error::new(e).context("Display loop aborted");
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    let (_manager, outputs) = display_loop.shutdown();
    info!(
        "Replay finished: {} rejected, {} outputs left",
        rejected,
        outputs.len()
    );
    Ok(())
}

fn read_layouts(path: &Path) -> Result<Vec<MonitorLayoutMessage>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout file: {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse layout file")
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "lamco={level},lamco_rdp_multihead={level},warn",
            level = config.logging.level
        ))
    });

    // --log-file wins over the configured log directory
    let (file_layer, guard) = if let Some(log_file_path) = &args.log_file {
        let file = std::fs::File::create(log_file_path)
            .with_context(|| format!("Failed to create log file: {}", log_file_path.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        (Some(writer), Some(guard))
    } else if let Some(dir) = &config.logging.log_dir {
        let appender = tracing_appender::rolling::daily(dir, "lamco-rdp-multihead.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };
    let file_layer = file_layer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
    });

    match args.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(guard)
}
