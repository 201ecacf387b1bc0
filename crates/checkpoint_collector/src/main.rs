use std::error::Error;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use checkpoint_collector::config::{CHECKPOINT_DATA_DIR, DEFAULT_CHECKPOINT_FILE};
use checkpoint_collector::net::{ContentSource, HttpGateway, SiteDir};
use checkpoint_collector::poller::{StatsSnapshot, fetch_checkpoint};
use checkpoint_collector::seeds::fetch_seed_list;
use checkpoint_collector::store::DEFAULT_CAPACITY;
use checkpoint_collector::{Checkpoint, CheckpointCollection, CollectorConfig};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use colored::*;
use figlet_rs::FIGfont;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn print_banner() {
    let Ok(font) = FIGfont::standard() else {
        return;
    };
    let Some(figure) = font.convert("ZN Checkpoints") else {
        return;
    };

    eprintln!("{}", "═══════════════════════════════════════════════════════════════════════════════".bright_magenta());
    eprintln!("{}", figure.to_string().bright_cyan().bold());
    eprintln!("{}", "═══════════════════════════════════════════════════════════════════════════════".bright_magenta());
    eprintln!("{}", "Checkpoint collector for ZeroNet / IPFS".bright_yellow());
    eprintln!("{}", "═══════════════════════════════════════════════════════════════════════════════".bright_magenta());
    eprintln!();
}

#[derive(Parser, Debug)]
#[command(name = "zn-checkpoints")]
#[command(about = "Collects chain checkpoints published on a ZeroNet site", long_about = None)]
struct Args {
    /// Base URL of the site gateway (ZeroNet UI proxy)
    #[arg(long, env = "ZN_GATEWAY_URL", default_value = "http://127.0.0.1:43110", global = true)]
    gateway: String,

    /// Base URL of the IPFS gateway, used for seed lists
    #[arg(long, env = "ZN_IPFS_GATEWAY_URL", default_value = "http://127.0.0.1:8080", global = true)]
    ipfs_gateway: String,

    /// Storage path; checkpoint site data lives in its `zn-checkpoints` directory
    #[arg(long, env = "ZN_DATA_PATH", default_value = "./data", global = true)]
    data_path: PathBuf,

    /// Where site files are read from
    #[arg(long, value_enum, default_value_t = SourceKind::Gateway, global = true)]
    source: SourceKind,

    /// Do not print the banner
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SourceKind {
    /// HTTP gateway at `--gateway`
    Gateway,
    /// Site directory under `--data-path`
    SiteDir,
}

#[derive(ClapArgs, Debug)]
struct SiteArgs {
    /// Site address the checkpoints are published at
    #[arg(long, env = "ZN_CHECKPOINT_ADDRESS")]
    address: String,

    /// File holding the `height:hash` record
    #[arg(long, default_value = DEFAULT_CHECKPOINT_FILE)]
    filename: String,

    /// Upper bound on a single fetch
    #[arg(long, default_value = "60s", value_parser = parse_duration)]
    fetch_timeout: Duration,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll for checkpoints until interrupted, answering heights read from stdin
    Watch {
        #[command(flatten)]
        site: SiteArgs,

        /// Pause between two polls
        #[arg(long, default_value = "20s", value_parser = parse_duration)]
        interval: Duration,

        /// Number of checkpoints to keep
        #[arg(long, default_value_t = DEFAULT_CAPACITY)]
        capacity: NonZeroUsize,
    },
    /// Fetch the current checkpoint once and print it
    Fetch {
        #[command(flatten)]
        site: SiteArgs,
    },
    /// Resolve the seed node list published at a site
    Seeds {
        /// Site address holding `ipfs.hash`
        #[arg(long, env = "ZN_SEED_ADDRESS")]
        address: String,
    },
}

fn parse_duration(s: &str) -> Result<Duration, humantime_serde::re::humantime::DurationError> {
    humantime_serde::re::humantime::parse_duration(s)
}

/// JSON result printed on stdout, one object per line.
#[derive(Serialize, Default)]
struct Report {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    checkpoint: Option<Checkpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seedlist: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<StatsSnapshot>,
}

impl Report {
    fn ok(message: impl Into<String>) -> Self {
        Report {
            status: "ok",
            message: message.into(),
            ..Default::default()
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Report {
            status: "err",
            message: message.into(),
            ..Default::default()
        }
    }

    fn print(&self) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string(self)?);
        Ok(())
    }
}

fn site_source(
    args: &Args,
    config: &CollectorConfig,
) -> Result<Arc<dyn ContentSource>, Box<dyn Error>> {
    let source: Arc<dyn ContentSource> = match args.source {
        SourceKind::Gateway => Arc::new(HttpGateway::new(&args.gateway)?),
        SourceKind::SiteDir => Arc::new(SiteDir::open(&config.data_path)?),
    };
    Ok(source)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();
    if !args.quiet {
        print_banner();
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("hyper=warn".parse()?)
        .add_directive("hyper_util=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = CollectorConfig {
        data_path: args.data_path.join(CHECKPOINT_DATA_DIR),
        ..CollectorConfig::default()
    };

    match &args.command {
        Command::Watch {
            site,
            interval,
            capacity,
        } => {
            config.filename = site.filename.clone();
            config.fetch_timeout = site.fetch_timeout;
            config.interval = *interval;
            config.capacity = *capacity;
            let source = site_source(&args, &config)?;
            watch(source, config, &site.address).await
        }
        Command::Fetch { site } => {
            let source = site_source(&args, &config)?;
            let report = match fetch_checkpoint(
                source.as_ref(),
                &site.address,
                &site.filename,
                site.fetch_timeout,
            )
            .await
            {
                Ok(checkpoint) => Report {
                    checkpoint: Some(checkpoint),
                    ..Report::ok(format!("Checkpoint retrieved from {}", site.address))
                },
                Err(e) => Report::err(e.to_string()),
            };
            report.print()?;
            Ok(exit_code(&report))
        }
        Command::Seeds { address } => {
            let source = site_source(&args, &config)?;
            let ipfs = HttpGateway::new(&args.ipfs_gateway)?;
            let report = match fetch_seed_list(source.as_ref(), &ipfs, address).await {
                Ok(seeds) => Report {
                    seedlist: Some(seeds),
                    ..Report::ok("Seedlist retrieved from ZeroNet and IPFS")
                },
                Err(e) => Report::err(e.to_string()),
            };
            report.print()?;
            Ok(exit_code(&report))
        }
    }
}

fn exit_code(report: &Report) -> ExitCode {
    if report.status == "ok" {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Runs collection until Ctrl-C. Each stdin line is a height to look up.
async fn watch(
    source: Arc<dyn ContentSource>,
    config: CollectorConfig,
    address: &str,
) -> Result<ExitCode, Box<dyn Error>> {
    let collection = CheckpointCollection::new(source, config);
    let lookup = collection.start(address)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("Interrupted, stopping checkpoint collection");
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => answer(&collection, line.trim())?,
                None => stdin_open = false,
            },
        }
    }

    collection.stop().await;
    Report {
        stats: Some(lookup.stats()),
        checkpoint: lookup.latest(),
        ..Report::ok(format!(
            "Checkpoint collection stopped with {} cached checkpoint(s)",
            lookup.len()
        ))
    }
    .print()?;
    Ok(ExitCode::SUCCESS)
}

fn answer(
    collection: &CheckpointCollection<dyn ContentSource>,
    line: &str,
) -> Result<(), serde_json::Error> {
    if line.is_empty() {
        return Ok(());
    }
    let Ok(height) = line.parse::<u64>() else {
        warn!("Ignoring query {line:?}: not a height");
        return Report::err(format!("{line:?} is not a height")).print();
    };

    let hash = collection.checkpoint_at(height);
    match Checkpoint::new(height, &hash) {
        Ok(checkpoint) => Report {
            checkpoint: Some(checkpoint),
            ..Report::ok(format!("Checkpoint at height {height}"))
        },
        Err(_) => Report::err(format!("No checkpoint cached at height {height}")),
    }
    .print()
}
