mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use keel_broker::{register_configured, BrokerageRegistry};
use keel_config::{load_config_from, AppConfig};
use keel_core::AlgorithmJob;
use keel_queue::{JobQueue, JobQueueHandler};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Keel job dispatcher")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ConfigArgs {
    /// Directory holding default.toml and environment overrides
    #[arg(long, default_value = "config", global = true)]
    config_dir: PathBuf,
    /// Environment overlay, e.g. `live` loads `{config_dir}/live.toml`
    #[arg(long, env = "KEEL_ENV", global = true)]
    env: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the next job packet and print it
    NextJob {
        /// Force a live session regardless of configuration
        #[arg(long)]
        live: bool,
        /// Brokerage type identifier for live sessions
        #[arg(long)]
        brokerage: Option<String>,
        /// Print the packet as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// List the brokerage identifiers the registry knows about
    Brokerages,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config_from(&cli.config.config_dir, cli.config.env.as_deref())
        .with_context(|| {
            format!(
                "failed to load configuration from {}",
                cli.config.config_dir.display()
            )
        })?;
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    telemetry::init_tracing(&filter, config.log_path.as_deref())?;

    let registry = build_registry(&config);
    match cli.command {
        Command::NextJob {
            live,
            brokerage,
            json,
        } => {
            if live {
                config.job.live_mode = true;
            }
            if brokerage.is_some() {
                config.job.live_mode_brokerage = brokerage;
            }
            run_next_job(config, registry, json)?;
        }
        Command::Brokerages => {
            for name in registry.registered() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

fn build_registry(config: &AppConfig) -> Arc<BrokerageRegistry> {
    let registry = BrokerageRegistry::new();
    keel_paper::register_factory(&registry);
    register_configured(&registry, &config.brokerages);
    info!(brokerages = registry.len(), "brokerage registry ready");
    Arc::new(registry)
}

fn run_next_job(config: AppConfig, registry: Arc<BrokerageRegistry>, json: bool) -> Result<()> {
    let mut queue = JobQueue::new(config.job, registry);
    queue.initialize();
    let (job, location) = queue.next_job();
    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        println!("{}", summarize(&job, &location));
    }
    queue.acknowledge_job(&job);
    Ok(())
}

fn summarize(job: &AlgorithmJob, location: &std::path::Path) -> String {
    let endpoints = job.endpoints();
    let mut summary = format!(
        "{:?} job from {} ({} bytes): data={:?} setup={:?} realtime={:?} transactions={:?}",
        job.mode(),
        location.display(),
        job.node().algorithm.len(),
        endpoints.data,
        endpoints.setup,
        endpoints.real_time,
        endpoints.transaction,
    );
    match job {
        AlgorithmJob::Live(live) => summary.push_str(&format!(
            " brokerage={} settings={}",
            live.brokerage,
            live.brokerage_data.len()
        )),
        AlgorithmJob::Backtest(backtest) => summary.push_str(&format!(
            " capital={} source={}",
            backtest.starting_capital, backtest.data_source
        )),
    }
    summary
}
