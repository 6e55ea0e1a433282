use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use miette::{Context as _, IntoDiagnostic, Result};
use tracing::{info, Level};
use tracing_subscriber::{filter::Targets, prelude::*};

use catapult_core::CacheChangesRegistry;
use catapult_node::config::{LoggingConfig, NodeConfig};
use catapult_node::node::NodeServer;
use catapult_node::{Broker, BrokerSubscribers, LoggingSubscriber};
use catapult_storage::CatapultDataDirectory;

#[derive(Parser)]
#[clap(name = "Catapult")]
#[clap(bin_name = "catapult-node")]
#[clap(author, version, about, long_about = None)]
enum Catapult {
    /// Runs the node server, the only writer of the data directory.
    Run(RunArgs),
    /// Runs the read-only broker pass-through driver.
    Broker(BrokerArgs),
    /// Runs recovery once and reports what it found, without starting
    /// either server or broker.
    Doctor(DoctorArgs),
}

#[derive(Parser)]
struct RunArgs {
    #[clap(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct BrokerArgs {
    #[clap(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct DoctorArgs {
    #[clap(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Catapult::parse();

    match args {
        Catapult::Run(args) => run(&args),
        Catapult::Broker(args) => broker(&args),
        Catapult::Doctor(args) => doctor(&args),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<NodeConfig> {
    NodeConfig::load(path.map(PathBuf::as_path))
        .into_diagnostic()
        .context("loading node configuration")
}

fn setup_tracing(config: &LoggingConfig) -> Result<()> {
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = Targets::new()
        .with_target("catapult_node", level)
        .with_target("catapult_recovery", level)
        .with_target("catapult_storage", level)
        .with_target("catapult_subscribers", level)
        .with_target("catapult_fq", level);

    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .finish()
        .with(filter)
        .init();

    Ok(())
}

/// Builds the registry used by state-change replay. A real deployment would
/// source this list from whatever caches the hosting process's ledger
/// maintains; the node core itself has no opinion on cache identity beyond
/// "every id replayed must have been registered" (spec.md §4.4).
fn default_cache_registry() -> CacheChangesRegistry {
    CacheChangesRegistry::builder()
        .register(0, "account_state")
        .register(1, "namespace")
        .register(2, "mosaic")
        .build()
}

fn run(args: &RunArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    setup_tracing(&config.logging)?;

    let data_dir = CatapultDataDirectory::new(config.data_directory.clone());
    let registry = default_cache_registry();

    let mut server = NodeServer::open(data_dir, &registry)
        .into_diagnostic()
        .context("opening node server")?;

    info!(
        height = server.chain_height().into_diagnostic()?,
        "node server idle, waiting for a block producer to be wired in"
    );

    // A real deployment wires in its own `BlockProducer` (consensus,
    // block-sync, validation); this binary's job ends at the commit
    // sequence and recovery, which is the scope of this core (spec.md §1).
    let _ = &mut server;

    Ok(())
}

fn broker(args: &BrokerArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    setup_tracing(&config.logging)?;

    let data_dir = CatapultDataDirectory::new(config.data_directory.clone());
    let registry = default_cache_registry();
    let poll_interval = Duration::from_millis(config.broker.poll_interval_ms);

    info!("broker starting with the default logging-only subscriber set");

    let subscribers = BrokerSubscribers {
        block_change: LoggingSubscriber,
        ut_change: LoggingSubscriber,
        pt_change: LoggingSubscriber,
        finalization: LoggingSubscriber,
        transaction_status: LoggingSubscriber,
        state_change: LoggingSubscriber,
    };
    let broker = Broker::new(data_dir, registry, subscribers);

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    runtime
        .block_on(broker.run(poll_interval))
        .into_diagnostic()
        .context("broker pass-through loop")
}

fn doctor(args: &DoctorArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    setup_tracing(&config.logging)?;

    let data_dir = CatapultDataDirectory::new(config.data_directory.clone());
    let registry = default_cache_registry();

    let server = NodeServer::open(data_dir, &registry)
        .into_diagnostic()
        .context("running recovery")?;

    println!(
        "recovery complete, chain height = {}",
        server.chain_height().into_diagnostic()?
    );

    Ok(())
}
