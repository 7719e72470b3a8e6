//! Nexus retarget tool.
//!
//! Loads committed chain history and prints the target each channel would
//! require of a candidate block built on the tip.

use anyhow::{Context, Result};
use clap::Parser;
use nexus_consensus::{
    difficulty, BlockRecord, CandidateBlock, ChainArena, Channel, ProtocolVersion,
    RetargetEngine, RetargetParams,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::RetargetConfig;

/// Next difficulty targets for the Nexus chain.
#[derive(Parser, Debug)]
#[command(name = "nexus-retarget")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "nexus-retarget.toml")]
    config: PathBuf,

    /// Chain history: JSON array of block records in height order
    #[arg(long)]
    chain: PathBuf,

    /// Network preset (overrides the config file)
    #[arg(short, long)]
    network: Option<String>,

    /// Channel to retarget (stake, prime, hash); all when omitted
    #[arg(long)]
    channel: Option<Channel>,

    /// Protocol version of the candidate block (defaults to the tip's)
    #[arg(long)]
    block_version: Option<u32>,

    /// Log the retarget diagnostic line
    #[arg(short, long)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Retarget result for one channel.
#[derive(Debug, Clone, Serialize)]
struct NextTarget {
    channel: Channel,
    height: u32,
    version: ProtocolVersion,
    bits: u32,
    difficulty: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = RetargetConfig::load(&args.config, &args)?;
    let params = config.params()?;
    info!("Network: {}", config.network);

    let arena = load_chain(&args.chain)?;
    info!("Loaded {} blocks from {:?}", arena.len(), args.chain);

    let channels = match args.channel {
        Some(channel) => vec![channel],
        None => Channel::ALL.to_vec(),
    };
    let results = next_targets(&arena, &params, &channels, args.block_version, args.verbose)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for next in &results {
            println!(
                "{:<6} height={} version={} bits={:#010x} difficulty={:.6}",
                next.channel, next.height, next.version, next.bits, next.difficulty
            );
        }
    }

    Ok(())
}

/// Read a JSON chain file into an arena.
fn load_chain(path: &Path) -> Result<ChainArena> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read chain file {:?}", path))?;
    let records: Vec<BlockRecord> =
        serde_json::from_str(&content).context("Failed to parse chain file")?;
    debug!("Parsed {} block records", records.len());

    ChainArena::from_records(records).context("Invalid chain history")
}

/// Retarget each of `channels` for a candidate on the tip of `arena`.
fn next_targets(
    arena: &ChainArena,
    params: &RetargetParams,
    channels: &[Channel],
    block_version: Option<u32>,
    verbose: bool,
) -> Result<Vec<NextTarget>> {
    let tip = arena.tip().context("Chain history is empty")?;
    let version = match block_version {
        Some(raw) => ProtocolVersion::try_from(raw).context("Invalid --block-version")?,
        None => tip.version,
    };

    let engine = RetargetEngine::new(arena, params);
    let candidate = CandidateBlock::new(tip, version);

    channels
        .iter()
        .map(|&channel| {
            let bits = engine
                .retarget(channel, &candidate, verbose)
                .with_context(|| format!("Failed to retarget {} channel", channel))?;
            Ok(NextTarget {
                channel,
                height: tip.height + 1,
                version,
                bits,
                difficulty: difficulty(bits, channel, params),
            })
        })
        .collect()
}
