//! MetaFusion President - marketplace scenario runner
//!
//! Deploys the marketplace in a local Soroban sandbox, runs the configured
//! scenario against it and prints a report. Also decodes identifiers.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use metafusion_harness::codec::{self, ImageId, PromptType};
use metafusion_harness::{
    Checkpoint, ConsoleCheckpoint, LocalChain, LogCheckpoint, ScenarioConfig, ScenarioDriver, ScenarioReport,
};

#[derive(Parser)]
#[command(
    name = "metafusion-sim",
    about = "Packet marketplace scenario runner",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the marketplace scenario against a local sandbox
    Run {
        /// TOML scenario configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the RNG seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Wait for [ENTER] after image creation
        #[arg(short, long)]
        interactive: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode an identifier
    Decode {
        #[arg(value_enum)]
        kind: IdKind,

        /// Decimal id for packets and prompts, hex for images
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum IdKind {
    Packet,
    Prompt,
    Image,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run { config, seed, interactive, json } => {
            let mut config = match config {
                Some(path) => ScenarioConfig::load(path)?,
                None => ScenarioConfig::default(),
            };
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }

            let report = if interactive {
                run_scenario(config, ConsoleCheckpoint::stdin())?
            } else {
                run_scenario(config, LogCheckpoint)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Decode { kind, id } => decode(kind, &id)?,
    }

    Ok(())
}

fn run_scenario<K: Checkpoint>(config: ScenarioConfig, checkpoint: K) -> anyhow::Result<ScenarioReport> {
    let mut driver = ScenarioDriver::new(LocalChain::deploy(), checkpoint, config)?;
    Ok(driver.run()?)
}

fn print_report(report: &ScenarioReport) {
    let stats = &report.stats;
    println!("Seed {} | {} users | collections {:?}", report.seed, report.users, report.collections);
    println!("  collections forged:  {}", stats.collections_forged);
    println!("  packets forged:      {}", stats.packets_forged);
    println!("  packets transferred: {}", stats.packets_transferred);
    println!("  packets opened:      {}", stats.packets_opened);
    println!("  prompts minted:      {}", stats.prompts_minted);
    println!("  prompts transferred: {}", stats.prompts_transferred);
    println!("  images created:      {}", stats.images_created);
    println!("  images transferred:  {}", stats.images_transferred);
    println!("  images burned:       {} ({} prompts recovered)", stats.images_burned, stats.prompts_recovered);
    println!("  skipped steps:       {}", stats.skipped);
    for record in &report.images {
        println!("  {} by user {}: {}", record.image, record.creator, record.description);
    }
    println!("Final inventory: {}", report.totals);
}

fn decode(kind: IdKind, id: &str) -> anyhow::Result<()> {
    match kind {
        IdKind::Packet => {
            let packet_id: u32 = id.parse()?;
            println!(
                "packet {packet_id}: collection {}, sequence {}",
                codec::decode_collection(packet_id),
                codec::decode_sequence(packet_id)
            );
        }
        IdKind::Prompt => {
            let prompt_id: u32 = id.parse()?;
            let info = codec::decode_prompt(prompt_id);
            let prompt_type = PromptType::try_from(info.prompt_type)
                .map(|prompt_type| prompt_type.to_string())
                .unwrap_or_else(|_| format!("unknown ({})", info.prompt_type));
            println!(
                "prompt {prompt_id}: index {}, collection {}, type {prompt_type}, packet {}",
                info.index, info.collection, info.packet
            );
        }
        IdKind::Image => {
            let image: ImageId = id.parse()?;
            let info = image.decode();
            println!("image {image}: seed {}", info.seed);
            for (slot, prompt_id) in info.prompts.iter().enumerate() {
                println!("  slot {slot}: prompt {prompt_id}");
            }
        }
    }
    Ok(())
}
