//! ╔══════════════════════════════════════════════════════════════════╗
//! ║   TINYFORMER HOST DRIVER                                         ║
//! ║                                                                  ║
//! ║   Runs the accelerator self-tests against the build-selected     ║
//! ║   DOT8, the software exp LUT and the simulated GEMV device,      ║
//! ║   and encodes generated token matrices for checksum comparison   ║
//! ╚══════════════════════════════════════════════════════════════════╝

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tinyformer_kernel::dot8::{Dot8Engine, DOT8_HW};
use tinyformer_kernel::{checksum, run_all, Encoder, Gemv, Lcg, SimGemv, SoftwareExpLut, Weights};

mod config;
mod report;
mod weights_file;

use config::{parse_u32, Config};
use report::{EncodeReport, SelfTestReport};
use weights_file::WeightFile;

#[derive(Parser)]
#[command(name = "tinyformer")]
#[command(about = "Fixed-point TinyFormer encoder and accelerator self-tests")]
struct Cli {
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every accelerator backend with its software reference
    Selftest {
        /// Busy polls before the simulated GEMV reports done
        #[arg(long)]
        latency: Option<u32>,
    },

    /// Encode one generated token matrix and print its checksum
    Encode {
        /// Input generator seed (decimal or 0x hex)
        #[arg(short, long, value_parser = parse_u32)]
        seed: Option<u32>,

        /// Weight file (default: placeholder weights)
        #[arg(short, long)]
        weights: Option<PathBuf>,

        /// Print the output matrix
        #[arg(long)]
        dump: bool,
    },

    /// Print the exp lookup table
    Lut,

    /// Write a weight file
    InitWeights {
        /// Output path
        #[arg(short, long)]
        out: PathBuf,

        /// Fill with generator bytes instead of zeros
        #[arg(short, long, value_parser = parse_u32)]
        seed: Option<u32>,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tinyformer=info,tinyformer_kernel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Selftest { latency } => {
            let latency = latency.unwrap_or(config.gemv_latency);
            selftest(latency, cli.json)
        }
        Commands::Encode { seed, weights, dump } => {
            let seed = seed.unwrap_or(config.seed);
            let weights = weights.or(config.weights);
            encode(seed, weights, dump, cli.json)
        }
        Commands::Lut => lut(cli.json),
        Commands::InitWeights { out, seed } => init_weights(&out, seed),
    }
}

fn selftest(latency: u32, json: bool) -> Result<()> {
    let backend = if DOT8_HW { "custom-0" } else { "software" };
    tracing::info!(backend, latency, "running self-tests");

    let mut gemv = Gemv::new(SimGemv::with_latency(latency));
    let summary = run_all(&Dot8Engine::default(), &SoftwareExpLut, &mut gemv);
    let report = SelfTestReport::new(&summary, backend, latency);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }

    if !report.passed {
        bail!("{} self-test(s) failed", summary.failures().count());
    }
    Ok(())
}

fn encode(seed: u32, weights: Option<PathBuf>, dump: bool, json: bool) -> Result<()> {
    let weights = match &weights {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading weights");
            WeightFile::load(path)?
        }
        None => Weights::PLACEHOLDER,
    };

    let input = Lcg::new(seed).token_matrix();
    let mut encoder = Encoder::new(&weights);
    let output = encoder.encode(&input);

    let mut report = EncodeReport {
        seed,
        model_hash: hex::encode(weights.model_hash()),
        placeholder_weights: weights.is_placeholder(),
        checksum: checksum(&output),
        output: None,
    };
    if dump {
        report.set_output(&output);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }
    Ok(())
}

fn lut(json: bool) -> Result<()> {
    let entries = report::lut_entries();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for e in &entries {
            println!("  exp[-{:2}] = {:4} ({:.4})", e.index, e.raw, e.value);
        }
    }
    Ok(())
}

fn init_weights(out: &std::path::Path, seed: Option<u32>) -> Result<()> {
    let file = match seed {
        Some(seed) => WeightFile::random(seed)?,
        None => WeightFile::from_weights(&Weights::PLACEHOLDER),
    };
    file.save(out)?;

    let hash = file.to_weights()?.model_hash();
    tracing::info!(path = %out.display(), "weights written");
    println!("[✓] {} (model hash 0x{})", out.display(), hex::encode(hash));
    Ok(())
}
