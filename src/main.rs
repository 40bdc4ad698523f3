//! # qsa-engrave CLI
//!
//! Command-line interface for the Micro-ID codec, SKU resolver, and the
//! engrave pipeline.
//!
//! ## Usage
//!
//! ```bash
//! # Encode a Micro-ID serial, or round-trip one through the codec
//! qsa-engrave micro-id encode 123454
//! qsa-engrave micro-id verify 123454
//!
//! # Resolve a SKU against the native pattern
//! qsa-engrave sku resolve STARa-00123
//!
//! # Engrave one array (against the in-memory reference stores)
//! qsa-engrave engrave --batch 1 --qsa 1 --start 1 --sku STAR-00001 --sku STAR-00001
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use qsa_engrave::assembler::AssemblerOptions;
use qsa_engrave::batch::repository::InMemorySerialStore;
use qsa_engrave::batch::state_machine::InMemoryBatchStore;
use qsa_engrave::batch::types::{Batch, BatchStatus, Row, RowStatus};
use qsa_engrave::config::EngraveConfig;
use qsa_engrave::elements::{DesignKey, InMemoryConfigStore};
use qsa_engrave::engrave::{EngraveModuleInput, EngravePipeline, FsArtifactSink};
use qsa_engrave::error::CoreError;
use qsa_engrave::micro_id;
use qsa_engrave::sku::SkuResolver;

#[derive(Parser, Debug)]
#[command(name = "qsa-engrave")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode or decode a Micro-ID serial
    MicroId {
        #[command(subcommand)]
        action: MicroIdAction,
    },

    /// Resolve a SKU to a canonical design code
    Sku {
        #[command(subcommand)]
        action: SkuAction,
    },

    /// Engrave one array against the in-memory reference stores
    Engrave {
        #[arg(long)]
        batch: i64,

        #[arg(long)]
        qsa: u32,

        #[arg(long, default_value = "1")]
        start: u8,

        #[arg(long = "sku")]
        skus: Vec<String>,

        #[arg(long, default_value = "STAR")]
        design: String,

        #[arg(long, default_value = "./artifacts")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum MicroIdAction {
    /// Encode an integer serial as a Micro-ID grid, printing its SVG fragment
    Encode { n: u32 },
    /// Round-trip an integer serial through encode/decode, printing the
    /// recovered value (used to sanity-check the codec from the shell)
    Verify { n: u32 },
}

#[derive(Subcommand, Debug)]
enum SkuAction {
    /// Resolve a SKU against the native pattern only
    Resolve { sku: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CoreError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::MicroId { action } => run_micro_id(action),
        Commands::Sku { action } => run_sku(action),
        Commands::Engrave { batch, qsa, start, skus, design, out_dir } => {
            run_engrave(batch, qsa, start, skus, design, out_dir)
        }
    }
}

fn run_micro_id(action: MicroIdAction) -> Result<(), CoreError> {
    match action {
        MicroIdAction::Encode { n } => {
            let grid = micro_id::encode(n)?;
            println!("{}", grid.render_svg((0.55, 0.55)));
        }
        MicroIdAction::Verify { n } => {
            let grid = micro_id::encode(n)?;
            let decoded = micro_id::decode(&grid)?;
            println!("{decoded}");
        }
    }
    Ok(())
}

fn run_sku(action: SkuAction) -> Result<(), CoreError> {
    match action {
        SkuAction::Resolve { sku } => {
            let resolver = SkuResolver::new();
            match resolver.resolve(&sku)? {
                Some(resolution) => println!("{resolution:?}"),
                None => println!("no resolution for {sku:?}"),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn run_engrave(
    batch_id: i64,
    qsa_sequence: u32,
    start: u8,
    skus: Vec<String>,
    design_code: String,
    out_dir: PathBuf,
) -> Result<(), CoreError> {
    let batches = InMemoryBatchStore::new();
    let serials = InMemorySerialStore::new();
    let config = Arc::new(InMemoryConfigStore::new());

    batches
        .put_batch(Batch { id: batch_id, name: design_code.clone(), status: BatchStatus::InProgress, created_at: chrono::Utc::now() })
        .await?;
    batches
        .put_row(Row {
            batch_id,
            qsa_sequence,
            sku_composition: skus.clone(),
            qty: skus.len() as u32,
            status: RowStatus::Pending,
            start_position: start,
            engraved_at: None,
        })
        .await?;

    std::fs::create_dir_all(&out_dir).map_err(|e| CoreError::TransactionFailed(e.to_string()))?;

    let pipeline = EngravePipeline {
        design: DesignKey::new(design_code.clone(), None),
        qsa_id: format!("{design_code}00001"),
        batches: &batches,
        serials: &serials,
        resolver: Arc::new(SkuResolver::new()),
        config,
        canvas: EngraveConfig::default(),
        sink: Arc::new(FsArtifactSink { base_dir: out_dir }),
    };

    let modules = skus
        .into_iter()
        .map(|sku| EngraveModuleInput { sku, led_codes: vec![] })
        .collect();

    let result = pipeline
        .engrave(batch_id, qsa_sequence, start, modules, AssemblerOptions::default())
        .await?;

    println!("engraved {} serials", result.serials.len());
    if let Some(path) = result.artifact_path {
        println!("artifact written to {}", path.display());
    }
    Ok(())
}
