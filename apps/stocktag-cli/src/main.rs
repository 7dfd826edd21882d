//! # stocktag Command-Line Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          stocktag CLI                                   │
//! │                                                                         │
//! │  encode ───► ProductRecord ──► PayloadCodec ──► stdout (+ PNG label)    │
//! │  decode ───► payload text  ──► PayloadCodec ──► record JSON             │
//! │  tag    ───► OpticalTag::generate                                       │
//! │  capacity ─► payload length vs. QR levels                               │
//! │  scan   ───► still images ──► ScanSession (tokio) ──► record JSON       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load `scan.toml` plus `STOCKTAG_*` overrides
//! 3. Run the command

mod commands;
mod render;
mod still_image;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stocktag_scan::ScanConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::EncodeArgs;

#[derive(Parser)]
#[command(name = "stocktag", version, about = "Product identity labels")]
struct Cli {
    /// Path to scan.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a product record into label payload text
    Encode {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        /// Optical tag already printed on the product
        #[arg(long)]
        tag: Option<String>,
        /// Attach a freshly generated optical tag
        #[arg(long)]
        generate_tag: bool,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        alternate_price: Option<f64>,
        /// Tax rate in percent, e.g. 18
        #[arg(long)]
        tax_rate: Option<f64>,
        /// Include the pricing fields
        #[arg(long)]
        full: bool,
        /// Also render the label as a PNG
        #[arg(long)]
        png: Option<PathBuf>,
    },
    /// Decode payload text and print the record as JSON
    Decode {
        payload: String,
        /// Accept padded or standard-alphabet base64 from older labels
        #[arg(long)]
        lenient: bool,
    },
    /// Print a fresh optical tag
    Tag,
    /// Compare a payload's length with every QR error correction level
    Capacity { payload: String },
    /// Scan still images for a product label
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Override the sampling interval
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = ScanConfig::load_or_default(cli.config);
    debug!(?config, "Configuration loaded");

    match cli.command {
        Command::Encode {
            id,
            name,
            code,
            tag,
            generate_tag,
            price,
            alternate_price,
            tax_rate,
            full,
            png,
        } => commands::encode(
            EncodeArgs {
                id,
                name,
                code,
                tag,
                generate_tag,
                price,
                alternate_price,
                tax_rate,
                full,
                png,
            },
            &config,
        ),
        Command::Decode { payload, lenient } => commands::decode(&payload, lenient),
        Command::Tag => commands::tag(),
        Command::Capacity { payload } => commands::capacity(&payload),
        Command::Scan {
            images,
            interval_ms,
        } => {
            if let Some(ms) = interval_ms {
                config.scan.interval_ms = ms;
                config.validate()?;
            }
            commands::scan(images, &config).await
        }
    }
}

/// Initializes the tracing subscriber on stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=stocktag_scan=trace` - Trace the scan crate only
/// - Default: `info,stocktag=debug`
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,stocktag=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
