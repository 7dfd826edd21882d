//! Command implementations. Each returns `anyhow::Result` for `main` to report.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use stocktag_core::{
    CodeImageProducer, EcLevel, Money, OpticalTag, Payload, PayloadCodec, PayloadVariant,
    ProductRecord, Symbology, TaxRate,
};
use stocktag_scan::{spawn_scan, QrLocator, ScanConfig, ScanOutcome};
use tracing::{info, warn};

use crate::render::QrImageProducer;
use crate::still_image::StillImageSource;

/// Fields given to `stocktag encode`.
#[derive(Debug, Default)]
pub struct EncodeArgs {
    pub id: String,
    pub name: String,
    pub code: String,
    pub tag: Option<String>,
    pub generate_tag: bool,
    pub price: Option<f64>,
    pub alternate_price: Option<f64>,
    pub tax_rate: Option<f64>,
    pub full: bool,
    pub png: Option<PathBuf>,
}

// =============================================================================
// encode
// =============================================================================

pub fn encode(args: EncodeArgs, config: &ScanConfig) -> Result<()> {
    let png = args.png.clone();
    let (record, variant) = build_record(args)?;

    let payload = PayloadCodec::encode_variant(&record, variant).context("record is not encodable")?;
    let symbology = config.symbology();

    if !symbology.fits(&payload) {
        warn!(
            len = payload.len(),
            capacity = symbology.capacity(),
            %symbology,
            "Payload does not fit in one code at the configured level"
        );
    }

    println!("{payload}");

    if let Some(path) = png {
        write_png(&payload, symbology, &path)?;
        info!(path = %path.display(), "Label image written");
    }
    Ok(())
}

fn build_record(args: EncodeArgs) -> Result<(ProductRecord, PayloadVariant)> {
    if args.tag.is_some() && args.generate_tag {
        bail!("--tag and --generate-tag are mutually exclusive");
    }

    let mut record = ProductRecord::new(args.id, args.name, args.code);
    if let Some(tag) = args.tag {
        record = record.with_optical_tag(tag);
    } else if args.generate_tag {
        record = record.with_generated_tag();
    }

    let price = args.price.map(|v| money(v, "--price")).transpose()?;
    let alternate_price = args
        .alternate_price
        .map(|v| money(v, "--alternate-price"))
        .transpose()?;
    let tax_rate = args
        .tax_rate
        .map(|v| TaxRate::from_percentage(v).ok_or_else(|| anyhow!("--tax-rate {v} is not a valid percentage")))
        .transpose()?;

    let priced = price.is_some() || alternate_price.is_some() || tax_rate.is_some();
    if priced && !args.full {
        warn!("Pricing fields are only written with --full");
    }

    let record = record.with_pricing(price, alternate_price, tax_rate);
    let variant = if args.full {
        PayloadVariant::Full
    } else {
        PayloadVariant::Label
    };
    Ok((record, variant))
}

fn money(value: f64, flag: &str) -> Result<Money> {
    serde_json::Number::from_f64(value)
        .and_then(|n| Money::from_wire_number(&n))
        .ok_or_else(|| anyhow!("{flag} {value} is not a valid amount"))
}

fn write_png(payload: &Payload, symbology: Symbology, path: &Path) -> Result<()> {
    symbology.check(payload)?;
    let image = QrImageProducer::default().produce(payload, symbology)?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

// =============================================================================
// decode / tag / capacity
// =============================================================================

pub fn decode(payload: &str, lenient: bool) -> Result<()> {
    let record = if lenient {
        PayloadCodec::decode_lenient(payload)?
    } else {
        PayloadCodec::decode(payload)?
    };
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

pub fn tag() -> Result<()> {
    println!("{}", OpticalTag::generate());
    Ok(())
}

pub fn capacity(payload: &str) -> Result<()> {
    let len = payload.trim().len();
    for level in [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H] {
        let symbology = Symbology::Qr(level);
        let verdict = if len <= symbology.capacity() { "fits" } else { "TOO LONG" };
        println!("{symbology:<6} {len:>5} / {:>5} bytes  {verdict}", symbology.capacity());
    }
    Ok(())
}

// =============================================================================
// scan
// =============================================================================

pub async fn scan(images: Vec<PathBuf>, config: &ScanConfig) -> Result<()> {
    let count = images.len();
    let handle = spawn_scan(StillImageSource::new(images), QrLocator::new(), config);
    let resolution = handle.outcome().await?;

    eprintln!("{}", serde_json::to_string(&resolution.report)?);

    match resolution.outcome {
        ScanOutcome::Succeeded(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        ScanOutcome::Failed(e) => Err(anyhow!(e).context(format!("no product label found in {count} image(s)"))),
        ScanOutcome::Cancelled => bail!("scan cancelled"),
    }
}
