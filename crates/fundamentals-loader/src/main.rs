//! fundamentals-loader: Normalize raw statement dumps into the highlights JSON.
//!
//! Reads `<raw-dir>/{income_statement,balance_sheet,cash_flow,ratios}/<SYMBOL>.jsonl`,
//! stitches annual and quarterly series per symbol, derives growth metrics and
//! anomaly flags, and writes one JSON array of symbol bundles.
//!
//! Usage:
//!   cargo run -p fundamentals-loader
//!   cargo run -p fundamentals-loader -- --symbols AAPL MSFT --dry-run
//!   cargo run -p fundamentals-loader -- --raw-dir /data/fmp --out highlights.json

mod config;
mod export;
mod jsonl;

use config::LoaderConfig;
use fundamentals_normalizer::{normalize_universe, FundamentalsNormalizer};
use jsonl::{discover_symbols, JsonlDirectorySource};
use std::sync::Arc;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  fundamentals-loader                          Normalize every symbol found under the raw dir");
    eprintln!("  fundamentals-loader --symbols AAPL MSFT ...  Specific symbols");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --raw-dir PATH              Raw JSONL root (env FUNDAMENTALS_RAW_DIR, default: data/raw/fmp)");
    eprintln!("  --out PATH                  Output file (env FUNDAMENTALS_OUTPUT)");
    eprintln!("  --concurrency N             Max parallel symbols (env FUNDAMENTALS_CONCURRENCY, default: 16)");
    eprintln!("  --symbol-timeout-secs N     Per-symbol time limit (env FUNDAMENTALS_SYMBOL_TIMEOUT_SECS)");
    eprintln!("  --dry-run                   Print stats without writing the output file");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundamentals_loader=info,fundamentals_normalizer=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let config = LoaderConfig::from_env()?.apply_args(&args)?;

    let symbols = if config.symbols.is_empty() {
        discover_symbols(&config.raw_dir).await?
    } else {
        config.symbols.clone()
    };

    if symbols.is_empty() {
        tracing::warn!(
            "No symbols found under {}; nothing to do",
            config.raw_dir.display()
        );
        return Ok(());
    }

    tracing::info!(
        "fundamentals-loader: {} symbols, raw_dir={}, out={}, dry_run={}, concurrency={}",
        symbols.len(),
        config.raw_dir.display(),
        config.output.display(),
        config.dry_run,
        config.concurrency
    );

    let source = Arc::new(JsonlDirectorySource::new(config.raw_dir.clone()));
    let normalizer = Arc::new(FundamentalsNormalizer::new());
    let report = normalize_universe(normalizer, source, &symbols, &config.batch_options()).await;

    for bundle in &report.bundles {
        tracing::info!(
            "[ok] {}: FY={} Q={}",
            bundle.symbol,
            bundle.annual.len(),
            bundle.quarterly.len()
        );
    }

    if config.dry_run {
        tracing::info!(
            "Dry run: {} bundles, {} skipped, nothing written",
            report.bundles.len(),
            report.diagnostics.len()
        );
        return Ok(());
    }

    export::write_bundles(&config.output, &report.bundles)?;
    tracing::info!(
        "Done! Wrote {} symbols to {} ({} skipped)",
        report.bundles.len(),
        config.output.display(),
        report.diagnostics.len()
    );

    Ok(())
}
