//! Fundamentals normalizer
//!
//! Turns a symbol's raw income / balance / cash-flow / ratio rows into a
//! [`SymbolBundle`] of stitched annual and quarterly series with derived
//! metrics and anomaly flags. The per-symbol transform is pure; [`batch`]
//! fans it out over many symbols.

pub mod batch;
pub mod bundle;
pub mod classifier;
pub mod flags;
pub mod math;
pub mod metrics;
pub mod stitcher;

pub use batch::{normalize_universe, BatchOptions, BatchReport, SymbolDiagnostic};
pub use bundle::assemble_bundle;
pub use classifier::{classify, split_statements, CadenceSplit, PeriodClass};
pub use flags::{evaluate_flags, FlagThresholds};
pub use metrics::derive_metrics;
pub use stitcher::{stitch, stitch_by_date};

use fundamentals_core::{Cadence, NormalizeError, RawStatements, SymbolBundle};

/// Result of normalizing one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolOutcome {
    pub bundle: SymbolBundle,
    /// Raw rows dropped for an unrecognized period tag
    pub discarded: usize,
}

pub struct FundamentalsNormalizer {
    thresholds: FlagThresholds,
}

impl FundamentalsNormalizer {
    pub fn new() -> Self {
        Self {
            thresholds: FlagThresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: FlagThresholds) -> Self {
        Self { thresholds }
    }

    /// Classify, stitch, derive, flag and assemble one symbol
    pub fn normalize_symbol(
        &self,
        symbol: &str,
        raw: &RawStatements,
    ) -> Result<SymbolOutcome, NormalizeError> {
        if raw.is_empty() {
            return Err(NormalizeError::NoRawData(symbol.to_string()));
        }

        let split = split_statements(raw);
        if split.discarded > 0 {
            tracing::info!(
                "{}: discarded {} of {} rows with unrecognized period tags",
                symbol,
                split.discarded,
                raw.total_len()
            );
        }

        let annual = stitch(&split.annual);
        let quarterly = stitch(&split.quarterly);
        if annual.is_empty() && quarterly.is_empty() {
            return Err(NormalizeError::EmptySeries(symbol.to_string()));
        }

        let annual = derive_metrics(annual, Cadence::Annual);
        let quarterly = derive_metrics(quarterly, Cadence::Quarterly);
        let flags = evaluate_flags(&annual, &quarterly, &self.thresholds);

        tracing::debug!("{}: FY={} Q={}", symbol, annual.len(), quarterly.len());

        Ok(SymbolOutcome {
            bundle: assemble_bundle(symbol, annual, quarterly, flags),
            discarded: split.discarded,
        })
    }
}

impl Default for FundamentalsNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
