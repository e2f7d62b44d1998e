//! Fan-out over symbols.
//!
//! Each symbol gets its own task: load the four feeds from the source, then run
//! the pure transform on the blocking pool. Failures are isolated per symbol and
//! reported as diagnostics; they never abort the batch.

use crate::{FundamentalsNormalizer, SymbolOutcome};
use fundamentals_core::{NormalizeError, StatementSource, SymbolBundle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};

/// Max concurrent symbol tasks
pub const DEFAULT_CONCURRENCY: usize = 16;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub concurrency: usize,
    /// Upper bound for loading plus normalizing a single symbol
    pub symbol_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            symbol_timeout: None,
        }
    }
}

/// A symbol whose bundle was omitted, and why
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDiagnostic {
    pub symbol: String,
    pub error: NormalizeError,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Bundles in input symbol order
    pub bundles: Vec<SymbolBundle>,
    pub diagnostics: Vec<SymbolDiagnostic>,
    /// Raw rows dropped for unrecognized period tags, across all symbols
    pub discarded_records: usize,
}

async fn run_symbol(
    normalizer: Arc<FundamentalsNormalizer>,
    source: Arc<dyn StatementSource>,
    symbol: String,
) -> Result<SymbolOutcome, NormalizeError> {
    let raw = source.load_all(&symbol).await?;
    tokio::task::spawn_blocking(move || normalizer.normalize_symbol(&symbol, &raw))
        .await
        .map_err(|e| NormalizeError::Task(e.to_string()))?
}

/// Normalize every symbol concurrently and collect the results in input order
pub async fn normalize_universe(
    normalizer: Arc<FundamentalsNormalizer>,
    source: Arc<dyn StatementSource>,
    symbols: &[String],
    options: &BatchOptions,
) -> BatchReport {
    tracing::info!(
        "Normalizing {} symbols (concurrency={})",
        symbols.len(),
        options.concurrency
    );

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut spawned: HashMap<Id, (usize, String)> = HashMap::with_capacity(symbols.len());

    for (position, symbol) in symbols.iter().cloned().enumerate() {
        let normalizer = Arc::clone(&normalizer);
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let timeout = options.symbol_timeout;

        let task_symbol = symbol.clone();
        let handle = tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (position, symbol, Err(NormalizeError::Task(e.to_string()))),
            };

            let work = run_symbol(normalizer, source, symbol.clone());
            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, work).await {
                    Ok(result) => result,
                    Err(_) => Err(NormalizeError::Timeout(symbol.clone())),
                },
                None => work.await,
            };
            (position, symbol, result)
        });
        spawned.insert(handle.id(), (position, task_symbol));
    }

    let mut finished = Vec::with_capacity(symbols.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, entry)) => finished.push(entry),
            Err(e) => {
                tracing::error!("Symbol task error: {}", e);
                if let Some((position, symbol)) = spawned.remove(&e.id()) {
                    finished.push((position, symbol, Err(NormalizeError::Task(e.to_string()))));
                }
            }
        }
    }
    finished.sort_by_key(|(position, _, _)| *position);

    let mut report = BatchReport::default();
    for (_, symbol, result) in finished {
        match result {
            Ok(outcome) => {
                report.discarded_records += outcome.discarded;
                report.bundles.push(outcome.bundle);
            }
            Err(error) => {
                tracing::warn!("Skipping {}: {}", symbol, error);
                report.diagnostics.push(SymbolDiagnostic { symbol, error });
            }
        }
    }

    tracing::info!(
        "Normalized {}/{} symbols ({} skipped, {} rows discarded)",
        report.bundles.len(),
        symbols.len(),
        report.diagnostics.len(),
        report.discarded_records
    );

    report
}
