//! On-disk raw dumps: `<root>/<category>/<SYMBOL>.jsonl`, one JSON object per line.

use async_trait::async_trait;
use chrono::NaiveDate;
use fundamentals_core::{NormalizeError, RawStatementRecord, StatementKind, StatementSource};
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub struct JsonlDirectorySource {
    root: PathBuf,
}

impl JsonlDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, symbol: &str, kind: StatementKind) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(format!("{}.jsonl", symbol))
    }
}

#[async_trait]
impl StatementSource for JsonlDirectorySource {
    async fn load(
        &self,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<Vec<RawStatementRecord>, NormalizeError> {
        let path = self.path_for(symbol, kind);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(NormalizeError::Source(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut records = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = match serde_json::from_str(line) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!("{}:{} skipped: {}", path.display(), line_no + 1, e);
                    continue;
                }
            };

            match parse_record(&value) {
                Some(record) => records.push(record),
                None => tracing::debug!("{}:{} skipped: no usable date", path.display(), line_no + 1),
            }
        }

        Ok(records)
    }
}

/// Numbers may arrive as JSON numbers or numeric strings; `inf`/`NaN` strings are dropped
fn number(value: &Value, key: &str) -> Option<f64> {
    let parsed = match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Map one raw JSON object to a record. Rows without a parseable date are rejected.
pub fn parse_record(value: &Value) -> Option<RawStatementRecord> {
    let date = value.get("date")?.as_str()?;
    let date = NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()?;

    Some(RawStatementRecord {
        date,
        period: text(value, "period").or_else(|| text(value, "periodType")),
        revenue: number(value, "revenue"),
        net_income: number(value, "netIncome"),
        gross_profit: number(value, "grossProfit"),
        operating_income: number(value, "operatingIncome"),
        ebitda: number(value, "ebitda"),
        operating_cash_flow: number(value, "operatingCashFlow"),
        capital_expenditure: number(value, "capitalExpenditure"),
        free_cash_flow: number(value, "freeCashFlow"),
        return_on_equity: number(value, "returnOnEquity"),
        return_on_assets: number(value, "returnOnAssets"),
        net_receivables: number(value, "netReceivables"),
        total_debt: number(value, "totalDebt"),
        total_debt_in_million: number(value, "totalDebtInMillion"),
        total_assets: number(value, "totalAssets"),
    })
}

/// Union of `*.jsonl` stems across the category directories, sorted
pub async fn discover_symbols(root: &Path) -> anyhow::Result<Vec<String>> {
    let mut symbols = BTreeSet::new();

    for kind in StatementKind::ALL {
        let dir = root.join(kind.dir_name());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("{} not found, skipping", dir.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.insert(stem.to_string());
            }
        }
    }

    Ok(symbols.into_iter().collect())
}
