//! Period classification
//!
//! Splits raw rows into annual and quarterly cadences by their period tag.
//! Rows whose tag matches neither cadence are discarded from both and counted.

use fundamentals_core::{RawStatementRecord, RawStatements, StatementKind};

/// Outcome of classifying a single raw row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodClass {
    Annual,
    Quarterly,
    Unrecognized,
}

pub fn classify(record: &RawStatementRecord) -> PeriodClass {
    let tag = match record.period.as_deref() {
        Some(tag) => tag.trim().to_lowercase(),
        None => return PeriodClass::Unrecognized,
    };

    match tag.as_str() {
        "fy" | "annual" | "year" => PeriodClass::Annual,
        "quarter" => PeriodClass::Quarterly,
        t if t.starts_with('q') => PeriodClass::Quarterly,
        _ => PeriodClass::Unrecognized,
    }
}

/// Raw statements partitioned by cadence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CadenceSplit {
    pub annual: RawStatements,
    pub quarterly: RawStatements,
    pub discarded: usize,
}

pub fn split_by_cadence(
    records: &[RawStatementRecord],
) -> (Vec<RawStatementRecord>, Vec<RawStatementRecord>, usize) {
    let mut annual = Vec::new();
    let mut quarterly = Vec::new();
    let mut discarded = 0;

    for record in records {
        match classify(record) {
            PeriodClass::Annual => annual.push(record.clone()),
            PeriodClass::Quarterly => quarterly.push(record.clone()),
            PeriodClass::Unrecognized => {
                tracing::debug!(
                    "Discarding {} row with unrecognized period {:?}",
                    record.date,
                    record.period
                );
                discarded += 1;
            }
        }
    }

    (annual, quarterly, discarded)
}

/// Classify every statement kind of a symbol
pub fn split_statements(raw: &RawStatements) -> CadenceSplit {
    let mut split = CadenceSplit::default();
    for kind in StatementKind::ALL {
        let (annual, quarterly, discarded) = split_by_cadence(raw.get(kind));
        split.annual.set(kind, annual);
        split.quarterly.set(kind, quarterly);
        split.discarded += discarded;
    }
    split
}
