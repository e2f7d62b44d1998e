use async_trait::async_trait;
use crate::{NormalizeError, RawStatementRecord, RawStatements, StatementKind};

/// Producer of raw statement rows for a symbol.
///
/// Implementations own all I/O; malformed rows must be dropped before they are
/// returned. A symbol with no data for a kind yields an empty vector.
#[async_trait]
pub trait StatementSource: Send + Sync {
    async fn load(
        &self,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<Vec<RawStatementRecord>, NormalizeError>;

    /// Load all four statement kinds for a symbol
    async fn load_all(&self, symbol: &str) -> Result<RawStatements, NormalizeError> {
        let mut raw = RawStatements::default();
        for kind in StatementKind::ALL {
            raw.set(kind, self.load(symbol, kind).await?);
        }
        Ok(raw)
    }
}

/// In-memory source keyed by symbol, for callers that already hold records
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    symbols: std::collections::HashMap<String, RawStatements>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, raw: RawStatements) {
        self.symbols.insert(symbol.into(), raw);
    }
}

#[async_trait]
impl StatementSource for MemorySource {
    async fn load(
        &self,
        symbol: &str,
        kind: StatementKind,
    ) -> Result<Vec<RawStatementRecord>, NormalizeError> {
        Ok(self
            .symbols
            .get(symbol)
            .map(|raw| raw.get(kind).to_vec())
            .unwrap_or_default())
    }
}
