use fundamentals_core::{AnomalyFlags, MergedPeriodRecord, SymbolBundle};

/// Assemble a symbol's output, attaching flags to the latest annual record.
///
/// With no annual records the flags are dropped.
pub fn assemble_bundle(
    symbol: &str,
    mut annual: Vec<MergedPeriodRecord>,
    quarterly: Vec<MergedPeriodRecord>,
    flags: AnomalyFlags,
) -> SymbolBundle {
    if let Some(latest) = annual.last_mut() {
        latest.flags = Some(flags);
    }

    SymbolBundle {
        symbol: symbol.to_string(),
        annual,
        quarterly,
    }
}
