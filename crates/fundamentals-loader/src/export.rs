use anyhow::{Context, Result};
use fundamentals_core::SymbolBundle;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write all bundles as one pretty-printed JSON array
pub fn write_bundles(path: &Path, bundles: &[SymbolBundle]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, bundles)
        .with_context(|| format!("failed to serialize bundles to {}", path.display()))?;
    writer.flush()?;

    Ok(())
}
