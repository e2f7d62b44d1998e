use anyhow::{bail, Context, Result};
use fundamentals_normalizer::batch::DEFAULT_CONCURRENCY;
use fundamentals_normalizer::BatchOptions;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_RAW_DIR: &str = "data/raw/fmp";
const DEFAULT_OUTPUT: &str = "public/data/fundamentals_highlights.json";

#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Root holding `<category>/<SYMBOL>.jsonl` raw dumps
    pub raw_dir: PathBuf,
    /// Where the highlights JSON is written
    pub output: PathBuf,
    /// Explicit symbols; empty means discover from `raw_dir`
    pub symbols: Vec<String>,
    pub concurrency: usize,
    pub symbol_timeout_secs: Option<u64>,
    pub dry_run: bool,
}

impl LoaderConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config = Self {
            raw_dir: lookup("FUNDAMENTALS_RAW_DIR")
                .unwrap_or_else(|| DEFAULT_RAW_DIR.to_string())
                .into(),
            output: lookup("FUNDAMENTALS_OUTPUT")
                .unwrap_or_else(|| DEFAULT_OUTPUT.to_string())
                .into(),
            symbols: Vec::new(),
            concurrency: lookup("FUNDAMENTALS_CONCURRENCY")
                .unwrap_or_else(|| DEFAULT_CONCURRENCY.to_string())
                .parse::<usize>()
                .context("FUNDAMENTALS_CONCURRENCY must be a positive integer")?,
            symbol_timeout_secs: lookup("FUNDAMENTALS_SYMBOL_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("FUNDAMENTALS_SYMBOL_TIMEOUT_SECS must be an integer")?,
            dry_run: false,
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line flags on top of the environment defaults
    pub fn apply_args(mut self, args: &[String]) -> Result<Self> {
        let value_of = |flag: &str| -> Option<&String> {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
        };

        if let Some(dir) = value_of("--raw-dir") {
            self.raw_dir = dir.into();
        }
        if let Some(out) = value_of("--out") {
            self.output = out.into();
        }
        if let Some(n) = value_of("--concurrency") {
            self.concurrency = n
                .parse()
                .with_context(|| format!("invalid --concurrency value: {}", n))?;
        }
        if let Some(secs) = value_of("--symbol-timeout-secs") {
            self.symbol_timeout_secs = Some(
                secs.parse()
                    .with_context(|| format!("invalid --symbol-timeout-secs value: {}", secs))?,
            );
        }
        if let Some(idx) = args.iter().position(|a| a == "--symbols") {
            self.symbols = args[idx + 1..]
                .iter()
                .take_while(|a| !a.starts_with("--"))
                .cloned()
                .collect();
        }
        self.dry_run = self.dry_run || args.iter().any(|a| a == "--dry-run");

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.symbol_timeout_secs == Some(0) {
            bail!("symbol timeout must be at least 1 second");
        }
        Ok(())
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency: self.concurrency,
            symbol_timeout: self.symbol_timeout_secs.map(Duration::from_secs),
        }
    }
}
