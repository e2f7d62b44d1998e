use thiserror::Error;

/// Symbol-level failures. Field-level gaps never surface here; they become
/// `None` on the affected metric.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("No raw data for {0} in any statement source")]
    NoRawData(String),

    #[error("Stitched FY/Q series are empty for {0}")]
    EmptySeries(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Timed out normalizing {0}")]
    Timeout(String),

    #[error("Task error: {0}")]
    Task(String),
}
