use thiserror::Error;

/// Failures of the plumbing around the calculation core: snapshot files,
/// configuration, CLI usage. The core itself never returns errors; its
/// anomalies surface as `CalcEvent::CalculationError` (see `events`).
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Snapshot I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Snapshot format error: {source}")]
    SnapshotFormatError {
        #[from]
        source: serde_json::Error,
    },

    // Catch-all for anyhow errors when direct conversion is suitable
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}
