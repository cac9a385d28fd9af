//! Error types for the risk engine.
//!
//! Per-case and per-window problems (missing baseline, too few samples in a
//! window, anomalous scores) are never errors: they are recovered locally by
//! skipping the case or window. Only configuration problems and worker
//! failures reach the caller.

/// Errors surfaced by a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The report-period axis is empty or not strictly ascending
    InvalidAxis(String),
    /// The engine configuration is unusable
    InvalidConfig(String),
    /// The worker pool could not be created
    WorkerPool(String),
    /// A shard worker panicked; the whole generation call is aborted
    WorkerInterrupted { shard: usize, reason: String },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidAxis(msg) => write!(f, "Invalid report axis: {}", msg),
            EngineError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            EngineError::WorkerPool(msg) => write!(f, "Worker pool error: {}", msg),
            EngineError::WorkerInterrupted { shard, reason } => {
                write!(f, "Worker for shard {} interrupted: {}", shard, reason)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_shard() {
        let err = EngineError::WorkerInterrupted {
            shard: 3,
            reason: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Worker for shard 3 interrupted: boom");
    }
}
