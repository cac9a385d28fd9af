//! Engine configuration.

use crate::analytics::{AnomalyPolicy, ModelParameters, OutlierBand, RiskModel};
use crate::error::EngineError;
use chrono::Duration;
use serde::{Deserialize, Serialize};

const DAY_IN_SECONDS: i64 = 24 * 60 * 60;
/// Upper bound for every duration field; keeps window arithmetic inside chrono's range.
const MAX_SPAN_SECS: i64 = 366 * DAY_IN_SECONDS;

/// Tunables of a generation call.
///
/// All durations are whole seconds so the configuration round-trips through
/// JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Discriminant coefficients
    pub model: ModelParameters,
    /// Band outside of which finite scores are reported as outliers
    pub outlier_band: OutlierBand,
    /// Whether anomalous scores stay in the output
    pub anomaly_policy: AnomalyPolicy,
    /// Width of one scoring window (default: 24h)
    pub window_secs: i64,
    /// Distance between therapy start and the first ROC window (default: 3 days)
    pub roc_anchor_offset_secs: i64,
    /// Samples closer than this to a window's upper bound are not yet settled (default: 3h)
    pub settle_margin_secs: i64,
    /// Number of shards for the parallel generators (default: available cores)
    pub workers: Option<usize>,
    /// If set, only open encounters carrying this value are current candidates
    pub icu_marker: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            model: ModelParameters::default(),
            outlier_band: OutlierBand::default(),
            anomaly_policy: AnomalyPolicy::default(),
            window_secs: DAY_IN_SECONDS,
            roc_anchor_offset_secs: 3 * DAY_IN_SECONDS,
            settle_margin_secs: 3 * 60 * 60,
            workers: None,
            icu_marker: None,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON; omitted fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets a fixed shard count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_anomaly_policy(mut self, policy: AnomalyPolicy) -> Self {
        self.anomaly_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.window_secs <= 0 {
            return Err(EngineError::InvalidConfig(format!(
                "window_secs must be positive, got {}",
                self.window_secs
            )));
        }
        if self.roc_anchor_offset_secs < 0 || self.settle_margin_secs < 0 {
            return Err(EngineError::InvalidConfig(
                "offsets must not be negative".to_string(),
            ));
        }
        for (name, secs) in [
            ("window_secs", self.window_secs),
            ("roc_anchor_offset_secs", self.roc_anchor_offset_secs),
            ("settle_margin_secs", self.settle_margin_secs),
        ] {
            if secs > MAX_SPAN_SECS {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_SPAN_SECS, secs
                )));
            }
        }
        if self.workers == Some(0) {
            return Err(EngineError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.outlier_band.low > self.outlier_band.high {
            return Err(EngineError::InvalidConfig(format!(
                "outlier band [{}, {}] is inverted",
                self.outlier_band.low, self.outlier_band.high
            )));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs)
    }

    pub fn roc_anchor_offset(&self) -> Duration {
        Duration::seconds(self.roc_anchor_offset_secs)
    }

    pub fn settle_margin(&self) -> Duration {
        Duration::seconds(self.settle_margin_secs)
    }

    /// Resolved shard count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn risk_model(&self) -> RiskModel {
        RiskModel::new(self.model, self.outlier_band, self.anomaly_policy)
    }
}
