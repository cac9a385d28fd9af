use crate::analytics::primitives::snap_to_bucket;
use crate::error::EngineError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single timestamped measurement or interval for one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Identifier of the hospital case the sample belongs to
    pub case_id: String,
    /// Measured value (absent for pure interval records)
    pub value: Option<f64>,
    /// Start of validity, the natural ordering key
    pub valid_from: DateTime<Utc>,
    /// End of validity; `None` while the interval is still open
    pub valid_to: Option<DateTime<Utc>>,
}

impl Sample {
    /// Creates a point measurement.
    pub fn new(case_id: impl Into<String>, value: f64, valid_from: DateTime<Utc>) -> Self {
        Sample {
            case_id: case_id.into(),
            value: Some(value),
            valid_from,
            valid_to: None,
        }
    }

    /// Creates a value-less interval such as an episode or a therapy run.
    pub fn interval(
        case_id: impl Into<String>,
        valid_from: DateTime<Utc>,
        valid_to: Option<DateTime<Utc>>,
    ) -> Self {
        Sample {
            case_id: case_id.into(),
            value: None,
            valid_from,
            valid_to,
        }
    }

    /// Sets the value, keeping everything else.
    pub fn with_value(mut self, value: Option<f64>) -> Self {
        self.value = value;
        self
    }

    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }
}

/// The parameter categories the risk model consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterCategory {
    Encounter,
    Episode,
    Creatinine,
    Urea,
    Lactate,
    UrineOutput,
    BodyWeight,
    TherapyStart,
}

impl ParameterCategory {
    pub const ALL: [ParameterCategory; 8] = [
        ParameterCategory::Encounter,
        ParameterCategory::Episode,
        ParameterCategory::Creatinine,
        ParameterCategory::Urea,
        ParameterCategory::Lactate,
        ParameterCategory::UrineOutput,
        ParameterCategory::BodyWeight,
        ParameterCategory::TherapyStart,
    ];
}

impl std::fmt::Display for ParameterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr = match self {
            ParameterCategory::Encounter => "encounter",
            ParameterCategory::Episode => "episode",
            ParameterCategory::Creatinine => "creatinine",
            ParameterCategory::Urea => "urea",
            ParameterCategory::Lactate => "lactate",
            ParameterCategory::UrineOutput => "urine_output",
            ParameterCategory::BodyWeight => "body_weight",
            ParameterCategory::TherapyStart => "therapy_start",
        };
        write!(f, "{repr}")
    }
}

/// Per-category sample lists as handed over by the ingestion layer.
///
/// A missing category is treated like an empty one.
pub type ParameterSeries = HashMap<ParameterCategory, Vec<Sample>>;

/// The canonical, ascending report-period axis.
///
/// Every timeline bucket is keyed by one of these timestamps; the first one
/// is the global start from which any window walk is clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportAxis {
    timestamps: Vec<DateTime<Utc>>,
}

impl ReportAxis {
    /// Wraps an externally supplied list of boundaries.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidAxis` if the list is empty or not
    /// strictly ascending.
    pub fn new(timestamps: Vec<DateTime<Utc>>) -> Result<Self, EngineError> {
        if timestamps.is_empty() {
            return Err(EngineError::InvalidAxis("axis has no timestamps".to_string()));
        }
        if let Some(pair) = timestamps.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(EngineError::InvalidAxis(format!(
                "timestamps not ascending at {} -> {}",
                pair[0], pair[1]
            )));
        }
        Ok(ReportAxis { timestamps })
    }

    /// Builds one boundary every 24 hours from `start` up to and including `now`.
    pub fn daily(start: DateTime<Utc>, now: DateTime<Utc>) -> Result<Self, EngineError> {
        let mut timestamps = Vec::new();
        let mut current = start;
        while current <= now {
            timestamps.push(current);
            current += Duration::days(1);
        }
        ReportAxis::new(timestamps)
    }

    /// The global start of the report.
    pub fn start(&self) -> DateTime<Utc> {
        self.timestamps[0]
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Maps an arbitrary instant onto the greatest boundary strictly before it.
    pub fn snap(&self, value: DateTime<Utc>) -> Option<DateTime<Utc>> {
        snap_to_bucket(&self.timestamps, value)
    }

    /// The reported buckets: every boundary except the trailing (future) one.
    pub fn reported(&self) -> &[DateTime<Utc>] {
        &self.timestamps[..self.timestamps.len() - 1]
    }
}
