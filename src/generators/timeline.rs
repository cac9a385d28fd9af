use crate::case_index::{CaseEncounter, CaseIndex};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::parallel::fan_out;
use crate::time_series::ReportAxis;
use crate::walker::CaseWindowWalker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Historical per-bucket output, aligned on `date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineResult {
    /// Bucket start in Unix seconds, ascending
    pub date: Vec<i64>,
    /// Risk scores that fell into each bucket (at most one per case)
    pub risk_scores: Vec<Vec<f64>>,
    /// Number of cases under therapy in each bucket
    pub therapy_count: Vec<usize>,
}

impl TimelineResult {
    pub fn len(&self) -> usize {
        self.date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_empty()
    }
}

/// Private bucket maps of one worker.
///
/// Keeps, per bucket, the set of case ids that already contributed so a case
/// is counted at most once per bucket.
#[derive(Debug, Clone, Default)]
pub struct TimelineShard {
    risk: HashMap<DateTime<Utc>, Vec<f64>>,
    therapy: HashMap<DateTime<Utc>, usize>,
    risk_cases: HashMap<DateTime<Utc>, HashSet<String>>,
    therapy_cases: HashMap<DateTime<Utc>, HashSet<String>>,
}

impl TimelineShard {
    /// Adds a risk score; returns `false` if the case already scored this bucket.
    pub fn record_risk(&mut self, bucket: DateTime<Utc>, case_id: &str, risk: f64) -> bool {
        if !self
            .risk_cases
            .entry(bucket)
            .or_default()
            .insert(case_id.to_string())
        {
            return false;
        }
        self.risk.entry(bucket).or_default().push(risk);
        true
    }

    /// Counts a therapy day; returns `false` if the case was already counted for this bucket.
    pub fn record_therapy(&mut self, bucket: DateTime<Utc>, case_id: &str) -> bool {
        if !self
            .therapy_cases
            .entry(bucket)
            .or_default()
            .insert(case_id.to_string())
        {
            return false;
        }
        *self.therapy.entry(bucket).or_default() += 1;
        true
    }

    pub fn risks(&self, bucket: DateTime<Utc>) -> &[f64] {
        self.risk.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn therapy_count(&self, bucket: DateTime<Utc>) -> usize {
        self.therapy.get(&bucket).copied().unwrap_or(0)
    }

    fn risk_cases(&self, bucket: DateTime<Utc>) -> impl Iterator<Item = &String> {
        self.risk_cases.get(&bucket).into_iter().flatten()
    }

    fn therapy_cases(&self, bucket: DateTime<Utc>) -> impl Iterator<Item = &String> {
        self.therapy_cases.get(&bucket).into_iter().flatten()
    }
}

/// Folds worker shards bucket by bucket, dropping the trailing boundary.
pub fn fold(axis: &ReportAxis, shards: &[TimelineShard]) -> TimelineResult {
    let mut result = TimelineResult::default();

    for &bucket in axis.reported() {
        let mut risks = Vec::new();
        let mut therapy = 0;
        let mut risk_cases = BTreeSet::new();
        let mut therapy_cases = BTreeSet::new();

        for shard in shards {
            risks.extend_from_slice(shard.risks(bucket));
            therapy += shard.therapy_count(bucket);
            risk_cases.extend(shard.risk_cases(bucket));
            therapy_cases.extend(shard.therapy_cases(bucket));
        }

        debug!(%bucket, ?risk_cases, "risk data generated by cases");
        debug!(%bucket, ?therapy_cases, "therapy data generated by cases");

        result.date.push(bucket.timestamp());
        result.risk_scores.push(risks);
        result.therapy_count.push(therapy);
    }

    result
}

/// Builds the per-bucket timeline over all cases, sharded across `config.worker_count()` workers.
pub fn generate(
    index: &CaseIndex,
    axis: &ReportAxis,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<TimelineResult, EngineError> {
    let walker = CaseWindowWalker::new(index, axis, config, now);
    let encounters: &[CaseEncounter] = index.encounters();

    let shards = fan_out(encounters, config.worker_count(), |shard_id, cases| {
        let mut shard = TimelineShard::default();
        for encounter in cases {
            walker.walk_timeline(encounter, &mut shard);
        }
        debug!(shard = shard_id, cases = cases.len(), "timeline shard finished");
        shard
    })?;

    Ok(fold(axis, &shards))
}
