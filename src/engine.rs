//! Engine entry points.
//!
//! [`RenalRiskEngine`] owns a validated configuration and runs the three
//! generators against a [`ParameterSeries`]. Every call builds its own
//! [`CaseIndex`]; nothing is cached between calls.

use crate::case_index::CaseIndex;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::generators::{current, roc, timeline, RocItem, TimelineResult};
use crate::time_series::{ParameterSeries, ReportAxis};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// All three outputs of one generation call.
#[derive(Debug, Clone, Serialize)]
pub struct RenalRiskReport {
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// Live snapshot of every active case
    pub current: Vec<f64>,
    /// Historical per-bucket risk and therapy counts
    pub timeline: TimelineResult,
    /// Labeled `[risk, label]` pairs
    pub roc: Vec<RocItem>,
}

#[derive(Debug, Clone)]
pub struct RenalRiskEngine {
    config: EngineConfig,
}

impl RenalRiskEngine {
    /// # Errors
    /// Returns `EngineError::InvalidConfig` if the configuration does not validate.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(RenalRiskEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Risk of every active, therapy-free case over the window ending at `now`.
    pub fn current(&self, series: &ParameterSeries, now: DateTime<Utc>) -> Vec<f64> {
        let index = CaseIndex::build(series);
        current::generate(&index, &self.config, now)
    }

    /// Per-bucket risk lists and therapy counts over the report axis.
    pub fn timeline(
        &self,
        series: &ParameterSeries,
        axis: &ReportAxis,
        now: DateTime<Utc>,
    ) -> Result<TimelineResult, EngineError> {
        let index = CaseIndex::build(series);
        timeline::generate(&index, axis, &self.config, now)
    }

    /// Labeled ROC items of every case released on or after the axis start.
    pub fn cumulative_roc(
        &self,
        series: &ParameterSeries,
        axis: &ReportAxis,
        now: DateTime<Utc>,
    ) -> Result<Vec<RocItem>, EngineError> {
        let index = CaseIndex::build(series);
        roc::generate(&index, axis, &self.config, now)
    }

    /// Runs all three generators on one shared index.
    pub fn generate(
        &self,
        series: &ParameterSeries,
        axis: &ReportAxis,
        now: DateTime<Utc>,
    ) -> Result<RenalRiskReport, EngineError> {
        log::info!(
            "Starting report: {} buckets from {}, {} workers",
            axis.len(),
            axis.start(),
            self.config.worker_count()
        );

        let started = Instant::now();
        let index = CaseIndex::build(series);
        log::info!(
            "Indexed {} cases in {:?}",
            index.case_count(),
            started.elapsed()
        );

        let step = Instant::now();
        let current = current::generate(&index, &self.config, now);
        log::info!("Current risk: {} scores in {:?}", current.len(), step.elapsed());

        let step = Instant::now();
        let timeline = timeline::generate(&index, axis, &self.config, now)?;
        log::info!("Timeline: {} buckets in {:?}", timeline.len(), step.elapsed());

        let step = Instant::now();
        let roc = roc::generate(&index, axis, &self.config, now)?;
        log::info!("Cumulative ROC: {} items in {:?}", roc.len(), step.elapsed());

        log::info!("Report complete in {:?}", started.elapsed());

        Ok(RenalRiskReport {
            generated_at: now,
            current,
            timeline,
            roc,
        })
    }
}

/// Installs a compact `tracing` subscriber filtered by `RUST_LOG`, or by
/// `default_filter` when the variable is unset.
///
/// Calling it again once a subscriber is installed has no effect.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_series::{ParameterCategory, Sample};
    use chrono::{Duration, TimeZone};

    #[test]
    fn rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.window_secs = 0;
        assert!(matches!(
            RenalRiskEngine::new(config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_series_yields_empty_report() {
        init_tracing("warn");
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let axis = ReportAxis::daily(now - Duration::days(3), now).unwrap();
        let engine = RenalRiskEngine::new(EngineConfig::default().with_workers(2)).unwrap();

        let report = engine.generate(&ParameterSeries::new(), &axis, now).unwrap();
        assert!(report.current.is_empty());
        assert!(report.roc.is_empty());
        assert_eq!(report.timeline.len(), 3);
        assert!(report.timeline.risk_scores.iter().all(Vec::is_empty));
        assert_eq!(report.timeline.therapy_count, vec![0, 0, 0]);
    }

    #[test]
    fn single_generators_match_bundled_report() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let axis = ReportAxis::daily(now - Duration::days(5), now).unwrap();
        let mut series = ParameterSeries::new();
        series.insert(
            ParameterCategory::Encounter,
            vec![Sample::interval("a", now - Duration::days(4), None)],
        );
        series.insert(
            ParameterCategory::TherapyStart,
            vec![Sample::interval("a", now - Duration::hours(18), None)],
        );
        series.insert(
            ParameterCategory::Creatinine,
            vec![Sample::new("a", 1.0, now - Duration::days(4))],
        );
        series.insert(
            ParameterCategory::BodyWeight,
            vec![Sample::new("a", 70.0, now - Duration::days(4))],
        );
        let engine = RenalRiskEngine::new(EngineConfig::default().with_workers(1)).unwrap();

        let report = engine.generate(&series, &axis, now).unwrap();
        assert_eq!(report.timeline, engine.timeline(&series, &axis, now).unwrap());
        assert_eq!(report.current, engine.current(&series, now));
        assert_eq!(report.roc, engine.cumulative_roc(&series, &axis, now).unwrap());
        assert_eq!(report.timeline.therapy_count.iter().sum::<usize>(), 1);
    }
}
