//! Case window walker.
//!
//! For every case the walker first checks the case-level preconditions (a
//! baseline creatinine and a recorded body weight), then picks a strategy:
//!
//! - **therapy-anchored**: the case has at least one therapy start; windows
//!   walk backward from the earliest start.
//! - **admission-anchored**: no therapy; windows walk forward through every
//!   episode of the case.
//!
//! Each window is scored with the discriminant model and handed to the
//! generator-specific sink (ROC list or timeline shard).

use crate::analytics::primitives::{closest_to_mid, first_value, latest_value, mean_rate_per_kg};
use crate::analytics::{
    BackwardWalk, DiscriminantInputs, ForwardWalk, RiskModel, ScoreQuality, TimeWindow,
};
use crate::case_index::{CaseEncounter, CaseIndex, CaseSeries};
use crate::config::EngineConfig;
use crate::generators::roc::RocItem;
use crate::generators::timeline::TimelineShard;
use crate::time_series::ReportAxis;
use chrono::{DateTime, Utc};
use tracing::{trace, warn};

/// How the lab values of a window are picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSelection {
    /// Creatinine and urea closest to the window middle, latest lactate
    Historical,
    /// Latest creatinine, urea and lactate
    Current,
}

/// A case that passed the baseline checks.
#[derive(Debug, Clone, Copy)]
pub struct CaseProfile<'a> {
    pub case_id: &'a str,
    pub admission: DateTime<Utc>,
    pub series: CaseSeries<'a>,
    pub baseline_creatinine: f64,
    pub body_weight: Option<f64>,
}

/// Scores individual windows of individual cases.
#[derive(Debug, Clone, Copy)]
pub struct CaseScorer<'a> {
    index: &'a CaseIndex,
    config: &'a EngineConfig,
    model: RiskModel,
}

impl<'a> CaseScorer<'a> {
    pub fn new(index: &'a CaseIndex, config: &'a EngineConfig) -> Self {
        CaseScorer {
            index,
            config,
            model: config.risk_model(),
        }
    }

    /// Resolves the case-level baseline, or `None` if the case cannot be scored at all.
    pub fn profile<'e>(&self, encounter: &'e CaseEncounter) -> Option<CaseProfile<'e>>
    where
        'a: 'e,
    {
        let case_id = encounter.case_id.as_str();
        let series = self.index.case(case_id);

        let Some(baseline_creatinine) = first_value(series.creatinine) else {
            trace!(case_id, "missing baseline creatinine, skipping case");
            return None;
        };
        let Some(weight) = series.recorded_body_weight() else {
            trace!(case_id, "missing body weight, skipping case");
            return None;
        };

        Some(CaseProfile {
            case_id,
            admission: encounter.admission,
            series,
            baseline_creatinine,
            body_weight: weight.value,
        })
    }

    /// Discriminant operands for one window.
    pub fn inputs(
        &self,
        profile: &CaseProfile<'_>,
        window: TimeWindow,
        selection: ValueSelection,
    ) -> DiscriminantInputs {
        let TimeWindow { from, to } = window;
        let series = &profile.series;
        let (current_creatinine, current_urea) = match selection {
            ValueSelection::Historical => {
                let margin = self.config.settle_margin();
                (
                    closest_to_mid(series.creatinine, from, to, margin),
                    closest_to_mid(series.urea, from, to, margin),
                )
            }
            ValueSelection::Current => (
                latest_value(series.creatinine, from, to),
                latest_value(series.urea, from, to),
            ),
        };

        DiscriminantInputs {
            current_creatinine,
            first_creatinine: Some(profile.baseline_creatinine),
            current_urea,
            current_lactate: latest_value(series.lactate, from, to),
            mean_urine_rate: mean_rate_per_kg(series.urine_output, profile.body_weight, from, to),
        }
    }

    /// Scores a window; `None` if an operand is missing or the score is dropped by policy.
    pub fn score(
        &self,
        profile: &CaseProfile<'_>,
        window: TimeWindow,
        selection: ValueSelection,
    ) -> Option<f64> {
        let inputs = self.inputs(profile, window, selection);
        let case_id = profile.case_id;

        let Some((risk, quality)) = self.model.assess(&inputs) else {
            trace!(case_id, from = %window.from, to = %window.to, "risk is null");
            return None;
        };

        match quality {
            ScoreQuality::NonFinite => warn!(
                case_id,
                risk,
                from = %window.from,
                to = %window.to,
                %inputs,
                "risk is not finite"
            ),
            ScoreQuality::Outlier => warn!(
                case_id,
                risk,
                from = %window.from,
                to = %window.to,
                %inputs,
                "outlier found"
            ),
            ScoreQuality::Normal => trace!(
                case_id,
                risk,
                from = %window.from,
                to = %window.to,
                %inputs,
                "risk computed"
            ),
        }

        if self.model.admits(quality) {
            Some(risk)
        } else {
            trace!(case_id, risk, "anomalous risk discarded by policy");
            None
        }
    }
}

/// Walks the windows of one case for the ROC and timeline generators.
#[derive(Debug, Clone, Copy)]
pub struct CaseWindowWalker<'a> {
    scorer: CaseScorer<'a>,
    axis: &'a ReportAxis,
    config: &'a EngineConfig,
    now: DateTime<Utc>,
}

impl<'a> CaseWindowWalker<'a> {
    pub fn new(
        index: &'a CaseIndex,
        axis: &'a ReportAxis,
        config: &'a EngineConfig,
        now: DateTime<Utc>,
    ) -> Self {
        CaseWindowWalker {
            scorer: CaseScorer::new(index, config),
            axis,
            config,
            now,
        }
    }

    fn walk_floor(&self, admission: DateTime<Utc>) -> DateTime<Utc> {
        admission.max(self.axis.start())
    }

    /// Appends the labeled ROC items of one case.
    pub fn walk_roc(&self, encounter: &CaseEncounter, items: &mut Vec<RocItem>) {
        trace!(case_id = %encounter.case_id, "start roc walk");
        let Some(profile) = self.scorer.profile(encounter) else {
            return;
        };
        let length = self.config.window();

        match profile.series.therapy_anchor() {
            Some(anchor) => {
                let end = anchor - self.config.roc_anchor_offset();
                let floor = self.walk_floor(profile.admission);
                let mut positive_pending = true;
                for window in BackwardWalk::new(end, floor, length) {
                    let score = self.scorer.score(&profile, window, ValueSelection::Historical);
                    if let Some(risk) = score {
                        let label = if positive_pending { 1 } else { 0 };
                        positive_pending = false;
                        items.push(RocItem::new(risk, label));
                    }
                }
            }
            None => {
                for episode in profile.series.episodes {
                    // Only completed stays are used for labeling.
                    let Some(release) = episode.valid_to else {
                        trace!(case_id = profile.case_id, "open episode skipped for roc");
                        continue;
                    };
                    let start = self.walk_floor(episode.valid_from);
                    for window in ForwardWalk::new(start, release, length) {
                        let score = self.scorer.score(&profile, window, ValueSelection::Historical);
                        if let Some(risk) = score {
                            items.push(RocItem::new(risk, 0));
                        }
                    }
                }
            }
        }
        trace!(case_id = %encounter.case_id, "end roc walk");
    }

    /// Records the risk scores and therapy days of one case into a timeline shard.
    pub fn walk_timeline(&self, encounter: &CaseEncounter, shard: &mut TimelineShard) {
        trace!(case_id = %encounter.case_id, "start timeline walk");
        let Some(profile) = self.scorer.profile(encounter) else {
            return;
        };
        let length = self.config.window();

        match profile.series.therapy_anchor() {
            Some(anchor) => {
                let floor = self.walk_floor(profile.admission);
                for window in BackwardWalk::new(anchor, floor, length) {
                    self.record_window(&profile, window, floor, anchor, shard);
                }
                self.count_therapy(&profile, shard);
            }
            None => {
                for episode in profile.series.episodes {
                    let release = episode.valid_to.unwrap_or(self.now);
                    let start = self.walk_floor(episode.valid_from);
                    for window in ForwardWalk::new(start, release, length) {
                        self.record_window(&profile, window, start, release, shard);
                    }
                }
            }
        }
        trace!(case_id = %encounter.case_id, "end timeline walk");
    }

    fn record_window(
        &self,
        profile: &CaseProfile<'_>,
        window: TimeWindow,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        shard: &mut TimelineShard,
    ) {
        let Some(bucket) = self.axis.snap(window.to) else {
            trace!(case_id = profile.case_id, to = %window.to, "no bucket for window");
            return;
        };
        if bucket < range_start || bucket > range_end {
            return;
        }
        if let Some(risk) = self.scorer.score(profile, window, ValueSelection::Historical) {
            if !shard.record_risk(bucket, profile.case_id, risk) {
                trace!(case_id = profile.case_id, %bucket, "case already scored for bucket");
            }
        }
    }

    fn count_therapy(&self, profile: &CaseProfile<'_>, shard: &mut TimelineShard) {
        let axis_start = self.axis.start();
        for therapy in profile.series.therapy_starts {
            let end = therapy.valid_to.unwrap_or(self.now);
            // Snapping the start down makes a run crossing midnight count for both days.
            let start = if therapy.valid_from < axis_start {
                axis_start
            } else {
                self.axis.snap(therapy.valid_from).unwrap_or(therapy.valid_from)
            };

            for window in BackwardWalk::new(end, start, self.config.window()) {
                let Some(bucket) = self.axis.snap(window.to) else {
                    trace!(case_id = profile.case_id, to = %window.to, "no bucket for therapy day");
                    continue;
                };
                if bucket < start || bucket > end {
                    continue;
                }
                if !shard.record_therapy(bucket, profile.case_id) {
                    trace!(case_id = profile.case_id, %bucket, "therapy already counted");
                }
            }
        }
    }
}
