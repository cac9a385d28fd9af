use crate::case_index::{CaseEncounter, CaseIndex};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::parallel::fan_out;
use crate::time_series::ReportAxis;
use crate::walker::CaseWindowWalker;
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use tracing::debug;

/// One labeled score for ROC/AUC evaluation.
///
/// `label` is 1 only for the window closest to a therapy start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocItem {
    pub risk: f64,
    pub label: u8,
}

impl RocItem {
    pub fn new(risk: f64, label: u8) -> Self {
        RocItem { risk, label }
    }

    pub fn is_positive(&self) -> bool {
        self.label == 1
    }
}

/// Serialised as the pair `[risk, label]`.
impl Serialize for RocItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.risk, self.label).serialize(serializer)
    }
}

/// Cases eligible for labeling: stays that ended on or after the report start.
fn released_cases<'a>(index: &'a CaseIndex, axis: &ReportAxis) -> Vec<&'a CaseEncounter> {
    index
        .encounters()
        .iter()
        .filter(|encounter| {
            encounter
                .discharge
                .map(|discharge| discharge >= axis.start())
                .unwrap_or(false)
        })
        .collect()
}

/// Builds the labeled ROC list, sharded across `config.worker_count()` workers.
///
/// Shard lists are concatenated in shard order; no other reduction happens.
pub fn generate(
    index: &CaseIndex,
    axis: &ReportAxis,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<Vec<RocItem>, EngineError> {
    let walker = CaseWindowWalker::new(index, axis, config, now);
    let cases = released_cases(index, axis);
    debug!(
        cases = index.case_count(),
        released = cases.len(),
        "roc candidate cases"
    );

    let shards = fan_out(&cases, config.worker_count(), |shard_id, cases| {
        let mut items = Vec::new();
        for encounter in cases {
            walker.walk_roc(encounter, &mut items);
        }
        debug!(shard = shard_id, items = items.len(), "roc shard finished");
        items
    })?;

    Ok(shards.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn serializes_as_pair() {
        let json = serde_json::to_string(&RocItem::new(0.5, 1)).unwrap();
        assert_eq!(json, "[0.5,1]");
    }

    #[test]
    fn only_released_cases_are_labeled() {
        use crate::time_series::{ParameterCategory, ParameterSeries, Sample};

        let day = |d: i64| Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap() + Duration::days(d);
        let mut series = ParameterSeries::new();
        series.insert(
            ParameterCategory::Encounter,
            vec![
                Sample::interval("open", day(0), None),
                Sample::interval("old", day(0), Some(day(1))),
                Sample::interval("recent", day(0), Some(day(6))),
            ],
        );
        let index = CaseIndex::build(&series);
        let axis = ReportAxis::daily(day(5), day(9)).unwrap();

        let cases: Vec<_> = released_cases(&index, &axis)
            .into_iter()
            .map(|case| case.case_id.as_str())
            .collect();
        assert_eq!(cases, vec!["recent"]);
    }
}
