//! Read-only, per-case grouping of the input series.
//!
//! The index is built once per generation call, before any worker starts,
//! and is only ever shared by reference afterwards.

use crate::time_series::{ParameterCategory, ParameterSeries, Sample};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// One case as seen through its encounter records.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseEncounter {
    pub case_id: String,
    /// Earliest encounter start
    pub admission: DateTime<Utc>,
    /// `None` while any encounter of the case is open, else the latest end
    pub discharge: Option<DateTime<Utc>>,
    /// Values of every open encounter, in input order
    pub open_markers: Vec<f64>,
}

impl CaseEncounter {
    pub fn is_active(&self) -> bool {
        self.discharge.is_none()
    }

    /// Whether any open encounter of the case carries `marker`.
    pub fn has_open_marker(&self, marker: f64) -> bool {
        self.open_markers.iter().any(|value| *value == marker)
    }
}

/// Borrowed view of all series of a single case.
#[derive(Debug, Clone, Copy)]
pub struct CaseSeries<'a> {
    pub episodes: &'a [Sample],
    pub creatinine: &'a [Sample],
    pub urea: &'a [Sample],
    pub lactate: &'a [Sample],
    pub urine_output: &'a [Sample],
    pub body_weight: &'a [Sample],
    pub therapy_starts: &'a [Sample],
}

impl<'a> CaseSeries<'a> {
    /// Body weight is near-static: the first recorded sample is used.
    pub fn recorded_body_weight(&self) -> Option<&'a Sample> {
        self.body_weight.first()
    }

    pub fn has_therapy(&self) -> bool {
        !self.therapy_starts.is_empty()
    }

    /// Earliest therapy start, the anchor of the therapy-anchored walk.
    pub fn therapy_anchor(&self) -> Option<DateTime<Utc>> {
        self.therapy_starts.iter().map(|sample| sample.valid_from).min()
    }
}

/// Samples grouped by category and case id.
#[derive(Debug, Clone, Default)]
pub struct CaseIndex {
    groups: HashMap<ParameterCategory, HashMap<String, Vec<Sample>>>,
    encounters: Vec<CaseEncounter>,
}

impl CaseIndex {
    pub fn build(series: &ParameterSeries) -> Self {
        let mut groups: HashMap<ParameterCategory, HashMap<String, Vec<Sample>>> = HashMap::new();
        for (category, samples) in series {
            let by_case = groups.entry(*category).or_default();
            for sample in samples {
                by_case
                    .entry(sample.case_id.clone())
                    .or_default()
                    .push(sample.clone());
            }
        }

        let encounters = series
            .get(&ParameterCategory::Encounter)
            .map(|samples| merge_encounters(samples))
            .unwrap_or_default();

        for category in ParameterCategory::ALL {
            let cases = groups.get(&category).map_or(0, HashMap::len);
            debug!(%category, cases, "indexed category");
        }
        debug!(
            cases = encounters.len(),
            categories = groups.len(),
            "built case index"
        );

        CaseIndex { groups, encounters }
    }

    /// One entry per case, in order of first appearance.
    pub fn encounters(&self) -> &[CaseEncounter] {
        &self.encounters
    }

    pub fn case_count(&self) -> usize {
        self.encounters.len()
    }

    /// All samples of one category for one case (empty if none).
    pub fn samples(&self, category: ParameterCategory, case_id: &str) -> &[Sample] {
        self.groups
            .get(&category)
            .and_then(|by_case| by_case.get(case_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn case(&self, case_id: &str) -> CaseSeries<'_> {
        CaseSeries {
            episodes: self.samples(ParameterCategory::Episode, case_id),
            creatinine: self.samples(ParameterCategory::Creatinine, case_id),
            urea: self.samples(ParameterCategory::Urea, case_id),
            lactate: self.samples(ParameterCategory::Lactate, case_id),
            urine_output: self.samples(ParameterCategory::UrineOutput, case_id),
            body_weight: self.samples(ParameterCategory::BodyWeight, case_id),
            therapy_starts: self.samples(ParameterCategory::TherapyStart, case_id),
        }
    }
}

fn merge_encounters(samples: &[Sample]) -> Vec<CaseEncounter> {
    let mut order: Vec<CaseEncounter> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for sample in samples {
        match positions.get(sample.case_id.as_str()) {
            Some(&pos) => {
                let case = &mut order[pos];
                if sample.valid_from < case.admission {
                    case.admission = sample.valid_from;
                }
                match (case.discharge, sample.valid_to) {
                    (_, None) => {
                        case.discharge = None;
                        case.open_markers.extend(sample.value);
                    }
                    (Some(current), Some(end)) if end > current => case.discharge = Some(end),
                    _ => {}
                }
            }
            None => {
                positions.insert(sample.case_id.as_str(), order.len());
                let open_markers = match sample.valid_to {
                    None => sample.value.into_iter().collect(),
                    Some(_) => Vec::new(),
                };
                order.push(CaseEncounter {
                    case_id: sample.case_id.clone(),
                    admission: sample.valid_from,
                    discharge: sample.valid_to,
                    open_markers,
                });
            }
        }
    }

    order
}
