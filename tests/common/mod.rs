#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use renal_risk::{ParameterCategory, ParameterSeries, Sample};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn day(d: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 0, 0, 0).unwrap() + Duration::days(d)
}

pub fn at(d: i64, hour: i64) -> DateTime<Utc> {
    day(d) + Duration::hours(hour)
}

/// Builds the series of one case sample by sample.
pub struct CaseBuilder<'a> {
    series: &'a mut ParameterSeries,
    case_id: String,
}

impl<'a> CaseBuilder<'a> {
    pub fn new(series: &'a mut ParameterSeries, case_id: &str) -> Self {
        CaseBuilder {
            series,
            case_id: case_id.to_string(),
        }
    }

    fn push(&mut self, category: ParameterCategory, sample: Sample) -> &mut Self {
        self.series.entry(category).or_default().push(sample);
        self
    }

    pub fn stay(
        &mut self,
        admission: DateTime<Utc>,
        discharge: Option<DateTime<Utc>>,
    ) -> &mut Self {
        let id = self.case_id.clone();
        self.push(ParameterCategory::Encounter, Sample::interval(&id, admission, discharge));
        self.push(ParameterCategory::Episode, Sample::interval(&id, admission, discharge))
    }

    pub fn weight(&mut self, kg: f64, at: DateTime<Utc>) -> &mut Self {
        let id = self.case_id.clone();
        self.push(ParameterCategory::BodyWeight, Sample::new(&id, kg, at))
    }

    pub fn creatinine(&mut self, value: f64, at: DateTime<Utc>) -> &mut Self {
        let id = self.case_id.clone();
        self.push(ParameterCategory::Creatinine, Sample::new(&id, value, at))
    }

    pub fn therapy(&mut self, from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> &mut Self {
        let id = self.case_id.clone();
        self.push(ParameterCategory::TherapyStart, Sample::interval(&id, from, to))
    }

    /// One settled set of labs per day, starting on `first_day`.
    pub fn daily_labs(&mut self, first_day: i64, days: i64, urea: f64) -> &mut Self {
        let id = self.case_id.clone();
        for d in first_day..first_day + days {
            let creatinine = 1.0 + 0.1 * (d - first_day) as f64;
            self.push(ParameterCategory::Creatinine, Sample::new(&id, creatinine, at(d, 8)));
            self.push(ParameterCategory::Urea, Sample::new(&id, urea, at(d, 7)));
            self.push(ParameterCategory::Lactate, Sample::new(&id, 1.5, at(d, 10)));
            self.push(ParameterCategory::UrineOutput, Sample::new(&id, 50.0, at(d, 6)));
            self.push(ParameterCategory::UrineOutput, Sample::new(&id, 70.0, at(d, 18)));
        }
        self
    }
}

/// A fully monitored case, optionally with a therapy starting at `therapy_at`.
pub fn dense_case(
    series: &mut ParameterSeries,
    case_id: &str,
    admission_day: i64,
    discharge_day: Option<i64>,
    therapy_at: Option<DateTime<Utc>>,
) {
    let last_day = discharge_day.unwrap_or(admission_day + 10);
    let mut case = CaseBuilder::new(series, case_id);
    case.stay(day(admission_day), discharge_day.map(day))
        .weight(75.0, day(admission_day))
        .daily_labs(admission_day, last_day - admission_day, 40.0);
    if let Some(start) = therapy_at {
        case.therapy(start, Some(start + Duration::hours(20)));
    }
}
