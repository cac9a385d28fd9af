pub mod analytics;
pub mod case_index;
pub mod config;
pub mod engine;
pub mod error;
pub mod generators;
pub mod parallel;
pub mod time_series;
pub mod walker;

pub use analytics::{
    AnomalyPolicy,
    DiscriminantInputs,
    ModelParameters,
    OutlierBand,
    RiskModel,
    ScoreQuality,
    TimeWindow,
};
pub use case_index::{CaseEncounter, CaseIndex, CaseSeries};
pub use config::EngineConfig;
pub use engine::{init_tracing, RenalRiskEngine, RenalRiskReport};
pub use error::EngineError;
pub use generators::{RocItem, TimelineResult};
pub use time_series::{ParameterCategory, ParameterSeries, ReportAxis, Sample};
