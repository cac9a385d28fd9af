//! Analytics Functions
//!
//! Windowed aggregation primitives, window walks and the discriminant model.
//! Everything here is pure and operates on borrowed sample slices, so it can
//! be called from any worker without synchronisation.

pub mod model;
pub mod primitives;
pub mod windows;

pub use model::{
    AnomalyPolicy, DiscriminantInputs, ModelParameters, OutlierBand, RiskModel, ScoreQuality,
};
pub use primitives::{closest_to_mid, first_value, latest_value, mean_rate_per_kg, snap_to_bucket};
pub use windows::{BackwardWalk, ForwardWalk, TimeWindow};
