//! Stateless windowed aggregation primitives.
//!
//! These are pure functions over an unordered slice of samples. A window is
//! the closed interval `[from, to]` on `valid_from`; an absent series is just
//! an empty slice. `None` means "cannot be determined for this window".

use crate::time_series::Sample;
use chrono::{DateTime, Duration, Utc};

fn in_window<'a>(
    samples: &'a [Sample],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> impl Iterator<Item = &'a Sample> {
    samples
        .iter()
        .filter(move |sample| sample.valid_from >= from && sample.valid_from <= to)
}

/// Value of the sample with the earliest `valid_from` (the per-case baseline).
pub fn first_value(samples: &[Sample]) -> Option<f64> {
    samples
        .iter()
        .min_by_key(|sample| sample.valid_from)
        .and_then(|sample| sample.value)
}

/// Value of the most recent sample drawn inside the window.
pub fn latest_value(samples: &[Sample], from: DateTime<Utc>, to: DateTime<Utc>) -> Option<f64> {
    // On ties the first sample in input order wins.
    in_window(samples, from, to)
        .reduce(|best, sample| {
            if sample.valid_from > best.valid_from {
                sample
            } else {
                best
            }
        })
        .and_then(|sample| sample.value)
}

/// Value of the sample drawn closest to the middle of the window.
///
/// Returns `None` when that sample lies less than `settle_margin` before `to`:
/// such a result has not settled yet.
pub fn closest_to_mid(
    samples: &[Sample],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    settle_margin: Duration,
) -> Option<f64> {
    let mid = (from.timestamp() + to.timestamp()) / 2;
    let closest = in_window(samples, from, to).reduce(|best, sample| {
        let best_distance = (best.valid_from.timestamp() - mid).abs();
        let distance = (sample.valid_from.timestamp() - mid).abs();
        if distance < best_distance {
            sample
        } else {
            best
        }
    })?;

    if to - closest.valid_from < settle_margin {
        return None;
    }
    closest.value
}

/// Mean rate per hour and kilogram body weight inside the window.
///
/// Needs a positive body weight and at least two samples. The volume of the
/// earliest sample is not counted: it was collected over an unknown interval
/// before the window.
pub fn mean_rate_per_kg(
    samples: &[Sample],
    body_weight: Option<f64>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Option<f64> {
    let body_weight = body_weight.filter(|weight| *weight > 0.0)?;

    let mut within: Vec<&Sample> = in_window(samples, from, to).collect();
    if within.len() < 2 {
        return None;
    }
    within.sort_by_key(|sample| sample.valid_from);

    let mut total = 0.0;
    for sample in &within[1..] {
        total += sample.value?;
    }

    let first = within[0].valid_from.timestamp();
    let last = within[within.len() - 1].valid_from.timestamp();
    let hours = (last - first) as f64 / 3600.0;
    Some(total / (hours * body_weight))
}

/// Greatest boundary strictly lower than `value`.
///
/// `boundaries` must be ascending.
pub fn snap_to_bucket(boundaries: &[DateTime<Utc>], value: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let idx = boundaries.partition_point(|boundary| *boundary < value);
    if idx == 0 {
        None
    } else {
        Some(boundaries[idx - 1])
    }
}
