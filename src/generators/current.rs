use crate::analytics::TimeWindow;
use crate::case_index::{CaseEncounter, CaseIndex};
use crate::config::EngineConfig;
use crate::walker::{CaseScorer, ValueSelection};
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

/// Whether a case qualifies for the live snapshot.
fn is_candidate(
    index: &CaseIndex,
    config: &EngineConfig,
    encounter: &CaseEncounter,
    window: TimeWindow,
) -> bool {
    if !encounter.is_active() || encounter.admission > window.from {
        return false;
    }
    if let Some(marker) = config.icu_marker {
        if !encounter.has_open_marker(marker) {
            return false;
        }
    }
    if index.case(&encounter.case_id).has_therapy() {
        trace!(case_id = %encounter.case_id, "therapy already started, not a current candidate");
        return false;
    }
    true
}

/// Scores every active case over the 24h window ending at `now`.
///
/// The result carries neither case ids nor labels. Candidate sets are small,
/// so this runs on the calling thread.
pub fn generate(index: &CaseIndex, config: &EngineConfig, now: DateTime<Utc>) -> Vec<f64> {
    let window = TimeWindow::ending_at(now, config.window());
    let scorer = CaseScorer::new(index, config);

    let candidates: Vec<&CaseEncounter> = index
        .encounters()
        .iter()
        .filter(|encounter| is_candidate(index, config, encounter, window))
        .collect();
    debug!(
        cases = index.case_count(),
        candidates = candidates.len(),
        "current risk candidates"
    );

    let scores: Vec<f64> = candidates
        .into_iter()
        .filter_map(|encounter| scorer.profile(encounter))
        .filter_map(|profile| scorer.score(&profile, window, ValueSelection::Current))
        .collect();

    debug!(scored = scores.len(), "current risk computed");
    scores
}
