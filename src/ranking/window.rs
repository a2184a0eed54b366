//! In-memory window selection.
//!
//! `RankingRepository::select_top` runs the same selection in SQL; both must
//! agree on filtering, tie-breaks and ordering.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::types::{RankingSnapshot, TimeWindow, WindowedStory};

/// Reference story count for an episode.
pub const DEFAULT_SELECT_LIMIT: usize = 3;

/// Select the top `limit` stories observed inside `window`.
///
/// Each story is represented by its highest-scoring snapshot in the window,
/// the earliest one when several share that score. The result is sorted by
/// score descending, then by when that score was first seen, then by story
/// ID, so the candidate list is deterministic.
pub fn select_top(
    snapshots: &[RankingSnapshot],
    window: &TimeWindow,
    limit: usize,
) -> Vec<WindowedStory> {
    let mut best: HashMap<i64, &RankingSnapshot> = HashMap::new();

    for snapshot in snapshots.iter().filter(|s| window.contains(&s.fetched_at)) {
        best.entry(snapshot.story_id)
            .and_modify(|current| {
                if beats(snapshot, current) {
                    *current = snapshot;
                }
            })
            .or_insert(snapshot);
    }

    let mut stories: Vec<WindowedStory> = best.into_values().map(WindowedStory::from).collect();
    stories.sort_by(compare_ranked);
    stories.truncate(limit);
    stories
}

/// Whether `candidate` should replace `current` as a story's representative.
fn beats(candidate: &RankingSnapshot, current: &RankingSnapshot) -> bool {
    candidate.score > current.score
        || (candidate.score == current.score && candidate.fetched_at < current.fetched_at)
}

/// Ordering of the final candidate list.
pub(crate) fn compare_ranked(a: &WindowedStory, b: &WindowedStory) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.fetched_at.cmp(&b.fetched_at))
        .then_with(|| a.story_id.cmp(&b.story_id))
}
