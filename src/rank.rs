//! Deterministic ordering of fetched stories.

use crate::models::StoryRecord;
use itertools::Itertools;
use std::cmp::Reverse;

/// Order stories by descending score.
///
/// Equal scores are broken by ascending `id`, which makes the result a
/// total order: the same set of records always ranks the same way, no
/// matter in which order the workers delivered them.
pub fn rank(records: Vec<StoryRecord>) -> Vec<StoryRecord> {
    records
        .into_iter()
        .sorted_unstable_by_key(|r| (Reverse(r.score), r.id))
        .collect()
}

/// `true` if `records` is in the order [`rank`] produces.
pub fn is_ranked(records: &[StoryRecord]) -> bool {
    records
        .iter()
        .tuple_windows()
        .all(|(a, b)| (Reverse(a.score), a.id) <= (Reverse(b.score), b.id))
}
