use std::cmp::Ordering;

use crate::matching::profile::MatchResult;

/// Orders results by descending `final_match_score`, then ascending
/// `candidate_name`, then ascending `original_filename`. Never truncates.
pub fn rank(mut results: Vec<MatchResult>) -> Vec<MatchResult> {
    results.sort_by(compare);
    results
}

fn compare(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.final_match_score
        .total_cmp(&a.final_match_score)
        .then_with(|| a.candidate_name.cmp(&b.candidate_name))
        .then_with(|| a.original_filename.cmp(&b.original_filename))
}
