use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::index::symbol_index::SymbolIndex;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuzzyMatch {
    pub fqname: String,
    pub score: f64,
}

/// Case-folded similarity heuristic, checked in order: exact match,
/// containment scaled by length ratio, prefix scaled by length ratio, a
/// common-prefix/length blend capped below containment scores, and a
/// character-set Jaccard overlap as the last resort. Not an edit distance.
pub fn similarity(query: &str, target: &str) -> f64 {
    let q = query.to_lowercase();
    let t = target.to_lowercase();
    if q.is_empty() || t.is_empty() {
        return 0.0;
    }
    if q == t {
        return 1.0;
    }

    let q_len = q.chars().count() as f64;
    let t_len = t.chars().count() as f64;
    let ratio = q_len.min(t_len) / q_len.max(t_len);

    if t.contains(&q) || q.contains(&t) {
        return 0.9 + 0.1 * ratio;
    }
    if t.starts_with(&q) {
        return 0.8 + 0.2 * ratio;
    }

    let common_prefix = q
        .chars()
        .zip(t.chars())
        .take_while(|(a, b)| a == b)
        .count() as f64;
    if common_prefix > 0.0 {
        let score = 0.7 * (common_prefix / q_len.max(t_len)) + 0.3 * ratio;
        return score.min(0.95);
    }

    let q_chars: HashSet<char> = q.chars().collect();
    let t_chars: HashSet<char> = t.chars().collect();
    let intersection = q_chars.intersection(&t_chars).count() as f64;
    let union = q_chars.union(&t_chars).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

impl SymbolIndex {
    /// Score every indexed symbol against the query (simple name and
    /// fqname, best of the two) and return matches at or above the
    /// threshold, strongest first.
    pub fn fuzzy_search(&self, query: &str, threshold: f64) -> Vec<FuzzyMatch> {
        let candidates: Vec<(&str, &str)> = self
            .entities()
            .into_iter()
            .map(|entity| (entity.fqname(), entity.name()))
            .collect();

        let mut matches: Vec<FuzzyMatch> = candidates
            .par_iter()
            .filter_map(|(fqname, name)| {
                let score = similarity(query, name).max(similarity(query, fqname));
                (score >= threshold).then(|| FuzzyMatch {
                    fqname: fqname.to_string(),
                    score,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.fqname.cmp(&b.fqname))
        });
        matches
    }
}
