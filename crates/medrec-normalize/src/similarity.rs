//! Diagnostic name similarity. Never used to decide a ledger status.

use std::collections::BTreeSet;

/// Similarity of two resolved drug names in `[0.0, 1.0]`.
///
/// Equal names score 1.0, a name contained in the other scores 0.8, and
/// anything else scores the Jaccard overlap of their character sets.
/// An empty name scores 0.0 against everything.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(b) || b.contains(a) {
        return 0.8;
    }
    jaccard(a, b)
}

/// Jaccard overlap of the character sets of `a` and `b`.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let left: BTreeSet<char> = a.chars().collect();
    let right: BTreeSet<char> = b.chars().collect();
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}
