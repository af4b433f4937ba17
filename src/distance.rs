//! Cluster dissimilarity estimation.
//!
//! The merge engine only needs one capability from a distance estimator: a
//! deterministic, real-valued dissimilarity between two *sets of documents*,
//! comparable under `<`. That seam is the [`ClusterDistance`] trait.
//!
//! # Implementations
//!
//! | Estimator | Signal | Cost |
//! |-----------|--------|------|
//! | [`WordOverlap`] | Word-type Jaccard distance | O(total tokens) |
//! | [`FnDistance`] | Whatever the closure computes | caller-defined |
//!
//! [`WordOverlap`] is an explicitly provisional heuristic: it pools each
//! side's documents into one bag, takes the set of whitespace-delimited word
//! types per side, and returns `1 − |A ∩ B| / |A ∪ B|`. It ignores token
//! multiplicity and all semantics. It exists so the merge engine has a
//! self-contained default; production callers are expected to substitute an
//! embedding-centroid or LLM-scored estimator through the same trait without
//! touching the ladder builder.

use std::collections::HashSet;

/// Dissimilarity between two sets of documents.
///
/// Implementations must be pure and deterministic: the merge loop assumes
/// that re-evaluating a pair yields the same score. Returned values should
/// lie in `[0, 1]` with `0` meaning indistinguishable.
pub trait ClusterDistance {
    /// Score the dissimilarity between document sets `a` and `b`.
    fn distance(&self, a: &[&str], b: &[&str]) -> f64;
}

/// Jaccard distance over whitespace-delimited word types.
///
/// The contractual edge case: if both sides are textually empty (empty
/// union), the distance is `0.0` rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordOverlap;

impl WordOverlap {
    /// Create the word-overlap estimator.
    pub fn new() -> Self {
        Self
    }
}

impl ClusterDistance for WordOverlap {
    fn distance(&self, a: &[&str], b: &[&str]) -> f64 {
        let words_a: HashSet<&str> = a.iter().flat_map(|d| d.split_whitespace()).collect();
        let words_b: HashSet<&str> = b.iter().flat_map(|d| d.split_whitespace()).collect();

        let common = words_a.intersection(&words_b).count();
        let total = words_a.union(&words_b).count();

        if total == 0 {
            return 0.0;
        }
        1.0 - common as f64 / total as f64
    }
}

/// A closure-based distance estimator.
///
/// Handy for plugging in an external scorer (embedding centroids, an LLM
/// judge) without defining a new type:
///
/// ```rust
/// use grain::distance::{from_fn, ClusterDistance};
///
/// let constant = from_fn(|_a: &[&str], _b: &[&str]| 0.5);
/// assert_eq!(constant.distance(&["x"], &["y"]), 0.5);
/// ```
#[derive(Clone)]
pub struct FnDistance<F> {
    f: F,
}

impl<F> FnDistance<F> {
    /// Create an estimator from a function.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ClusterDistance for FnDistance<F>
where
    F: Fn(&[&str], &[&str]) -> f64,
{
    fn distance(&self, a: &[&str], b: &[&str]) -> f64 {
        (self.f)(a, b)
    }
}

/// Create a distance estimator from a closure.
pub fn from_fn<F>(f: F) -> FnDistance<F>
where
    F: Fn(&[&str], &[&str]) -> f64,
{
    FnDistance::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sets_are_zero() {
        let d = WordOverlap::new();
        let docs = ["free transit downtown", "more bike lanes"];
        assert_eq!(d.distance(&docs, &docs), 0.0);
    }

    #[test]
    fn test_both_empty_is_zero() {
        let d = WordOverlap::new();
        assert_eq!(d.distance(&[], &[]), 0.0);
        // Whitespace-only documents have no word types either.
        assert_eq!(d.distance(&["   "], &[""]), 0.0);
    }

    #[test]
    fn test_disjoint_sets_are_one() {
        let d = WordOverlap::new();
        assert_eq!(d.distance(&["apple banana"], &["cherry durian"]), 1.0);
    }

    #[test]
    fn test_partial_overlap() {
        let d = WordOverlap::new();
        // {apple, banana, cherry} vs {apple, banana}: 2 common / 3 total.
        let got = d.distance(&["apple banana", "apple cherry"], &["apple banana"]);
        assert!((got - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_pools_documents_per_side() {
        let d = WordOverlap::new();
        // Each side pools into one bag, so the split across documents
        // must not matter.
        let one = d.distance(&["a b c"], &["a"]);
        let split = d.distance(&["a", "b", "c"], &["a"]);
        assert_eq!(one, split);
    }

    #[test]
    fn test_type_set_ignores_multiplicity() {
        let d = WordOverlap::new();
        let repeated = d.distance(&["a a a a b"], &["a"]);
        let single = d.distance(&["a b"], &["a"]);
        assert_eq!(repeated, single);
    }

    #[test]
    fn test_fn_distance() {
        let d = from_fn(|a: &[&str], b: &[&str]| (a.len() + b.len()) as f64);
        assert_eq!(d.distance(&["x"], &["y", "z"]), 3.0);
    }
}
