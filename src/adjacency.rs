//! Adjacency relations over initial clusters.
//!
//! The merge engine never considers arbitrary cluster pairs: only pairs that
//! are geometric neighbors in the embedding projection are eligible to merge.
//! Upstream pipelines typically derive this relation from a Voronoi diagram
//! over cluster centers (two clusters are adjacent when their cells share a
//! ridge); this module accepts that relation as-is and also offers two
//! in-crate bridges:
//!
//! - [`Adjacency::from_graph`] (feature `graph`): reuse a
//!   `petgraph::UnGraph` whose node indices are cluster ids.
//! - [`Adjacency::from_centers`]: brute-force k-nearest-neighbor over 2-D
//!   cluster centers, a cheap stand-in when no Voronoi computation is
//!   available. For the typical 100-ish initial clusters O(n²) is fine.
//!
//! # Ordering is part of the contract
//!
//! The pair enumeration order is fixed at construction time and doubles as
//! the deterministic tie-break order for the merge loop: when two live pairs
//! score the same distance, the first-enumerated pair wins. Constructors
//! therefore preserve insertion order while deduplicating, and both bridges
//! produce a reproducible order from their inputs.

use std::collections::HashSet;

use crate::error::{Error, Result};

#[cfg(feature = "graph")]
use petgraph::graph::UnGraph;
#[cfg(feature = "graph")]
use petgraph::visit::EdgeRef;

/// An ordered, deduplicated set of unordered cluster-id pairs.
///
/// Symmetric and irreflexive: `(a, b)` and `(b, a)` are the same pair, every
/// stored pair is normalized to `(low, high)`, and self-pairs are dropped at
/// construction. Normalization makes the merge convention uniform — the
/// lower id of a pair is always the absorbing side. The relation is fixed
/// for the lifetime of one merge run; pairs whose endpoints have been
/// absorbed are skipped by the builder, never removed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    pairs: Vec<(usize, usize)>,
}

impl Adjacency {
    /// Build from raw pairs, preserving first-encountered order.
    ///
    /// Each pair is normalized to `(low, high)`; self-pairs are skipped, and
    /// a pair equal (up to orientation) to an earlier one is skipped too.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut kept = Vec::new();
        for (a, b) in pairs {
            if a == b {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            if seen.insert(key) {
                kept.push(key);
            }
        }
        Self { pairs: kept }
    }

    /// Build from the edges of an undirected graph.
    ///
    /// Node indices are taken as cluster ids; edge weights are ignored (the
    /// merge loop re-scores pairs with its own distance estimator). Edge
    /// iteration order is petgraph's insertion order, so the result is
    /// reproducible for a given construction sequence.
    #[cfg(feature = "graph")]
    pub fn from_graph<N, E>(graph: &UnGraph<N, E>) -> Self {
        Self::from_pairs(
            graph
                .edge_references()
                .map(|e| (e.source().index(), e.target().index())),
        )
    }

    /// Build by connecting each 2-D cluster center to its `k` nearest peers.
    ///
    /// Cluster ids are the center indices. Neighbors are ranked by squared
    /// Euclidean distance with index as the secondary key, so the output
    /// order is fully determined by the input. Pairs are normalized to
    /// `(low, high)` before deduplication.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if `centers` is empty.
    pub fn from_centers(centers: &[[f64; 2]], k: usize) -> Result<Self> {
        if centers.is_empty() {
            return Err(Error::EmptyInput);
        }

        let n = centers.len();
        let k = k.min(n - 1);

        let mut pairs = Vec::with_capacity(n * k);
        for (i, ci) in centers.iter().enumerate() {
            let mut ranked: Vec<(f64, usize)> = centers
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, cj)| {
                    let dx = ci[0] - cj[0];
                    let dy = ci[1] - cj[1];
                    (dx * dx + dy * dy, j)
                })
                .collect();
            ranked.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            for &(_, j) in ranked.iter().take(k) {
                pairs.push(if i < j { (i, j) } else { (j, i) });
            }
        }

        let adjacency = Self::from_pairs(pairs);
        tracing::debug!(
            centers = n,
            k,
            pairs = adjacency.len(),
            "built kNN adjacency from cluster centers"
        );
        Ok(adjacency)
    }

    /// The pairs in enumeration (tie-break) order.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the relation is empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
