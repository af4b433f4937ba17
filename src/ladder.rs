//! The granularity ladder: adjacency-constrained agglomerative merging.
//!
//! Upstream clustering hands us a fine partition of the documents (typically
//! around a hundred small clusters) plus a neighbor relation over those
//! clusters. This module coarsens that partition one merge at a time —
//! always fusing the most similar *adjacent* pair — and records the label
//! assignment at every cluster count visited along the way:
//!
//! ```text
//! K₀ clusters ──merge──▶ K₀−1 ──merge──▶ ... ──merge──▶ floor
//!      │                   │                               │
//!      ▼                   ▼                               ▼
//!  ladder[K₀]         ladder[K₀−1]        ...         ladder[floor]
//! ```
//!
//! The result is a [`GranularityLadder`]: one [`Partition`] per recorded
//! cluster count, from the untouched initial partition down to the configured
//! floor (or the point where the adjacency graph runs out of live pairs,
//! whichever comes first). Callers pick a level with
//! [`GranularityLadder::select`], which degrades gracefully to the nearest
//! recorded granularity instead of failing on an aspirational request.
//!
//! # Why constrain merges to adjacency?
//!
//! Unconstrained agglomerative clustering happily fuses clusters from
//! opposite ends of the map when their word bags happen to overlap. Limiting
//! candidates to geometric neighbors keeps every merged region contiguous in
//! the 2-D projection, which is what makes the rendered map browsable.
//!
//! # Determinism
//!
//! Given the same inputs the ladder is bit-identical across runs, including
//! with the `parallel` feature enabled: the adjacency enumeration order is
//! fixed at construction ([`Adjacency`]), distance ties go to the
//! first-enumerated pair, and the parallel scan reduces over
//! `(distance, enumeration index)` so it cannot reorder ties.

use std::collections::{BTreeMap, HashMap};

use crate::adjacency::Adjacency;
use crate::distance::{ClusterDistance, WordOverlap};
use crate::error::{Error, Result};
use crate::partition::Partition;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default minimum cluster count to merge down to.
pub const DEFAULT_FLOOR: usize = 8;

/// Builder for a [`GranularityLadder`].
///
/// ```rust
/// use grain::{Adjacency, LadderBuilder};
///
/// let docs = ["free buses", "free trams", "bike lanes", "more parks"];
/// let labels = [0, 1, 2, 3];
/// let adjacency = Adjacency::from_pairs([(0, 1), (1, 2), (2, 3)]);
///
/// let ladder = LadderBuilder::new()
///     .with_floor(2)
///     .build(&labels, &adjacency, &docs)
///     .unwrap();
///
/// assert_eq!(ladder.finest(), 4);
/// assert_eq!(ladder.select(2).n_clusters(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct LadderBuilder<D = WordOverlap> {
    floor: usize,
    distance: D,
}

impl LadderBuilder<WordOverlap> {
    /// Create a builder with the default floor and word-overlap distance.
    pub fn new() -> Self {
        Self {
            floor: DEFAULT_FLOOR,
            distance: WordOverlap::new(),
        }
    }
}

impl Default for LadderBuilder<WordOverlap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ClusterDistance> LadderBuilder<D> {
    /// Set the minimum cluster count to merge down to.
    pub fn with_floor(mut self, floor: usize) -> Self {
        self.floor = floor;
        self
    }

    /// Swap the distance estimator.
    ///
    /// The builder only requires a total-order-compatible real-valued
    /// dissimilarity over pairs of document sets; see
    /// [`ClusterDistance`](crate::distance::ClusterDistance).
    pub fn with_distance<D2: ClusterDistance>(self, distance: D2) -> LadderBuilder<D2> {
        LadderBuilder {
            floor: self.floor,
            distance,
        }
    }

    /// Build the ladder from an initial partition, an adjacency relation and
    /// the document texts.
    ///
    /// `labels[i]` is the initial cluster id of `docs[i]`. Adjacency pairs
    /// referencing ids absent from `labels` are tolerated and skipped.
    ///
    /// A merge absorbs a pair's second id into its first; since
    /// [`Adjacency`] normalizes pairs to `(low, high)`, the surviving id of
    /// every merge is the lower-indexed one, and every cluster id at any
    /// recorded level traces back to an id in `labels`.
    ///
    /// Merging stops at the floor, or earlier if no adjacency pair connects
    /// two live clusters; the early stop is a normal result and simply leaves
    /// the ladder without entries below the last reachable count.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] if `docs` is empty.
    /// - [`Error::LabelCountMismatch`] if `labels` and `docs` differ in length.
    /// - [`Error::InvalidFloor`] if the floor is 0.
    /// - [`Error::FloorExceedsClusters`] if the floor exceeds the number of
    ///   distinct initial clusters.
    pub fn build<S>(
        &self,
        labels: &[usize],
        adjacency: &Adjacency,
        docs: &[S],
    ) -> Result<GranularityLadder>
    where
        S: AsRef<str> + Sync,
        D: Sync,
    {
        if docs.is_empty() {
            return Err(Error::EmptyInput);
        }
        if labels.len() != docs.len() {
            return Err(Error::LabelCountMismatch {
                labels: labels.len(),
                documents: docs.len(),
            });
        }
        if self.floor < 1 {
            return Err(Error::InvalidFloor { floor: self.floor });
        }

        // Live cluster id -> document indices, in document order.
        let mut index: HashMap<usize, Vec<usize>> = HashMap::new();
        for (doc, &cluster) in labels.iter().enumerate() {
            index.entry(cluster).or_default().push(doc);
        }

        let initial = index.len();
        if self.floor > initial {
            return Err(Error::FloorExceedsClusters {
                floor: self.floor,
                clusters: initial,
            });
        }

        tracing::debug!(
            documents = docs.len(),
            clusters = initial,
            floor = self.floor,
            pairs = adjacency.len(),
            "building granularity ladder"
        );

        let mut current = labels.to_vec();
        let mut levels = BTreeMap::new();
        levels.insert(initial, Partition::new(current.clone())?);

        let mut live = initial;
        while live > self.floor {
            let Some((into, from, dist)) = self.closest_live_pair(adjacency, &index, docs) else {
                tracing::debug!(
                    live,
                    floor = self.floor,
                    "adjacency graph disconnected before floor; stopping early"
                );
                break;
            };

            tracing::trace!(from, into, distance = dist, remaining = live - 1, "merging");

            // Absorb `from` into `into`: documents move, the absorbed id dies,
            // and the label snapshot is rewritten in place.
            let moved = index.remove(&from).unwrap_or_default();
            index.entry(into).or_default().extend(moved);
            for label in current.iter_mut() {
                if *label == from {
                    *label = into;
                }
            }

            live -= 1;
            levels.insert(live, Partition::new(current.clone())?);
        }

        Ok(GranularityLadder {
            levels,
            n_documents: docs.len(),
        })
    }

    /// Find the live adjacency pair with the smallest distance.
    ///
    /// Returns `(absorbing id, absorbed id, distance)`. Ties resolve to the
    /// first-enumerated pair. `None` when no pair connects two live clusters.
    // The `Sync` bounds let the scan run under the `parallel` feature; the
    // serial scan does not need them but keeping one signature avoids a
    // feature-dependent API.
    fn closest_live_pair<S>(
        &self,
        adjacency: &Adjacency,
        index: &HashMap<usize, Vec<usize>>,
        docs: &[S],
    ) -> Option<(usize, usize, f64)>
    where
        S: AsRef<str> + Sync,
        D: Sync,
    {
        let texts = |cluster: usize| -> Vec<&str> {
            index
                .get(&cluster)
                .map(|members| members.iter().map(|&i| docs[i].as_ref()).collect())
                .unwrap_or_default()
        };

        #[cfg(feature = "parallel")]
        let best = adjacency
            .pairs()
            .par_iter()
            .enumerate()
            .filter(|(_, (c1, c2))| index.contains_key(c1) && index.contains_key(c2))
            .map(|(i, &(c1, c2))| {
                let d = self.distance.distance(&texts(c1), &texts(c2));
                (d, i, c1, c2)
            })
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });

        #[cfg(not(feature = "parallel"))]
        let best = {
            let mut best: Option<(f64, usize, usize, usize)> = None;
            for (i, &(c1, c2)) in adjacency.pairs().iter().enumerate() {
                if !index.contains_key(&c1) || !index.contains_key(&c2) {
                    continue;
                }
                let d = self.distance.distance(&texts(c1), &texts(c2));
                if best.map_or(true, |(bd, ..)| d < bd) {
                    best = Some((d, i, c1, c2));
                }
            }
            best
        };

        best.map(|(d, _, c1, c2)| (c1, c2, d))
    }
}

/// Label assignments at every recorded granularity.
///
/// Keys are cluster counts; `ladder[k]` has exactly `k` distinct cluster ids.
/// Built once per clustering run and then read-only. Always contains at least
/// the initial level.
#[derive(Debug, Clone, PartialEq)]
pub struct GranularityLadder {
    levels: BTreeMap<usize, Partition>,
    n_documents: usize,
}

impl GranularityLadder {
    /// Recorded cluster counts in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.keys().copied()
    }

    /// The partition at exactly `count` clusters, if recorded.
    pub fn at(&self, count: usize) -> Option<&Partition> {
        self.levels.get(&count)
    }

    /// The partition nearest the requested cluster count.
    ///
    /// Exact matches win. Otherwise the recorded count with the smallest
    /// absolute difference from `requested` is used, preferring the coarser
    /// (smaller) side on a tie; requests above the finest level clamp to the
    /// finest, requests below the coarsest clamp to the coarsest. Never
    /// fails: callers may ask for an aspirational count and still get the
    /// closest available map.
    pub fn select(&self, requested: usize) -> &Partition {
        if let Some(exact) = self.levels.get(&requested) {
            return exact;
        }

        let below = self.levels.range(..=requested).next_back();
        let above = self.levels.range(requested..).next();
        let (_, partition) = match (below, above) {
            (Some(b), Some(a)) => {
                // Prefer the coarser level on an exact tie.
                if requested - b.0 <= a.0 - requested {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            // Unreachable: construction always records the initial level.
            (None, None) => unreachable!("ladder contains at least one level"),
        };
        partition
    }

    /// Finest recorded cluster count (the initial partition's).
    pub fn finest(&self) -> usize {
        self.levels.keys().next_back().copied().unwrap_or(0)
    }

    /// Coarsest recorded cluster count.
    ///
    /// Equals the configured floor unless the adjacency graph disconnected
    /// first.
    pub fn coarsest(&self) -> usize {
        self.levels.keys().next().copied().unwrap_or(0)
    }

    /// Number of recorded levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the ladder has no levels. Always `false` for built ladders.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of documents every level covers.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Iterate levels coarsest-first as `(count, partition)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Partition)> {
        self.levels.iter().map(|(&k, p)| (k, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_fixture() -> (Vec<usize>, Adjacency, Vec<&'static str>) {
        // Five clusters A..E over seven documents, adjacent in a chain
        // A-B-C-D, with E isolated. Texts are arranged so merges walk the
        // chain from the far end inward: (C,D) first, then (B,C), then (A,B).
        let docs = vec!["x", "x", "x y z", "y z", "y z", "z", "q"];
        let labels = vec![0, 0, 1, 2, 3, 3, 4];
        let adjacency = Adjacency::from_pairs([(0, 1), (1, 2), (2, 3)]);
        (labels, adjacency, docs)
    }

    #[test]
    fn test_top_of_ladder_is_initial_partition() {
        let (labels, adjacency, docs) = chain_fixture();
        let ladder = LadderBuilder::new()
            .with_floor(2)
            .build(&labels, &adjacency, &docs)
            .unwrap();
        assert_eq!(ladder.at(5).unwrap().labels(), labels.as_slice());
    }

    #[test]
    fn test_merges_walk_down_to_floor() {
        let (labels, adjacency, docs) = chain_fixture();
        let ladder = LadderBuilder::new()
            .with_floor(2)
            .build(&labels, &adjacency, &docs)
            .unwrap();

        let levels: Vec<usize> = ladder.levels().collect();
        assert_eq!(levels, vec![2, 3, 4, 5]);

        for (count, partition) in ladder.iter() {
            assert_eq!(partition.n_clusters(), count);
            assert_eq!(partition.len(), docs.len());
        }

        // First merge fuses clusters 2 and 3 (identical word bags), with the
        // first-enumerated endpoint absorbing.
        assert_eq!(ladder.at(4).unwrap().labels(), &[0, 0, 1, 2, 2, 2, 4]);
        // Bottom level: the whole chain fused into cluster 0, E untouched.
        assert_eq!(ladder.at(2).unwrap().labels(), &[0, 0, 0, 0, 0, 0, 4]);
    }

    #[test]
    fn test_every_level_refines_coarser_ones() {
        let (labels, adjacency, docs) = chain_fixture();
        let ladder = LadderBuilder::new()
            .with_floor(2)
            .build(&labels, &adjacency, &docs)
            .unwrap();

        let levels: Vec<usize> = ladder.levels().collect();
        for (i, &coarse) in levels.iter().enumerate() {
            for &fine in &levels[i..] {
                assert!(
                    ladder.at(fine).unwrap().refines(ladder.at(coarse).unwrap()),
                    "level {fine} does not refine level {coarse}"
                );
            }
        }
    }

    #[test]
    fn test_disconnection_stops_early() {
        // Distances put (A,B) first; absorbing B kills the (B,C) link, and
        // after (C,D) merges nothing live remains. The ladder bottoms out at
        // 3 even though the floor is 2.
        let docs = vec!["x y", "x y z", "p q", "p r", "k"];
        let labels = vec![0, 1, 2, 3, 4];
        let adjacency = Adjacency::from_pairs([(0, 1), (1, 2), (2, 3)]);

        let ladder = LadderBuilder::new()
            .with_floor(2)
            .build(&labels, &adjacency, &docs)
            .unwrap();

        let levels: Vec<usize> = ladder.levels().collect();
        assert_eq!(levels, vec![3, 4, 5]);
        assert_eq!(ladder.coarsest(), 3);
        // Selector degrades to the nearest recorded level.
        assert_eq!(ladder.select(2).n_clusters(), 3);
    }

    #[test]
    fn test_empty_adjacency_records_only_initial_level() {
        let docs = vec!["a", "b", "c", "d", "e"];
        let labels = vec![0, 1, 2, 3, 4];
        let ladder = LadderBuilder::new()
            .with_floor(2)
            .build(&labels, &Adjacency::from_pairs([]), &docs)
            .unwrap();

        assert_eq!(ladder.len(), 1);
        assert_eq!(ladder.finest(), 5);
        assert_eq!(ladder.select(2).labels(), labels.as_slice());
    }

    #[test]
    fn test_floor_equal_to_initial_count() {
        let docs = vec!["a", "b", "c"];
        let labels = vec![0, 1, 2];
        let adjacency = Adjacency::from_pairs([(0, 1), (1, 2)]);
        let ladder = LadderBuilder::new()
            .with_floor(3)
            .build(&labels, &adjacency, &docs)
            .unwrap();

        assert_eq!(ladder.len(), 1);
        assert_eq!(ladder.at(3).unwrap().labels(), labels.as_slice());
    }

    #[test]
    fn test_stale_adjacency_pairs_tolerated() {
        let docs = vec!["a b", "a c", "d"];
        let labels = vec![0, 1, 2];
        // Pairs referencing cluster 9 never existed; they must be skipped.
        let adjacency = Adjacency::from_pairs([(9, 0), (0, 1), (9, 2)]);
        let ladder = LadderBuilder::new()
            .with_floor(2)
            .build(&labels, &adjacency, &docs)
            .unwrap();

        assert_eq!(ladder.coarsest(), 2);
        assert_eq!(ladder.at(2).unwrap().labels(), &[0, 0, 2]);
    }

    #[test]
    fn test_tie_break_prefers_first_enumerated_pair() {
        // All pairwise distances are 1.0 (fully disjoint vocabularies), so
        // the first enumerated pair must merge first, absorbing into its
        // first endpoint.
        let docs = vec!["a", "b", "c", "d"];
        let labels = vec![0, 1, 2, 3];
        let adjacency = Adjacency::from_pairs([(2, 3), (0, 1), (1, 2)]);
        let ladder = LadderBuilder::new()
            .with_floor(3)
            .build(&labels, &adjacency, &docs)
            .unwrap();

        assert_eq!(ladder.at(3).unwrap().labels(), &[0, 1, 2, 2]);
    }

    #[test]
    fn test_document_count_invariant() {
        let (labels, adjacency, docs) = chain_fixture();
        let ladder = LadderBuilder::new()
            .with_floor(2)
            .build(&labels, &adjacency, &docs)
            .unwrap();

        for (_, partition) in ladder.iter() {
            let total: usize = partition.sizes().values().sum();
            assert_eq!(total, docs.len());
        }
    }

    #[test]
    fn test_preconditions() {
        let adjacency = Adjacency::from_pairs([(0, 1)]);
        let builder = LadderBuilder::new().with_floor(1);

        assert_eq!(
            builder.build(&[], &adjacency, &Vec::<&str>::new()),
            Err(Error::EmptyInput)
        );
        assert_eq!(
            builder.build(&[0], &adjacency, &["a", "b"]),
            Err(Error::LabelCountMismatch {
                labels: 1,
                documents: 2
            })
        );
        assert_eq!(
            LadderBuilder::new()
                .with_floor(0)
                .build(&[0, 1], &adjacency, &["a", "b"]),
            Err(Error::InvalidFloor { floor: 0 })
        );
        assert_eq!(
            LadderBuilder::new()
                .with_floor(5)
                .build(&[0, 1], &adjacency, &["a", "b"]),
            Err(Error::FloorExceedsClusters {
                floor: 5,
                clusters: 2
            })
        );
    }

    #[test]
    fn test_custom_distance_estimator() {
        use crate::distance::from_fn;

        // Prefer merging the largest pair of clusters; with equal sizes the
        // enumeration order decides.
        let sizes = from_fn(|a: &[&str], b: &[&str]| 1.0 / (a.len() + b.len()) as f64);

        let docs = vec!["a", "a", "a", "b", "c"];
        let labels = vec![0, 0, 0, 1, 2];
        let adjacency = Adjacency::from_pairs([(1, 2), (0, 1)]);
        let ladder = LadderBuilder::new()
            .with_floor(2)
            .with_distance(sizes)
            .build(&labels, &adjacency, &docs)
            .unwrap();

        // (0,1) scores 1/4 < (1,2)'s 1/2, so cluster 1 is absorbed into 0.
        assert_eq!(ladder.at(2).unwrap().labels(), &[0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_selector_nearest_level() {
        let (labels, adjacency, docs) = chain_fixture();
        let ladder = LadderBuilder::new()
            .with_floor(3)
            .build(&labels, &adjacency, &docs)
            .unwrap();
        // Levels are {3, 4, 5}.

        assert_eq!(ladder.select(4).n_clusters(), 4); // exact
        assert_eq!(ladder.select(100).n_clusters(), 5); // clamp to finest
        assert_eq!(ladder.select(1).n_clusters(), 3); // clamp to coarsest
    }
}
