//! # grain
//!
//! Multi-granularity document clustering: adjacency-constrained merging that
//! records a full **granularity ladder** instead of a single flat partition.
//!
//! Upstream steps (embedding, fine clustering, 2-D projection, neighbor
//! computation) are external collaborators; `grain` owns the one custom
//! algorithm in the pipeline:
//!
//! ```text
//! initial labels ─┐
//! adjacency ──────┼─▶ LadderBuilder ─▶ GranularityLadder ─▶ select(k)
//! document text ──┘                           │
//!                                             ▼
//!                                 assemble (feature `export`)
//! ```
//!
//! Starting from a fine partition (say 100 small clusters), the builder
//! repeatedly fuses the most similar pair of *geometrically adjacent*
//! clusters and snapshots the labeling at every cluster count on the way
//! down to a floor. Callers then browse the same map at any recorded
//! granularity without re-clustering.
//!
//! ## Quick start
//!
//! ```rust
//! use grain::{Adjacency, LadderBuilder};
//!
//! let docs = ["free buses", "free trams", "bike lanes", "more parks"];
//! let labels = [0, 1, 2, 3];
//! let adjacency = Adjacency::from_pairs([(0, 1), (1, 2), (2, 3)]);
//!
//! let ladder = LadderBuilder::new()
//!     .with_floor(2)
//!     .build(&labels, &adjacency, &docs)
//!     .unwrap();
//!
//! // One labeling per recorded cluster count, finest included.
//! assert_eq!(ladder.levels().collect::<Vec<_>>(), vec![2, 3, 4]);
//! // Requests degrade gracefully to the nearest recorded level.
//! assert_eq!(ladder.select(50).n_clusters(), 4);
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Default | Adds |
//! |---------|---------|------|
//! | `graph` | yes | [`Adjacency::from_graph`] over `petgraph` |
//! | `parallel` | no | rayon scan for the minimum-distance pair |
//! | `export` | no | [`assemble`]: serializable rows + CSV |
//!
//! The distance estimator is a trait seam
//! ([`distance::ClusterDistance`]); the bundled word-overlap heuristic is a
//! placeholder that can be swapped for an embedding- or LLM-scored estimator
//! without touching the merge engine.

pub mod adjacency;
#[cfg(feature = "export")]
pub mod assemble;
pub mod distance;
/// Error types used across `grain`.
pub mod error;
pub mod ladder;
pub mod partition;


pub use adjacency::Adjacency;
pub use distance::{ClusterDistance, FnDistance, WordOverlap};
pub use error::{Error, Result};
pub use ladder::{GranularityLadder, LadderBuilder, DEFAULT_FLOOR};
pub use partition::Partition;

#[cfg(feature = "export")]
pub use assemble::{assemble, to_csv, AssembledRow, DocumentMeta};
