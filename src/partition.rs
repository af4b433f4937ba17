//! Cluster label assignments over a fixed document set.
//!
//! A [`Partition`] is a total assignment `document index → cluster id`: every
//! document carries exactly one label, and every label that appears has at
//! least one document (no empty clusters can be expressed). Cluster ids are
//! plain `usize` tokens, unique within one partition but **not** stable across
//! granularity levels — a merge relabels the absorbed cluster's documents with
//! the surviving cluster's id.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};

/// A total assignment of documents to clusters.
///
/// Wraps a label vector indexed by document position. Immutable once built;
/// the ladder builder produces a fresh `Partition` snapshot per granularity
/// level rather than mutating recorded ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    labels: Vec<usize>,
}

impl Partition {
    /// Create a partition from a label vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if `labels` is empty.
    pub fn new(labels: Vec<usize>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(Self { labels })
    }

    /// The label vector, indexed by document position.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of documents covered.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the partition covers no documents.
    ///
    /// Always `false` for partitions built via [`Partition::new`]; present
    /// for API completeness.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of the document at `index`, if in range.
    pub fn label_of(&self, index: usize) -> Option<usize> {
        self.labels.get(index).copied()
    }

    /// Number of distinct cluster ids.
    pub fn n_clusters(&self) -> usize {
        self.labels.iter().collect::<BTreeSet<_>>().len()
    }

    /// Distinct cluster ids in ascending order.
    pub fn cluster_ids(&self) -> Vec<usize> {
        let ids: BTreeSet<usize> = self.labels.iter().copied().collect();
        ids.into_iter().collect()
    }

    /// Document indices assigned to `cluster`, in document order.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }

    /// Cluster sizes keyed by cluster id.
    pub fn sizes(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &l in &self.labels {
            *counts.entry(l).or_insert(0) += 1;
        }
        counts
    }

    /// Whether `self` is a refinement of `coarser`.
    ///
    /// True when every cluster of `self` lies entirely inside a single
    /// cluster of `coarser` (equivalently: each coarse cluster is a union of
    /// fine clusters). Partitions over different document counts never refine
    /// each other.
    ///
    /// Adjacent ladder levels always satisfy this: a merge only ever fuses
    /// two fine clusters, it never splits one or moves a document sideways.
    pub fn refines(&self, coarser: &Partition) -> bool {
        if self.labels.len() != coarser.labels.len() {
            return false;
        }
        // fine id -> coarse id it was first seen under
        let mut image: BTreeMap<usize, usize> = BTreeMap::new();
        for (&fine, &coarse) in self.labels.iter().zip(coarser.labels.iter()) {
            match image.get(&fine) {
                Some(&seen) if seen != coarse => return false,
                Some(_) => {}
                None => {
                    image.insert(fine, coarse);
                }
            }
        }
        true
    }
}
