//! Result assembly: one exportable row per document.
//!
//! The downstream map renderer wants a flat table — per-document metadata
//! joined with the label at *every* recorded granularity plus one designated
//! default label. This module is deliberately thin: it owns no clustering
//! logic, just the join and a CSV rendering of it.
//!
//! Output columns, in order:
//!
//! ```text
//! arg-id, comment-id, x, y, probability,
//! cluster_level_{K₀}, ..., cluster_level_{floor}, cluster-id
//! ```
//!
//! `cluster_level_{k}` carries the label from `ladder[k]` (finest first);
//! `cluster-id` carries the label from `ladder.select(requested)`.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::ladder::GranularityLadder;

/// Per-document metadata produced by the upstream pipeline.
///
/// `arg_id` is the stable opinion-statement identifier, `comment_id` the
/// source comment it was extracted from, `x`/`y` the 2-D projection
/// coordinates, `probability` the topic-model membership score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMeta {
    /// Stable statement identifier.
    #[serde(rename = "arg-id")]
    pub arg_id: String,
    /// Source comment identifier.
    #[serde(rename = "comment-id")]
    pub comment_id: String,
    /// Projection x coordinate.
    pub x: f64,
    /// Projection y coordinate.
    pub y: f64,
    /// Topic-model membership probability.
    pub probability: f64,
}

/// One assembled output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledRow {
    /// Stable statement identifier.
    #[serde(rename = "arg-id")]
    pub arg_id: String,
    /// Source comment identifier.
    #[serde(rename = "comment-id")]
    pub comment_id: String,
    /// Projection x coordinate.
    pub x: f64,
    /// Projection y coordinate.
    pub y: f64,
    /// Topic-model membership probability.
    pub probability: f64,
    /// Label per recorded granularity, keyed `cluster_level_{count}`.
    #[serde(flatten)]
    pub levels: BTreeMap<String, usize>,
    /// Default label, from the selected granularity.
    #[serde(rename = "cluster-id")]
    pub cluster_id: usize,
}

/// Join metadata with the ladder into one row per document.
///
/// The default `cluster_id` column is filled from
/// [`GranularityLadder::select`] at `requested`, so an aspirational request
/// degrades to the nearest recorded granularity rather than failing.
///
/// # Errors
///
/// Returns [`Error::MetadataMismatch`] if `meta` and the ladder cover
/// different document counts.
pub fn assemble(
    meta: &[DocumentMeta],
    ladder: &GranularityLadder,
    requested: usize,
) -> Result<Vec<AssembledRow>> {
    if meta.len() != ladder.n_documents() {
        return Err(Error::MetadataMismatch {
            rows: meta.len(),
            documents: ladder.n_documents(),
        });
    }

    let default = ladder.select(requested);

    let rows = meta
        .iter()
        .enumerate()
        .map(|(doc, m)| {
            let levels = ladder
                .iter()
                .map(|(count, partition)| {
                    (format!("cluster_level_{count}"), partition.labels()[doc])
                })
                .collect();
            AssembledRow {
                arg_id: m.arg_id.clone(),
                comment_id: m.comment_id.clone(),
                x: m.x,
                y: m.y,
                probability: m.probability,
                levels,
                cluster_id: default.labels()[doc],
            }
        })
        .collect();

    tracing::debug!(
        rows = meta.len(),
        levels = ladder.len(),
        requested,
        selected = default.n_clusters(),
        "assembled result rows"
    );
    Ok(rows)
}

/// Quote a field per RFC 4180 when it contains a delimiter, quote or line
/// break; pass it through untouched otherwise.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Render assembled rows as CSV, level columns finest-first.
///
/// Identifier fields are quoted per RFC 4180 when they contain a comma,
/// quote or line break, so caller-supplied ids cannot misalign the table.
///
/// # Panics
///
/// Panics if the rows do not all carry the same level columns. Rows
/// produced by one [`assemble`] call always do.
pub fn to_csv(rows: &[AssembledRow]) -> String {
    let mut out = String::new();
    let Some(first) = rows.first() else {
        return out;
    };

    // Column order: parse the level number back out of the key so 100 sorts
    // before 99 (string order would not).
    let mut counts: Vec<usize> = first
        .levels
        .keys()
        .filter_map(|k| k.strip_prefix("cluster_level_")?.parse().ok())
        .collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    out.push_str("arg-id,comment-id,x,y,probability");
    for count in &counts {
        let _ = write!(out, ",cluster_level_{count}");
    }
    out.push_str(",cluster-id\n");

    for row in rows {
        let _ = write!(
            out,
            "{},{},{},{},{}",
            csv_field(&row.arg_id),
            csv_field(&row.comment_id),
            row.x,
            row.y,
            row.probability
        );
        for count in &counts {
            let label = row
                .levels
                .get(&format!("cluster_level_{count}"))
                .copied()
                .expect("rows share one set of level columns");
            let _ = write!(out, ",{label}");
        }
        let _ = writeln!(out, ",{}", row.cluster_id);
    }
    out
}
