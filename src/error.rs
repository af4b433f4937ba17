use core::fmt;

/// Result alias for `grain`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by partition and ladder construction.
///
/// All variants are precondition violations: the builder performs no partial
/// work before returning them. Running out of mergeable adjacency pairs is
/// *not* an error (a partial ladder is a valid result, see
/// [`LadderBuilder`](crate::LadderBuilder)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Label vector and document collection disagree in length.
    LabelCountMismatch {
        /// Number of labels provided.
        labels: usize,
        /// Number of documents provided.
        documents: usize,
    },

    /// Requested floor is below 1.
    InvalidFloor {
        /// Requested floor.
        floor: usize,
    },

    /// Requested floor exceeds the number of initial clusters.
    FloorExceedsClusters {
        /// Requested floor.
        floor: usize,
        /// Number of distinct clusters in the initial partition.
        clusters: usize,
    },

    /// Per-document metadata and ladder disagree in length.
    MetadataMismatch {
        /// Number of metadata rows provided.
        rows: usize,
        /// Number of documents the ladder was built over.
        documents: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::LabelCountMismatch { labels, documents } => {
                write!(f, "{labels} labels for {documents} documents")
            }
            Error::InvalidFloor { floor } => {
                write!(f, "floor must be at least 1, got {floor}")
            }
            Error::FloorExceedsClusters { floor, clusters } => {
                write!(f, "floor {floor} exceeds {clusters} initial clusters")
            }
            Error::MetadataMismatch { rows, documents } => {
                write!(f, "{rows} metadata rows for {documents} documents")
            }
        }
    }
}

impl std::error::Error for Error {}
