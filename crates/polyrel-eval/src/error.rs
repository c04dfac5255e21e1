use polyrel_core::EdgeTypeKey;
use thiserror::Error;

/// Errors that can occur during evaluation or training orchestration.
#[derive(Error, Debug)]
pub enum Error {
    /// Data preparation error from the core crate.
    #[error(transparent)]
    Core(#[from] polyrel_core::Error),

    /// A held-out edge contradicts the true adjacency matrix.
    ///
    /// A "positive" edge whose adjacency entry is 0 (or a "negative" whose
    /// entry is 1) means the held-out split leaked or the index mapping is
    /// inconsistent; any metric computed after the mismatch would be over
    /// corrupted labels.
    #[error(
        "model state violation for edge type {edge_type}: \
         {label} edge ({u}, {v}) has adjacency value {found}"
    )]
    ModelState {
        /// The edge type being evaluated.
        edge_type: EdgeTypeKey,
        /// "positive" or "negative".
        label: &'static str,
        /// Row index of the offending edge.
        u: usize,
        /// Column index of the offending edge.
        v: usize,
        /// The adjacency value actually found.
        found: u8,
    },

    /// A held-out edge references a node index outside the relation's
    /// shape. The external split produced an index that no adjacency or
    /// score matrix entry exists for.
    #[error(
        "{label} edge ({u}, {v}) is out of range for edge type {edge_type} \
         with shape {shape:?}"
    )]
    EdgeIndex {
        /// The edge type being evaluated.
        edge_type: EdgeTypeKey,
        /// "positive" or "negative".
        label: &'static str,
        /// Row index of the offending edge.
        u: usize,
        /// Column index of the offending edge.
        v: usize,
        /// The relation's (rows, cols) shape.
        shape: (usize, usize),
    },

    /// The scorer or iterator referenced an edge type the table does not
    /// contain.
    #[error("unknown edge type: {0}")]
    UnknownEdgeType(EdgeTypeKey),

    /// A score matrix has the wrong shape for its edge type.
    #[error("score matrix for {edge_type} has shape {got:?}, expected {expected:?}")]
    ScoreShape {
        /// The edge type scored.
        edge_type: EdgeTypeKey,
        /// Expected (rows, cols).
        expected: (usize, usize),
        /// Observed (rows, cols).
        got: (usize, usize),
    },

    /// Error raised by the external scorer.
    #[error("scorer error: {0}")]
    Scorer(String),

    /// Error raised by the external optimizer outside a single batch step.
    #[error("optimizer error: {0}")]
    Optimizer(String),

    /// Failed to serialize an evaluation report.
    #[error("report serialization: {0}")]
    Report(#[from] serde_json::Error),
}

/// Result type alias for polyrel-eval.
pub type Result<T> = std::result::Result<T, Error>;
