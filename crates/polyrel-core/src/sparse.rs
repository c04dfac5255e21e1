//! Sparse 0/1 matrices for adjacency and node features.
//!
//! Stored row-major with sorted column lists: cheap to build from
//! (row, col) pairs, O(log d) entry lookup for the evaluation harness'
//! adjacency cross-checks, and direct column sums for the degree vectors
//! consumed by degree-biased negative sampling.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A sparse binary matrix. Present entries are 1, absent entries are 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseBinaryMatrix {
    n_rows: usize,
    n_cols: usize,
    /// Sorted, deduplicated column indices per row.
    rows: Vec<Vec<usize>>,
}

impl SparseBinaryMatrix {
    /// Create an all-zero matrix.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: vec![Vec::new(); n_rows],
        }
    }

    /// Build from (row, col) coordinate pairs. Duplicates collapse.
    ///
    /// Out-of-range coordinates panic: indices come from a [`NodeIndexer`]
    /// over the same input, so a bad pair is a construction bug, not data.
    ///
    /// [`NodeIndexer`]: crate::index::NodeIndexer
    pub fn from_pairs(
        n_rows: usize,
        n_cols: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        let mut matrix = Self::zeros(n_rows, n_cols);
        for (r, c) in pairs {
            assert!(
                r < n_rows && c < n_cols,
                "entry ({r}, {c}) outside {n_rows}x{n_cols} matrix"
            );
            matrix.rows[r].push(c);
        }
        for row in &mut matrix.rows {
            row.sort_unstable();
            row.dedup();
        }
        matrix
    }

    /// The identity matrix (featureless one-hot node features).
    pub fn identity(n: usize) -> Self {
        Self {
            n_rows: n,
            n_cols: n,
            rows: (0..n).map(|i| vec![i]).collect(),
        }
    }

    /// (rows, cols) shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of set entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Entry value: 1 if set, 0 otherwise.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        u8::from(
            self.rows
                .get(row)
                .is_some_and(|r| r.binary_search(&col).is_ok()),
        )
    }

    /// Iterate set (row, col) coordinates in row-major order.
    pub fn iter_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(r, cols)| cols.iter().map(move |&c| (r, c)))
    }

    /// Column indices set in one row.
    pub fn row(&self, row: usize) -> &[usize] {
        &self.rows[row]
    }

    /// The exact transpose.
    pub fn transpose(&self) -> Self {
        let mut rows = vec![Vec::new(); self.n_cols];
        for (r, c) in self.iter_pairs() {
            rows[c].push(r);
        }
        // Row-major iteration emits each target row's entries in ascending
        // order already, so no re-sort is needed.
        Self {
            n_rows: self.n_cols,
            n_cols: self.n_rows,
            rows,
        }
    }

    /// Column sums as a dense vector of length `n_cols`.
    pub fn col_degrees(&self) -> Array1<f32> {
        let mut degrees = Array1::zeros(self.n_cols);
        for (_, c) in self.iter_pairs() {
            degrees[c] += 1.0;
        }
        degrees
    }

    /// Whether the matrix is square and equal to its transpose.
    pub fn is_symmetric(&self) -> bool {
        self.n_rows == self.n_cols
            && self
                .iter_pairs()
                .all(|(r, c)| self.get(c, r) == 1)
    }
}
