//! Core data preparation for polypharmacy side-effect prediction.
//!
//! This crate turns four raw interaction tables into a consistent
//! heterogeneous multi-relational graph over two node types:
//!
//! - [`tables`] - normalized in-memory relations loaded from CSV
//!   (drug-drug combinations with side effects, protein-protein
//!   interactions, drug-target bindings, monotherapy side effects)
//! - [`index`] - dense node indices, top-k side-effect selection and the
//!   deterministic global edge-type enumeration
//! - [`sparse`] - the sparse 0/1 matrix backing adjacency and features
//! - [`assemble`] - one-shot construction of all adjacency matrices,
//!   degree vectors and node feature matrices
//!
//! The index space is the contract: with hundreds of drug-drug relation
//! types (one per retained side effect), every matrix, degree vector and
//! held-out edge list must agree on what index means what. All index
//! assignment here is in ascending raw-id order, so the same input always
//! yields the same graph.
//!
//! # Example
//!
//! ```rust
//! use polyrel_core::{ComboTable, GraphData, MonoTable, PpiTable, TargetTable};
//!
//! let combo = ComboTable::from_reader(
//!     "d1,d2,se,name\nS1,S2,SE1,nausea\nS1,S3,SE1,nausea\n".as_bytes(),
//! )?;
//! let ppi = PpiTable::from_reader("g1,g2\nG1,G2\n".as_bytes())?;
//! let targets = TargetTable::from_reader("d,g\nS1,G1\nS2,G2\n".as_bytes())?;
//! let mono = MonoTable::from_reader("d,se,name\nS1,SE9,headache\n".as_bytes())?;
//!
//! let graph = GraphData::assemble(&combo, &ppi, &targets, &mono, 1)?;
//! assert_eq!(graph.n_drugs(), 3);
//! assert_eq!(graph.edge_types.len(), 4);
//! # Ok::<(), polyrel_core::Error>(())
//! ```

pub mod assemble;
mod error;
pub mod index;
pub mod sparse;
pub mod tables;

pub use assemble::{GraphData, GraphStats};
pub use error::{Error, Result};
pub use index::{
    select_top_relations, EdgeClass, EdgeTypeEntry, EdgeTypeKey, EdgeTypeTable, NodeIndexer,
    NodeKind,
};
pub use sparse::SparseBinaryMatrix;
pub use tables::{CategoryTable, ComboTable, MonoTable, PpiTable, TargetTable};
