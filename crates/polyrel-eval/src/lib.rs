//! Multi-relation link-prediction evaluation and training orchestration
//! for the polypharmacy side-effect graph.
//!
//! Built on [`polyrel_core`]'s assembled graph, this crate provides:
//!
//! - [`metrics`] - AUROC, AUPRC and AP@k with explicit tie and
//!   degenerate-input handling
//! - [`evaluate`] - the per-relation evaluation harness: an injected
//!   [`EdgeScorer`] capability, adjacency cross-checks that turn held-out
//!   split leakage into a typed fatal error, and aggregation that keeps
//!   structural relations from drowning the side-effect signal
//! - [`train`] - the epoch/batch orchestrator over external model,
//!   optimizer and minibatch-iterator collaborators
//!
//! The evaluation contract is deliberately strict: a "positive" held-out
//! edge whose true adjacency entry is 0 (or the reverse for a negative)
//! aborts the run with [`Error::ModelState`], because every metric
//! computed after such a mismatch would be measuring a corrupted split.
//! Numerical trouble, by contrast, is survivable: non-finite scores are
//! zero-substituted and logged, and a relation with an empty held-out
//! class reports `NaN` instead of failing.
//!
//! # Example
//!
//! ```rust,ignore
//! use polyrel_eval::{Evaluator, Trainer, TrainConfig};
//!
//! let evaluator = Evaluator::new(&graph);
//! let report = evaluator.evaluate_all(&model, minibatch.test_split())?;
//! println!("{}", report.summary());
//!
//! let trainer = Trainer::new(TrainConfig::default().with_epochs(100));
//! trainer.run(&graph, &model, &mut minibatch, &mut optimizer, &mut sink)?;
//! ```

mod error;
pub mod evaluate;
pub mod metrics;
pub mod train;

pub use error::{Error, Result};
pub use evaluate::{Edge, EdgeScorer, EvalReport, Evaluator, HeldOutSplit, RelationScores};
pub use train::{
    publish_report, Batch, MetricSink, MinibatchSource, OptimizerStep, Phase, StepOutcome,
    TrainConfig, Trainer,
};
