//! Training-loop orchestration over external collaborators.
//!
//! The model, optimizer and minibatch/negative-sampling iterator are all
//! external; this module only drives the cadence: per epoch, shuffle and
//! drain the iterator, one optimizer step per batch, a cheap validation
//! evaluation of the current batch's relation every N batches, and one
//! expensive full test evaluation per epoch. Evaluating every relation
//! type per batch would dominate the run; the cadence is the backpressure
//! that keeps training throughput acceptable.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use polyrel_core::{EdgeTypeKey, GraphData};

use crate::error::Result;
use crate::evaluate::{EdgeScorer, EvalReport, Evaluator, HeldOutSplit};

/// Which split an evaluation or metric belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Training batches.
    Train,
    /// Periodic single-relation validation.
    Validation,
    /// Per-epoch full test evaluation.
    Test,
}

impl Phase {
    /// Short lowercase name for metric tags.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "val",
            Self::Test => "test",
        }
    }
}

/// One minibatch from the external iterator.
#[derive(Debug, Clone)]
pub struct Batch {
    /// The edge type this batch trains.
    pub edge_type: EdgeTypeKey,
    /// Row-node indices of the batch edges.
    pub rows: Vec<usize>,
    /// Column-node indices of the batch edges.
    pub cols: Vec<usize>,
}

/// Result of one external optimizer step.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    /// Scalar training loss for the batch.
    pub loss: f32,
    /// The edge type the step trained on.
    pub edge_type: EdgeTypeKey,
}

/// External minibatch/negative-sampling iterator.
///
/// Owns the train/validation/test edge splits; the negative sampling
/// policy is its business entirely.
pub trait MinibatchSource {
    /// Re-shuffle for a new epoch.
    fn shuffle(&mut self);
    /// Next batch, or `None` when the epoch is drained.
    fn next_batch(&mut self) -> Option<Batch>;
    /// Held-out validation edges per edge type.
    fn validation_split(&self) -> &dyn HeldOutSplit;
    /// Held-out test edges per edge type.
    fn test_split(&self) -> &dyn HeldOutSplit;
}

/// External optimizer: one max-margin step per batch.
pub trait OptimizerStep {
    /// Consume one batch at the given dropout rate and return the loss.
    fn step(&mut self, batch: &Batch, dropout: f32) -> Result<StepOutcome>;
}

/// Sink for named scalars and value distributions tagged (epoch, phase).
pub trait MetricSink {
    /// Record a scalar value.
    fn scalar(&mut self, name: &str, value: f64, epoch: usize, phase: Phase);
    /// Record a value distribution.
    fn distribution(&mut self, name: &str, values: &[f64], epoch: usize, phase: Phase);
}

/// Training-loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of epochs (default: 100).
    pub epochs: usize,
    /// Dropout rate passed to the optimizer (default: 0.1).
    pub dropout: f32,
    /// Validation evaluation cadence in batches (default: 500).
    pub eval_every: usize,
    /// Cutoff for AP@k (default: 50).
    pub ap_cutoff: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            dropout: 0.1,
            eval_every: 500,
            ap_cutoff: 50,
        }
    }
}

impl TrainConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_eval_every(mut self, eval_every: usize) -> Self {
        self.eval_every = eval_every.max(1);
        self
    }

    pub fn with_ap_cutoff(mut self, ap_cutoff: usize) -> Self {
        self.ap_cutoff = ap_cutoff;
        self
    }
}

/// Drives epochs over the external collaborators.
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the configured number of epochs.
    ///
    /// A failed or non-finite optimizer step skips that batch and keeps
    /// the epoch alive; a model-state violation during evaluation aborts
    /// the run.
    pub fn run<S, M, O, K>(
        &self,
        graph: &GraphData,
        scorer: &S,
        minibatch: &mut M,
        optimizer: &mut O,
        sink: &mut K,
    ) -> Result<()>
    where
        S: EdgeScorer,
        M: MinibatchSource,
        O: OptimizerStep,
        K: MetricSink,
    {
        let evaluator = Evaluator::new(graph).with_ap_cutoff(self.config.ap_cutoff);
        // The builder clamps, but the field is public.
        let eval_every = self.config.eval_every.max(1);

        for epoch in 0..self.config.epochs {
            minibatch.shuffle();
            let mut itr = 0usize;

            while let Some(batch) = minibatch.next_batch() {
                let loss = match optimizer.step(&batch, self.config.dropout) {
                    Ok(outcome) if outcome.loss.is_finite() => Some(outcome.loss),
                    Ok(outcome) => {
                        warn!(
                            epoch,
                            itr,
                            edge_type = %outcome.edge_type,
                            loss = outcome.loss,
                            "non-finite loss, skipping batch"
                        );
                        None
                    }
                    Err(err) => {
                        warn!(epoch, itr, %err, "optimizer step failed, skipping batch");
                        None
                    }
                };

                if itr % eval_every == 0 {
                    let split = minibatch.validation_split();
                    let scores = evaluator.evaluate(
                        scorer,
                        &batch.edge_type,
                        split.positive_edges(&batch.edge_type),
                        split.negative_edges(&batch.edge_type),
                    )?;
                    if let Some(loss) = loss {
                        sink.scalar("train_loss", f64::from(loss), epoch, Phase::Train);
                    }
                    sink.scalar("val_auroc", scores.auroc, epoch, Phase::Validation);
                    sink.scalar("val_auprc", scores.auprc, epoch, Phase::Validation);
                    sink.scalar("val_apk", scores.ap_at_k, epoch, Phase::Validation);
                    info!(
                        epoch,
                        itr,
                        edge_type = %batch.edge_type,
                        loss = loss.unwrap_or(f32::NAN),
                        val_auroc = scores.auroc,
                        val_auprc = scores.auprc,
                        val_apk = scores.ap_at_k,
                        "validation"
                    );
                }

                if itr == 0 {
                    let report = evaluator.evaluate_all(scorer, minibatch.test_split())?;
                    info!(epoch, summary = report.summary(), "test evaluation");
                    publish_report(graph, sink, &report, epoch, Phase::Test);
                }

                itr += 1;
            }
        }

        info!(epochs = self.config.epochs, "optimization finished");
        Ok(())
    }
}

/// Push a full evaluation report into the metric sink.
///
/// Structural relations are published individually under their global
/// edge-type index; polypharmacy relations as pooled means plus the full
/// per-relation distributions.
pub fn publish_report<K: MetricSink>(
    graph: &GraphData,
    sink: &mut K,
    report: &EvalReport,
    epoch: usize,
    phase: Phase,
) {
    for (key, scores) in &report.structural {
        let Some(global) = graph.edge_types.global_index(key) else {
            warn!(%key, "report entry for an edge type outside the table, skipping");
            continue;
        };
        sink.scalar(&format!("edge_{global:04}_auroc"), scores.auroc, epoch, phase);
        sink.scalar(&format!("edge_{global:04}_auprc"), scores.auprc, epoch, phase);
        sink.scalar(&format!("edge_{global:04}_apk"), scores.ap_at_k, epoch, phase);
    }

    let mean = report.polypharmacy_mean();
    sink.scalar("side_effect_auroc_mean", mean.auroc, epoch, phase);
    sink.scalar("side_effect_auprc_mean", mean.auprc, epoch, phase);
    sink.scalar("side_effect_apk_mean", mean.ap_at_k, epoch, phase);

    sink.distribution("side_effect_auroc", &report.auroc_distribution(), epoch, phase);
    sink.distribution("side_effect_auprc", &report.auprc_distribution(), epoch, phase);
    sink.distribution("side_effect_apk", &report.apk_distribution(), epoch, phase);
}
