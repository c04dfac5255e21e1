//! Per-relation link-prediction evaluation over held-out edges.
//!
//! The harness scores one relation at a time through an injected
//! [`EdgeScorer`] (the trained model's forward pass restricted to one edge
//! type), cross-checks every held-out edge against the true adjacency
//! matrix, and computes AUROC, AUPRC and AP@k per relation. Results are
//! aggregated by [`EdgeClass`]: structural relations are reported
//! individually, polypharmacy relations are pooled, because the structural
//! relations carry orders of magnitude more edges and would otherwise
//! drown the side-effect signal.

use std::collections::HashSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use polyrel_core::{EdgeClass, EdgeTypeKey, GraphData};

use crate::error::{Error, Result};
use crate::metrics::{apk, auroc, average_precision, rank_by_score};

/// A held-out edge as (row index, column index).
pub type Edge = (usize, usize);

/// Held-out positive and negative edge lists per edge type.
///
/// Implemented by the external minibatch/negative-sampling iterator; the
/// sampling policy itself is outside this crate.
pub trait HeldOutSplit {
    /// Held-out positive edges for an edge type.
    fn positive_edges(&self, edge_type: &EdgeTypeKey) -> &[Edge];
    /// Held-out negative (sampled non-)edges for an edge type.
    fn negative_edges(&self, edge_type: &EdgeTypeKey) -> &[Edge];
}

/// Scoring capability over one relation.
///
/// Supplied by the trained model: a dense score matrix over all
/// (row node, column node) pairs of the edge type. Any batching or
/// parallelism inside the model is opaque to the harness, which only reads
/// individual entries synchronously.
pub trait EdgeScorer {
    /// Raw (pre-sigmoid) scores for every node pair of `edge_type`.
    fn scores(&self, edge_type: &EdgeTypeKey) -> Result<Array2<f32>>;
}

/// Ranking metrics for one relation type.
///
/// All three values are `NaN` for a degenerate relation (no held-out
/// positives or no held-out negatives).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationScores {
    /// Area under the ROC curve.
    pub auroc: f64,
    /// Area under the precision-recall curve.
    pub auprc: f64,
    /// Average precision at the configured cutoff.
    pub ap_at_k: f64,
}

impl RelationScores {
    fn undefined() -> Self {
        Self {
            auroc: f64::NAN,
            auprc: f64::NAN,
            ap_at_k: f64::NAN,
        }
    }

    /// Whether all three metrics are defined.
    pub fn is_defined(&self) -> bool {
        self.auroc.is_finite() && self.auprc.is_finite() && self.ap_at_k.is_finite()
    }
}

/// Evaluation results for one full pass over all edge types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    /// Structural relations, reported individually.
    pub structural: Vec<(EdgeTypeKey, RelationScores)>,
    /// Polypharmacy relations, pooled for aggregation.
    pub polypharmacy: Vec<(EdgeTypeKey, RelationScores)>,
}

impl EvalReport {
    /// Mean scores over polypharmacy relations with defined metrics.
    ///
    /// Degenerate relations stay `NaN` individually but are excluded here
    /// so one empty split cannot erase the aggregate.
    pub fn polypharmacy_mean(&self) -> RelationScores {
        let defined: Vec<&RelationScores> = self
            .polypharmacy
            .iter()
            .map(|(_, s)| s)
            .filter(|s| s.is_defined())
            .collect();
        let undefined = self.polypharmacy.len() - defined.len();
        if undefined > 0 {
            warn!(
                undefined,
                total = self.polypharmacy.len(),
                "excluding relations with undefined metrics from the pooled mean"
            );
        }
        if defined.is_empty() {
            return RelationScores::undefined();
        }

        let n = defined.len() as f64;
        RelationScores {
            auroc: defined.iter().map(|s| s.auroc).sum::<f64>() / n,
            auprc: defined.iter().map(|s| s.auprc).sum::<f64>() / n,
            ap_at_k: defined.iter().map(|s| s.ap_at_k).sum::<f64>() / n,
        }
    }

    /// Per-relation AUROC distribution over polypharmacy types.
    pub fn auroc_distribution(&self) -> Vec<f64> {
        self.polypharmacy.iter().map(|(_, s)| s.auroc).collect()
    }

    /// Per-relation AUPRC distribution over polypharmacy types.
    pub fn auprc_distribution(&self) -> Vec<f64> {
        self.polypharmacy.iter().map(|(_, s)| s.auprc).collect()
    }

    /// Per-relation AP@k distribution over polypharmacy types.
    pub fn apk_distribution(&self) -> Vec<f64> {
        self.polypharmacy.iter().map(|(_, s)| s.ap_at_k).collect()
    }

    /// Serialize the full report as pretty-printed JSON.
    ///
    /// Undefined (`NaN`) metrics serialize as `null`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let mean = self.polypharmacy_mean();
        format!(
            "structural: {} types | side-effect mean: AUROC {:.4} AUPRC {:.4} AP@k {:.4} ({} types)",
            self.structural.len(),
            mean.auroc,
            mean.auprc,
            mean.ap_at_k,
            self.polypharmacy.len()
        )
    }
}

/// Logistic squashing to (0, 1).
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Link-prediction evaluator over an assembled graph.
pub struct Evaluator<'a> {
    graph: &'a GraphData,
    ap_cutoff: usize,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator with the default AP cutoff of 50.
    pub fn new(graph: &'a GraphData) -> Self {
        Self {
            graph,
            ap_cutoff: 50,
        }
    }

    /// Override the AP@k cutoff.
    pub fn with_ap_cutoff(mut self, k: usize) -> Self {
        self.ap_cutoff = k;
        self
    }

    /// Evaluate one relation type over its held-out edges.
    ///
    /// Positive edges are squashed and verified to sit on a set adjacency
    /// entry, negatives on an unset one; a mismatch is a fatal
    /// [`Error::ModelState`], and an edge outside the relation's shape is a
    /// fatal [`Error::EdgeIndex`]. Non-finite scores are replaced with 0
    /// before metric computation. A relation with no positives or no
    /// negatives yields `NaN` metrics.
    pub fn evaluate<S: EdgeScorer>(
        &self,
        scorer: &S,
        edge_type: &EdgeTypeKey,
        positives: &[Edge],
        negatives: &[Edge],
    ) -> Result<RelationScores> {
        let adj = self
            .graph
            .adjacency(edge_type)
            .ok_or(Error::UnknownEdgeType(*edge_type))?;

        let shape = adj.shape();
        let score_matrix = scorer.scores(edge_type)?;
        let got = score_matrix.dim();
        if got != shape {
            return Err(Error::ScoreShape {
                edge_type: *edge_type,
                expected: shape,
                got,
            });
        }

        // Positives first: the AP@k relevant set is their enumeration
        // prefix, and the stable descending sort keeps tied positives ahead
        // of tied negatives.
        let mut scores = Vec::with_capacity(positives.len() + negatives.len());
        let mut labels = Vec::with_capacity(positives.len() + negatives.len());
        for &(u, v) in positives {
            if u >= shape.0 || v >= shape.1 {
                return Err(Error::EdgeIndex {
                    edge_type: *edge_type,
                    label: "positive",
                    u,
                    v,
                    shape,
                });
            }
            let found = adj.get(u, v);
            if found != 1 {
                return Err(Error::ModelState {
                    edge_type: *edge_type,
                    label: "positive",
                    u,
                    v,
                    found,
                });
            }
            scores.push(sigmoid(f64::from(score_matrix[[u, v]])));
            labels.push(true);
        }
        for &(u, v) in negatives {
            if u >= shape.0 || v >= shape.1 {
                return Err(Error::EdgeIndex {
                    edge_type: *edge_type,
                    label: "negative",
                    u,
                    v,
                    shape,
                });
            }
            let found = adj.get(u, v);
            if found != 0 {
                return Err(Error::ModelState {
                    edge_type: *edge_type,
                    label: "negative",
                    u,
                    v,
                    found,
                });
            }
            scores.push(sigmoid(f64::from(score_matrix[[u, v]])));
            labels.push(false);
        }

        if positives.is_empty() || negatives.is_empty() {
            warn!(
                %edge_type,
                positives = positives.len(),
                negatives = negatives.len(),
                "degenerate held-out split, metrics undefined"
            );
            return Ok(RelationScores::undefined());
        }

        let non_finite = scores.iter().filter(|s| !s.is_finite()).count();
        if non_finite > 0 {
            warn!(
                %edge_type,
                non_finite,
                "replacing non-finite scores with 0 before metric computation"
            );
            for s in &mut scores {
                if !s.is_finite() {
                    *s = 0.0;
                }
            }
        }

        let relevant: HashSet<usize> = (0..positives.len()).collect();
        let ranked = rank_by_score(&scores);

        Ok(RelationScores {
            auroc: auroc(&labels, &scores),
            auprc: average_precision(&labels, &scores),
            ap_at_k: apk(&relevant, &ranked, self.ap_cutoff),
        })
    }

    /// Evaluate every edge type in the table and aggregate by class.
    pub fn evaluate_all<S: EdgeScorer>(
        &self,
        scorer: &S,
        split: &dyn HeldOutSplit,
    ) -> Result<EvalReport> {
        let mut structural = Vec::new();
        let mut polypharmacy = Vec::new();

        for entry in self.graph.edge_types.iter() {
            let scores = self.evaluate(
                scorer,
                &entry.key,
                split.positive_edges(&entry.key),
                split.negative_edges(&entry.key),
            )?;
            match entry.class {
                EdgeClass::Structural => structural.push((entry.key, scores)),
                EdgeClass::Polypharmacy => polypharmacy.push((entry.key, scores)),
            }
        }

        Ok(EvalReport {
            structural,
            polypharmacy,
        })
    }
}
