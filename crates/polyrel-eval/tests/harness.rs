//! Integration tests for the evaluation harness over an assembled graph.

use std::collections::HashMap;

use ndarray::Array2;
use polyrel_core::{
    ComboTable, EdgeTypeKey, GraphData, MonoTable, NodeKind, PpiTable, TargetTable,
};
use polyrel_eval::{Edge, EdgeScorer, Error, Evaluator, HeldOutSplit, Result};

const COMBO: &str = "\
d1,d2,se,name
S1,S2,SE1,nausea
S1,S3,SE1,nausea
S2,S3,SE2,vertigo
S1,S2,SE2,vertigo
";
const PPI: &str = "g1,g2\nG1,G2\nG2,G3\n";
const TARGETS: &str = "d,g\nS1,G1\nS2,G2\nS3,G3\n";
const MONO: &str = "d,se,name\nS1,SE9,headache\nS2,SE8,fatigue\n";

fn load() -> GraphData {
    let combo = ComboTable::from_reader(COMBO.as_bytes()).unwrap();
    let ppi = PpiTable::from_reader(PPI.as_bytes()).unwrap();
    let targets = TargetTable::from_reader(TARGETS.as_bytes()).unwrap();
    let mono = MonoTable::from_reader(MONO.as_bytes()).unwrap();
    GraphData::assemble(&combo, &ppi, &targets, &mono, 2).unwrap()
}

/// Scores every true edge above every non-edge.
struct OracleScorer<'a>(&'a GraphData);

impl EdgeScorer for OracleScorer<'_> {
    fn scores(&self, edge_type: &EdgeTypeKey) -> Result<Array2<f32>> {
        let adj = self
            .0
            .adjacency(edge_type)
            .ok_or(Error::UnknownEdgeType(*edge_type))?;
        let (rows, cols) = adj.shape();
        let mut m = Array2::from_elem((rows, cols), -3.0f32);
        for (r, c) in adj.iter_pairs() {
            m[[r, c]] = 3.0;
        }
        Ok(m)
    }
}

/// Same score for everything.
struct ConstantScorer<'a> {
    graph: &'a GraphData,
    fill: f32,
}

impl EdgeScorer for ConstantScorer<'_> {
    fn scores(&self, edge_type: &EdgeTypeKey) -> Result<Array2<f32>> {
        let adj = self
            .graph
            .adjacency(edge_type)
            .ok_or(Error::UnknownEdgeType(*edge_type))?;
        Ok(Array2::from_elem(adj.shape(), self.fill))
    }
}

#[derive(Default)]
struct EdgeLists {
    positives: HashMap<EdgeTypeKey, Vec<Edge>>,
    negatives: HashMap<EdgeTypeKey, Vec<Edge>>,
}

impl HeldOutSplit for EdgeLists {
    fn positive_edges(&self, edge_type: &EdgeTypeKey) -> &[Edge] {
        self.positives.get(edge_type).map_or(&[], Vec::as_slice)
    }
    fn negative_edges(&self, edge_type: &EdgeTypeKey) -> &[Edge] {
        self.negatives.get(edge_type).map_or(&[], Vec::as_slice)
    }
}

/// A split holding every set entry as positive and every unset pair as
/// negative, for each edge type.
fn exhaustive_split(graph: &GraphData) -> EdgeLists {
    let mut split = EdgeLists::default();
    for entry in graph.edge_types.iter() {
        let adj = graph.adjacency(&entry.key).unwrap();
        let (rows, cols) = adj.shape();
        let self_relation = entry.key.src == entry.key.dst;
        let mut pos = Vec::new();
        let mut neg = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                if adj.get(r, c) == 1 {
                    pos.push((r, c));
                } else if !(self_relation && r == c) {
                    neg.push((r, c));
                }
            }
        }
        split.positives.insert(entry.key, pos);
        split.negatives.insert(entry.key, neg);
    }
    split
}

#[test]
fn oracle_scorer_is_perfect_everywhere() {
    let graph = load();
    let evaluator = Evaluator::new(&graph);
    let split = exhaustive_split(&graph);

    let report = evaluator
        .evaluate_all(&OracleScorer(&graph), &split)
        .unwrap();

    assert_eq!(report.structural.len(), 3);
    assert_eq!(report.polypharmacy.len(), 2);

    for (key, scores) in report.structural.iter().chain(&report.polypharmacy) {
        assert_eq!(scores.auroc, 1.0, "AUROC for {key}");
        assert_eq!(scores.auprc, 1.0, "AUPRC for {key}");
        assert_eq!(scores.ap_at_k, 1.0, "AP@k for {key}");
    }

    let mean = report.polypharmacy_mean();
    assert_eq!(mean.auroc, 1.0);
    assert_eq!(report.auroc_distribution(), vec![1.0, 1.0]);
}

#[test]
fn constant_scorer_sits_at_chance() {
    let graph = load();
    let evaluator = Evaluator::new(&graph);
    let split = exhaustive_split(&graph);

    let scorer = ConstantScorer {
        graph: &graph,
        fill: 0.7,
    };
    let report = evaluator.evaluate_all(&scorer, &split).unwrap();

    for (key, scores) in report.structural.iter().chain(&report.polypharmacy) {
        assert!(
            (scores.auroc - 0.5).abs() < 1e-12,
            "constant scores must give AUROC 0.5 for {key}, got {}",
            scores.auroc
        );

        let n_pos = split.positive_edges(key).len() as f64;
        let n_neg = split.negative_edges(key).len() as f64;
        let prevalence = n_pos / (n_pos + n_neg);
        assert!(
            (scores.auprc - prevalence).abs() < 1e-12,
            "constant scores must give AUPRC {prevalence} for {key}, got {}",
            scores.auprc
        );
    }
}

#[test]
fn empty_negatives_surface_as_nan_in_the_report() {
    let graph = load();
    let evaluator = Evaluator::new(&graph);

    let mut split = exhaustive_split(&graph);
    // Wipe negatives for the second polypharmacy relation only.
    let dd1 = EdgeTypeKey::new(NodeKind::Drug, NodeKind::Drug, 1);
    split.negatives.insert(dd1, Vec::new());

    let report = evaluator
        .evaluate_all(&OracleScorer(&graph), &split)
        .unwrap();

    let (_, degenerate) = report
        .polypharmacy
        .iter()
        .find(|(key, _)| *key == dd1)
        .unwrap();
    assert!(degenerate.auroc.is_nan());

    // The other relation still aggregates normally.
    let mean = report.polypharmacy_mean();
    assert_eq!(mean.auroc, 1.0);
}

#[test]
fn top_k_ordering_decides_relation_ordinals() {
    let graph = load();

    // SE1 and SE2 both occur twice; the tie breaks on ascending id.
    assert_eq!(graph.edge_types.side_effect_of(0), Some("SE1"));
    assert_eq!(graph.edge_types.side_effect_of(1), Some("SE2"));
}

#[test]
fn evaluation_rejects_foreign_edge_types() {
    let graph = load();
    let evaluator = Evaluator::new(&graph);

    let foreign = EdgeTypeKey::new(NodeKind::Drug, NodeKind::Drug, 99);
    let err = evaluator
        .evaluate(&OracleScorer(&graph), &foreign, &[], &[])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownEdgeType(_)));
}
