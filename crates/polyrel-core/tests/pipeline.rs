//! End-to-end pipeline tests: raw tables in, consistent graph out.

use polyrel_core::{
    ComboTable, EdgeTypeKey, GraphData, MonoTable, NodeKind, PpiTable, TargetTable,
};

const COMBO: &str = "\
STITCH 1,STITCH 2,Side Effect,Name
S1,S2,SE1,nausea
S1,S3,SE1,nausea
";
const PPI: &str = "Gene 1,Gene 2\nG1,G2\n";
const TARGETS: &str = "STITCH,Gene\nS1,G1\nS2,G2\n";
const MONO: &str = "STITCH,Side Effect,Name\nS1,SE9,headache\n";

fn load() -> GraphData {
    let combo = ComboTable::from_reader(COMBO.as_bytes()).unwrap();
    let ppi = PpiTable::from_reader(PPI.as_bytes()).unwrap();
    let targets = TargetTable::from_reader(TARGETS.as_bytes()).unwrap();
    let mono = MonoTable::from_reader(MONO.as_bytes()).unwrap();
    GraphData::assemble(&combo, &ppi, &targets, &mono, 1).unwrap()
}

#[test]
fn worked_example_from_raw_tables() {
    let graph = load();

    // Node index spaces.
    let drugs: Vec<_> = graph.drugs.ids().collect();
    assert_eq!(drugs, vec!["S1", "S2", "S3"]);
    let genes: Vec<_> = graph.genes.ids().collect();
    assert_eq!(genes, vec!["G1", "G2"]);

    let s1 = graph.drugs.index_of("S1").unwrap();
    let s2 = graph.drugs.index_of("S2").unwrap();
    let s3 = graph.drugs.index_of("S3").unwrap();
    let g1 = graph.genes.index_of("G1").unwrap();
    let g2 = graph.genes.index_of("G2").unwrap();

    // Drug-drug adjacency for the one retained side effect.
    let dd = graph
        .adjacency(&EdgeTypeKey::new(NodeKind::Drug, NodeKind::Drug, 0))
        .unwrap();
    assert_eq!(dd.get(s1, s2), 1);
    assert_eq!(dd.get(s2, s1), 1);
    assert_eq!(dd.get(s1, s3), 1);
    assert_eq!(dd.get(s3, s1), 1);
    assert_eq!(dd.get(s2, s3), 0);

    // Gene-gene adjacency.
    let gg = graph
        .adjacency(&EdgeTypeKey::new(NodeKind::Gene, NodeKind::Gene, 0))
        .unwrap();
    assert_eq!(gg.get(g1, g2), 1);
    assert_eq!(gg.get(g2, g1), 1);

    // Drug features: a single set column for S1 at the SE9 index,
    // all-zero rows for S2 and S3.
    let se9 = graph.mono_side_effects.index_of("SE9").unwrap();
    assert_eq!(graph.drug_features.get(s1, se9), 1);
    assert!(graph.drug_features.row(s2).is_empty());
    assert!(graph.drug_features.row(s3).is_empty());
    assert_eq!(graph.drug_features.nnz(), 1);

    graph.check_invariants();
}

#[test]
fn transpose_invariant_between_gene_drug_and_drug_gene() {
    let graph = load();

    let gd = graph
        .adjacency(&EdgeTypeKey::new(NodeKind::Gene, NodeKind::Drug, 0))
        .unwrap();
    let dg = graph
        .adjacency(&EdgeTypeKey::new(NodeKind::Drug, NodeKind::Gene, 0))
        .unwrap();

    assert_eq!(gd.shape(), (graph.n_genes(), graph.n_drugs()));
    assert_eq!(dg.shape(), (graph.n_drugs(), graph.n_genes()));
    assert_eq!(&gd.transpose(), dg);
}

#[test]
fn round_trip_through_the_index_mapping() {
    let graph = load();

    // Encode: (S1, S3) reported SE1, which became drug-drug ordinal 0.
    let se = "SE1";
    let ordinal = (0..graph.edge_types.num_polypharmacy())
        .find(|&o| graph.edge_types.side_effect_of(o) == Some(se))
        .unwrap();
    let dd = graph
        .adjacency(&EdgeTypeKey::new(NodeKind::Drug, NodeKind::Drug, ordinal))
        .unwrap();

    // Decode every set entry back through the same indexers.
    let mut decoded: Vec<(String, String, String)> = dd
        .iter_pairs()
        .filter(|&(i, j)| i < j)
        .map(|(i, j)| {
            (
                graph.drugs.id_of(i).unwrap().to_string(),
                graph.drugs.id_of(j).unwrap().to_string(),
                graph.edge_types.side_effect_of(ordinal).unwrap().to_string(),
            )
        })
        .collect();
    decoded.sort();

    assert_eq!(
        decoded,
        vec![
            ("S1".to_string(), "S2".to_string(), "SE1".to_string()),
            ("S1".to_string(), "S3".to_string(), "SE1".to_string()),
        ]
    );
}

#[test]
fn assembly_is_deterministic_across_runs() {
    let first = load();
    let second = load();

    assert_eq!(
        first.drugs.ids().collect::<Vec<_>>(),
        second.drugs.ids().collect::<Vec<_>>()
    );
    assert_eq!(
        first.genes.ids().collect::<Vec<_>>(),
        second.genes.ids().collect::<Vec<_>>()
    );
    for entry in first.edge_types.iter() {
        assert_eq!(
            first.adjacency(&entry.key).unwrap(),
            second.adjacency(&entry.key).unwrap(),
            "adjacency for {} differs between runs",
            entry.key
        );
    }
}

#[test]
fn stats_report_consistent_counts() {
    let graph = load();
    let stats = graph.stats();

    assert_eq!(stats.n_genes, 2);
    assert_eq!(stats.n_drugs, 3);
    assert_eq!(stats.n_edge_types, 4);
    assert_eq!(stats.n_polypharmacy, 1);
    assert_eq!(stats.n_drug_features, 1);
    // gene-gene: 2 directed entries; gene-drug/drug-gene: 2 each;
    // SE1 drug-drug: 4 directed entries.
    assert_eq!(stats.edges_by_type, vec![2, 2, 2, 4]);
}
