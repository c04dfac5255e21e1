//! Graph assembly: one pass from loaded tables to the immutable set of
//! adjacency matrices, degree vectors and node feature matrices.
//!
//! Everything built here is read-only for the rest of the process; the
//! evaluation harness and the external minibatch iterator only ever borrow
//! it.

use std::collections::HashMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::index::{
    check_disjoint, select_top_relations, EdgeClass, EdgeTypeKey, EdgeTypeTable, NodeIndexer,
    NodeKind,
};
use crate::sparse::SparseBinaryMatrix;
use crate::tables::{ComboTable, MonoTable, PpiTable, TargetTable};

/// Summary counts for an assembled graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of gene nodes.
    pub n_genes: usize,
    /// Number of drug nodes.
    pub n_drugs: usize,
    /// Number of edge types (structural + polypharmacy).
    pub n_edge_types: usize,
    /// Number of drug-drug relation types.
    pub n_polypharmacy: usize,
    /// Drug feature dimension (distinct monotherapy side effects).
    pub n_drug_features: usize,
    /// Set entries per edge type, in global-index order.
    pub edges_by_type: Vec<usize>,
}

/// The assembled multi-relational graph.
///
/// Holds the node indexers, the edge-type table and one sparse adjacency
/// matrix per edge type, all in a mutually consistent index space. Built
/// once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct GraphData {
    /// Gene index space.
    pub genes: NodeIndexer,
    /// Drug index space.
    pub drugs: NodeIndexer,
    /// Monotherapy side-effect index space (drug feature columns).
    pub mono_side_effects: NodeIndexer,
    /// Global edge-type enumeration.
    pub edge_types: EdgeTypeTable,
    /// Adjacency matrices in global edge-type index order.
    adjacency: Vec<SparseBinaryMatrix>,
    /// Gene degree vectors, one per gene-side relation ordinal.
    gene_degrees: Vec<Array1<f32>>,
    /// Drug degree vectors, one per drug-drug relation ordinal.
    drug_degrees: Vec<Array1<f32>>,
    /// Identity features for genes.
    pub gene_features: SparseBinaryMatrix,
    /// Multi-hot monotherapy side-effect features for drugs.
    pub drug_features: SparseBinaryMatrix,
}

impl GraphData {
    /// Assemble the graph from the loaded tables.
    ///
    /// `top_k` selects how many of the most frequent polypharmacy side
    /// effects become drug-drug relation types; the rest are dropped.
    pub fn assemble(
        combo: &ComboTable,
        ppi: &PpiTable,
        targets: &TargetTable,
        mono: &MonoTable,
        top_k: usize,
    ) -> Result<Self> {
        let gene_ids = &ppi.genes;
        let drug_ids = combo.drug_ids();
        check_disjoint(gene_ids, &drug_ids)?;

        let genes = NodeIndexer::from_ids(gene_ids);
        let drugs = NodeIndexer::from_ids(&drug_ids);

        let retained = select_top_relations(&combo.side_effect_counts(), top_k)?;
        let edge_types = EdgeTypeTable::new(&retained);
        let se_ordinal: HashMap<&str, usize> = retained
            .iter()
            .enumerate()
            .map(|(i, se)| (se.as_str(), i))
            .collect();

        // Structural adjacency.
        let gene_gene = build_gene_gene(ppi, &genes);
        let gene_drug = build_gene_drug(targets, &genes, &drugs);
        let drug_gene = gene_drug.transpose();

        // One symmetric drug-drug matrix per retained side effect.
        let drug_drug = build_drug_drug(combo, &drugs, &se_ordinal, retained.len());

        let gene_degrees = vec![gene_gene.col_degrees()];
        let drug_degrees: Vec<Array1<f32>> =
            drug_drug.iter().map(SparseBinaryMatrix::col_degrees).collect();

        let mut adjacency = vec![gene_gene, gene_drug, drug_gene];
        adjacency.extend(drug_drug);
        debug_assert_eq!(adjacency.len(), edge_types.len());

        let gene_features = SparseBinaryMatrix::identity(genes.len());
        let mono_side_effects = NodeIndexer::from_ids(&mono.side_effect_ids());
        let drug_features = build_drug_features(mono, &drugs, &mono_side_effects);

        let data = Self {
            genes,
            drugs,
            mono_side_effects,
            edge_types,
            adjacency,
            gene_degrees,
            drug_degrees,
            gene_features,
            drug_features,
        };

        let stats = data.stats();
        info!(
            genes = stats.n_genes,
            drugs = stats.n_drugs,
            edge_types = stats.n_edge_types,
            polypharmacy = stats.n_polypharmacy,
            drug_features = stats.n_drug_features,
            "assembled multi-relational graph"
        );
        Ok(data)
    }

    /// Adjacency matrix for an edge type.
    pub fn adjacency(&self, key: &EdgeTypeKey) -> Option<&SparseBinaryMatrix> {
        self.edge_types
            .global_index(key)
            .map(|i| &self.adjacency[i])
    }

    /// Adjacency matrix at a global edge-type index.
    pub fn adjacency_at(&self, global: usize) -> Option<&SparseBinaryMatrix> {
        self.adjacency.get(global)
    }

    /// Column-sum degree vector for an edge type.
    pub fn degree_vector(&self, key: &EdgeTypeKey) -> Option<Array1<f32>> {
        self.adjacency(key).map(SparseBinaryMatrix::col_degrees)
    }

    /// Degree vectors per relation ordinal for one node kind, used by the
    /// external negative sampler to bias draws toward observed degrees.
    pub fn degrees(&self, kind: NodeKind) -> &[Array1<f32>] {
        match kind {
            NodeKind::Gene => &self.gene_degrees,
            NodeKind::Drug => &self.drug_degrees,
        }
    }

    /// Number of gene nodes.
    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    /// Number of drug nodes.
    pub fn n_drugs(&self) -> usize {
        self.drugs.len()
    }

    /// Summary counts.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            n_genes: self.genes.len(),
            n_drugs: self.drugs.len(),
            n_edge_types: self.edge_types.len(),
            n_polypharmacy: self.edge_types.num_polypharmacy(),
            n_drug_features: self.mono_side_effects.len(),
            edges_by_type: self.adjacency.iter().map(SparseBinaryMatrix::nnz).collect(),
        }
    }

    /// Verify the structural invariants of the assembled matrices.
    ///
    /// Violations panic: they mean assembly itself is broken, which no
    /// caller can recover from.
    pub fn check_invariants(&self) {
        for entry in self.edge_types.iter() {
            let adj = self.adjacency(&entry.key).expect("matrix for every entry");
            let (rows, cols) = adj.shape();
            match (entry.key.src, entry.key.dst) {
                (NodeKind::Gene, NodeKind::Gene) => {
                    assert_eq!(rows, cols, "gene-gene matrix must be square");
                    assert!(adj.is_symmetric(), "gene-gene matrix must be symmetric");
                }
                (NodeKind::Drug, NodeKind::Drug) => {
                    assert_eq!(rows, cols, "drug-drug matrix must be square");
                    assert!(
                        adj.is_symmetric(),
                        "drug-drug matrix for {} must be symmetric",
                        entry.key
                    );
                    assert_eq!(entry.class, EdgeClass::Polypharmacy);
                }
                (NodeKind::Gene, NodeKind::Drug) => {
                    assert_eq!((rows, cols), (self.genes.len(), self.drugs.len()));
                }
                (NodeKind::Drug, NodeKind::Gene) => {
                    assert_eq!((rows, cols), (self.drugs.len(), self.genes.len()));
                }
            }
        }

        let gene_drug = self
            .adjacency(&EdgeTypeKey::new(NodeKind::Gene, NodeKind::Drug, 0))
            .expect("gene-drug matrix");
        let drug_gene = self
            .adjacency(&EdgeTypeKey::new(NodeKind::Drug, NodeKind::Gene, 0))
            .expect("drug-gene matrix");
        assert_eq!(
            &gene_drug.transpose(),
            drug_gene,
            "drug-gene must be the exact transpose of gene-drug"
        );
    }
}

fn build_gene_gene(ppi: &PpiTable, genes: &NodeIndexer) -> SparseBinaryMatrix {
    let n = genes.len();
    let pairs = ppi.edges.iter().flat_map(|(a, b)| {
        let (i, j) = (
            genes.index_of(a).expect("ppi gene indexed"),
            genes.index_of(b).expect("ppi gene indexed"),
        );
        [(i, j), (j, i)]
    });
    SparseBinaryMatrix::from_pairs(n, n, pairs)
}

fn build_gene_drug(
    targets: &TargetTable,
    genes: &NodeIndexer,
    drugs: &NodeIndexer,
) -> SparseBinaryMatrix {
    let mut pairs = Vec::new();
    for (drug, target_genes) in &targets.drug_targets {
        let Some(drug_idx) = drugs.index_of(drug) else {
            debug!(drug, "target row for drug outside the combination table, dropped");
            continue;
        };
        for gene in target_genes {
            match genes.index_of(gene) {
                Some(gene_idx) => pairs.push((gene_idx, drug_idx)),
                // Target proteins outside the interactome carry no
                // structural signal.
                None => debug!(drug, gene, "target gene outside PPI graph, dropped"),
            }
        }
    }
    SparseBinaryMatrix::from_pairs(genes.len(), drugs.len(), pairs)
}

fn build_drug_drug(
    combo: &ComboTable,
    drugs: &NodeIndexer,
    se_ordinal: &HashMap<&str, usize>,
    n_relations: usize,
) -> Vec<SparseBinaryMatrix> {
    let n = drugs.len();
    let mut pairs_per_relation: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n_relations];

    for (combo_key, se_set) in &combo.combo_side_effects {
        let (drug1, drug2) = &combo.combo_pairs[combo_key];
        let i = drugs.index_of(drug1).expect("combo drug indexed");
        let j = drugs.index_of(drug2).expect("combo drug indexed");

        for se in se_set {
            // Side effects outside the top-k are dropped from the relation.
            if let Some(&ordinal) = se_ordinal.get(se.as_str()) {
                pairs_per_relation[ordinal].push((i, j));
                pairs_per_relation[ordinal].push((j, i));
            }
        }
    }

    pairs_per_relation
        .into_iter()
        .map(|pairs| SparseBinaryMatrix::from_pairs(n, n, pairs))
        .collect()
}

fn build_drug_features(
    mono: &MonoTable,
    drugs: &NodeIndexer,
    mono_se: &NodeIndexer,
) -> SparseBinaryMatrix {
    let mut pairs = Vec::new();
    for (drug, se_set) in &mono.drug_side_effects {
        let Some(drug_idx) = drugs.index_of(drug) else {
            debug!(drug, "mono row for drug outside the combination table, dropped");
            continue;
        };
        for se in se_set {
            let se_idx = mono_se.index_of(se).expect("mono side effect indexed");
            pairs.push((drug_idx, se_idx));
        }
    }
    SparseBinaryMatrix::from_pairs(drugs.len(), mono_se.len(), pairs)
}
