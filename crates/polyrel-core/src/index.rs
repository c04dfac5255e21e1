//! Index registry: dense node indices and the global edge-type table.
//!
//! Every drug, gene and retained side effect gets a dense zero-based index,
//! assigned in ascending raw-id order so repeated runs over the same input
//! always produce the same index space. Edge types are enumerated in a
//! fixed order (structural types first, then one polypharmacy type per
//! retained side effect) and each entry carries an explicit
//! [`EdgeClass`] tag; nothing downstream may rely on positions alone.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A node type in the heterogeneous graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// Protein / gene node.
    Gene,
    /// Drug node.
    Drug,
}

impl NodeKind {
    /// Short lowercase name, used in log messages and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gene => "gene",
            Self::Drug => "drug",
        }
    }
}

/// Dense index over one node kind (or over feature columns).
///
/// Indices cover exactly `0..len()` with no gaps, in ascending raw-id
/// order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeIndexer {
    ids: Vec<String>,
    #[serde(skip)]
    id_to_idx: HashMap<String, usize>,
}

impl NodeIndexer {
    /// Build an indexer from a set of raw ids.
    pub fn from_ids(ids: &BTreeSet<String>) -> Self {
        let ids: Vec<String> = ids.iter().cloned().collect();
        let id_to_idx = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self { ids, id_to_idx }
    }

    /// Number of indexed ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the indexer is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Dense index of a raw id, if indexed.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.id_to_idx.get(id).copied()
    }

    /// Raw id at a dense index.
    pub fn id_of(&self, idx: usize) -> Option<&str> {
        self.ids.get(idx).map(String::as_str)
    }

    /// Whether a raw id is indexed.
    pub fn contains(&self, id: &str) -> bool {
        self.id_to_idx.contains_key(id)
    }

    /// Iterate raw ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Ensure no raw id is claimed by two node kinds.
///
/// Gene and drug id spaces come from different vocabularies; an overlap
/// means the inputs are mismatched and index lookups would be ambiguous.
pub fn check_disjoint(genes: &BTreeSet<String>, drugs: &BTreeSet<String>) -> Result<()> {
    if let Some(id) = genes.intersection(drugs).next() {
        return Err(Error::Config(format!(
            "id {id:?} appears as both a gene and a drug"
        )));
    }
    Ok(())
}

/// Select the `k` most frequent side effects.
///
/// Ordered by descending co-occurrence count, ties broken by ascending raw
/// id. Side effects past rank `k` are discarded; their drug-pair instances
/// are simply dropped from the drug-drug relation.
pub fn select_top_relations(counts: &BTreeMap<String, usize>, k: usize) -> Result<Vec<String>> {
    if k > counts.len() {
        return Err(Error::Config(format!(
            "requested top {k} side effects but only {} are observed",
            counts.len()
        )));
    }

    let mut ranked: Vec<(&String, usize)> = counts.iter().map(|(id, &c)| (id, c)).collect();
    // BTreeMap iteration is already id-ascending, so a stable sort on the
    // count alone leaves ties in ascending-id order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(ranked.into_iter().take(k).map(|(id, _)| id.clone()).collect())
}

/// Whether an edge type is structural or a per-side-effect relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeClass {
    /// Gene-gene, gene-drug or drug-gene relation.
    Structural,
    /// Drug-drug relation tagged with one side effect.
    Polypharmacy,
}

/// Identity of one relation / adjacency matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeTypeKey {
    /// Row node kind.
    pub src: NodeKind,
    /// Column node kind.
    pub dst: NodeKind,
    /// Relation ordinal within the (src, dst) pair.
    pub ordinal: usize,
}

impl EdgeTypeKey {
    pub fn new(src: NodeKind, dst: NodeKind, ordinal: usize) -> Self {
        Self { src, dst, ordinal }
    }
}

impl std::fmt::Display for EdgeTypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.src.as_str(),
            self.dst.as_str(),
            self.ordinal
        )
    }
}

/// One entry of the global edge-type enumeration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeTypeEntry {
    /// The (src, dst, ordinal) key.
    pub key: EdgeTypeKey,
    /// Structural or polypharmacy.
    pub class: EdgeClass,
    /// For polypharmacy entries, the side-effect id behind the ordinal.
    pub side_effect: Option<String>,
}

/// Deterministic global enumeration of all edge types.
///
/// Structural types come first (gene-gene, gene-drug, drug-gene, each with
/// ordinal 0), followed by one drug-drug type per retained side effect in
/// top-k order. The global index of an entry is stable for a given input
/// and is the id the external minibatch iterator and optimizer exchange
/// with this core.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeTypeTable {
    entries: Vec<EdgeTypeEntry>,
    #[serde(skip)]
    index: HashMap<EdgeTypeKey, usize>,
}

impl EdgeTypeTable {
    /// Build the table from the retained side effects, in top-k order.
    pub fn new(retained_side_effects: &[String]) -> Self {
        let mut entries = vec![
            EdgeTypeEntry {
                key: EdgeTypeKey::new(NodeKind::Gene, NodeKind::Gene, 0),
                class: EdgeClass::Structural,
                side_effect: None,
            },
            EdgeTypeEntry {
                key: EdgeTypeKey::new(NodeKind::Gene, NodeKind::Drug, 0),
                class: EdgeClass::Structural,
                side_effect: None,
            },
            EdgeTypeEntry {
                key: EdgeTypeKey::new(NodeKind::Drug, NodeKind::Gene, 0),
                class: EdgeClass::Structural,
                side_effect: None,
            },
        ];
        for (ordinal, se) in retained_side_effects.iter().enumerate() {
            entries.push(EdgeTypeEntry {
                key: EdgeTypeKey::new(NodeKind::Drug, NodeKind::Drug, ordinal),
                class: EdgeClass::Polypharmacy,
                side_effect: Some(se.clone()),
            });
        }

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key, i))
            .collect();
        Self { entries, index }
    }

    /// Total number of edge types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty (it never is once built).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of polypharmacy (drug-drug) relation types.
    pub fn num_polypharmacy(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.class == EdgeClass::Polypharmacy)
            .count()
    }

    /// Global index of an edge type.
    pub fn global_index(&self, key: &EdgeTypeKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Entry at a global index.
    pub fn entry(&self, global: usize) -> Option<&EdgeTypeEntry> {
        self.entries.get(global)
    }

    /// Entry for an edge-type key.
    pub fn entry_for(&self, key: &EdgeTypeKey) -> Option<&EdgeTypeEntry> {
        self.global_index(key).and_then(|i| self.entry(i))
    }

    /// Iterate entries in global-index order.
    pub fn iter(&self) -> impl Iterator<Item = &EdgeTypeEntry> {
        self.entries.iter()
    }

    /// Side-effect id behind a drug-drug relation ordinal.
    pub fn side_effect_of(&self, ordinal: usize) -> Option<&str> {
        self.entry_for(&EdgeTypeKey::new(NodeKind::Drug, NodeKind::Drug, ordinal))
            .and_then(|e| e.side_effect.as_deref())
    }
}
