//! Loaders for the four raw interaction tables.
//!
//! Each table is a comma-separated file with exactly one header line. The
//! loaders return normalized in-memory relations and know nothing about the
//! other tables; cross-table consistency (index assignment, dropped ids) is
//! handled during assembly.
//!
//! All maps are `BTreeMap`/`BTreeSet` keyed by raw string id, so iteration
//! order is always the sorted-id order and never depends on hash state.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

fn reader_for<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input)
}

fn check_arity(
    table: &'static str,
    record: &csv::StringRecord,
    expected: usize,
) -> Result<()> {
    if record.len() != expected {
        return Err(Error::Parse {
            table,
            line: record.position().map_or(0, csv::Position::line),
            expected,
            got: record.len(),
        });
    }
    Ok(())
}

/// Drug-combination table: `drug1,drug2,side_effect_id,side_effect_name`.
///
/// One row per (drug pair, polypharmacy side effect) observation.
#[derive(Debug, Clone, Default)]
pub struct ComboTable {
    /// Combination key (`"{drug1}_{drug2}"`) to the drug pair.
    pub combo_pairs: BTreeMap<String, (String, String)>,
    /// Combination key to the set of reported side-effect ids.
    pub combo_side_effects: BTreeMap<String, BTreeSet<String>>,
    /// Side-effect id to human-readable name.
    pub side_effect_names: BTreeMap<String, String>,
}

impl ComboTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Self> {
        let mut table = Self::default();
        let mut reader = reader_for(input);

        for record in reader.records() {
            let record = record?;
            check_arity("combo", &record, 4)?;

            let (drug1, drug2, se, se_name) = (&record[0], &record[1], &record[2], &record[3]);
            let combo = format!("{drug1}_{drug2}");
            table
                .combo_pairs
                .insert(combo.clone(), (drug1.to_string(), drug2.to_string()));
            table
                .combo_side_effects
                .entry(combo)
                .or_default()
                .insert(se.to_string());
            table
                .side_effect_names
                .insert(se.to_string(), se_name.to_string());
        }

        info!(
            combinations = table.combo_pairs.len(),
            side_effects = table.side_effect_names.len(),
            interactions = table.interaction_count(),
            drugs = table.drug_ids().len(),
            "loaded drug-combination table"
        );
        Ok(table)
    }

    /// All drug ids appearing in any combination.
    pub fn drug_ids(&self) -> BTreeSet<String> {
        self.combo_pairs
            .values()
            .flat_map(|(a, b)| [a.clone(), b.clone()])
            .collect()
    }

    /// Total number of (pair, side effect) observations.
    pub fn interaction_count(&self) -> usize {
        self.combo_side_effects.values().map(BTreeSet::len).sum()
    }

    /// Co-occurrence count per side effect.
    ///
    /// Each combination contributes each of its side effects once.
    pub fn side_effect_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for se_set in self.combo_side_effects.values() {
            for se in se_set {
                *counts.entry(se.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Protein-protein interaction table: `gene1,gene2`.
///
/// Normalized to an undirected simple graph: self-loops are dropped,
/// duplicate edges collapse, and nodes with no surviving edge are removed.
#[derive(Debug, Clone, Default)]
pub struct PpiTable {
    /// Deduplicated undirected edges as (min-id, max-id) pairs.
    pub edges: Vec<(String, String)>,
    /// Genes incident to at least one surviving edge, sorted.
    pub genes: BTreeSet<String>,
}

impl PpiTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Self> {
        let mut reader = reader_for(input);
        let mut raw_rows = 0usize;
        let mut unique: BTreeSet<(String, String)> = BTreeSet::new();

        for record in reader.records() {
            let record = record?;
            check_arity("ppi", &record, 2)?;
            raw_rows += 1;

            let (a, b) = (&record[0], &record[1]);
            if a == b {
                continue;
            }
            let edge = if a < b {
                (a.to_string(), b.to_string())
            } else {
                (b.to_string(), a.to_string())
            };
            unique.insert(edge);
        }

        let genes: BTreeSet<String> = unique
            .iter()
            .flat_map(|(a, b)| [a.clone(), b.clone()])
            .collect();
        let edges: Vec<(String, String)> = unique.into_iter().collect();

        info!(
            rows = raw_rows,
            edges = edges.len(),
            genes = genes.len(),
            "loaded protein-protein interaction table"
        );
        Ok(Self { edges, genes })
    }
}

/// Drug-target table: `drug,gene`.
#[derive(Debug, Clone, Default)]
pub struct TargetTable {
    /// Drug id to the set of its target gene ids.
    pub drug_targets: BTreeMap<String, BTreeSet<String>>,
}

impl TargetTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Self> {
        let mut table = Self::default();
        let mut reader = reader_for(input);

        for record in reader.records() {
            let record = record?;
            check_arity("targets", &record, 2)?;
            table
                .drug_targets
                .entry(record[0].to_string())
                .or_default()
                .insert(record[1].to_string());
        }

        info!(
            drugs = table.drug_targets.len(),
            associations = table
                .drug_targets
                .values()
                .map(BTreeSet::len)
                .sum::<usize>(),
            "loaded drug-target table"
        );
        Ok(table)
    }
}

/// Monotherapy side-effect table: `drug,side_effect_id,side_effect_name`.
///
/// Side-effect names may contain commas; everything after the second comma
/// is joined back into the name.
#[derive(Debug, Clone, Default)]
pub struct MonoTable {
    /// Drug id to the set of its individual side-effect ids.
    pub drug_side_effects: BTreeMap<String, BTreeSet<String>>,
    /// Side-effect id to human-readable name.
    pub side_effect_names: BTreeMap<String, String>,
}

impl MonoTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Self> {
        let mut table = Self::default();
        let mut reader = reader_for(input);

        for record in reader.records() {
            let record = record?;
            if record.len() < 2 {
                return Err(Error::Parse {
                    table: "mono",
                    line: record.position().map_or(0, csv::Position::line),
                    expected: 3,
                    got: record.len(),
                });
            }

            let (drug, se) = (&record[0], &record[1]);
            let name = record.iter().skip(2).collect::<Vec<_>>().join(",");
            table
                .drug_side_effects
                .entry(drug.to_string())
                .or_default()
                .insert(se.to_string());
            table.side_effect_names.insert(se.to_string(), name);
        }

        info!(
            drugs = table.drug_side_effects.len(),
            side_effects = table.side_effect_names.len(),
            observations = table
                .drug_side_effects
                .values()
                .map(BTreeSet::len)
                .sum::<usize>(),
            "loaded monotherapy side-effect table"
        );
        Ok(table)
    }

    /// All distinct monotherapy side-effect ids, sorted.
    pub fn side_effect_ids(&self) -> BTreeSet<String> {
        self.side_effect_names.keys().cloned().collect()
    }
}

/// Side-effect category table: `side_effect_id,name,disease_class`.
///
/// Not consumed by graph assembly; exposed for downstream per-class
/// breakdowns of evaluation results.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    /// Side-effect id to disease class.
    pub classes: BTreeMap<String, String>,
    /// Side-effect id to name.
    pub names: BTreeMap<String, String>,
}

impl CategoryTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Self> {
        let mut table = Self::default();
        let mut reader = reader_for(input);

        for record in reader.records() {
            let record = record?;
            check_arity("categories", &record, 3)?;
            table
                .classes
                .insert(record[0].to_string(), record[2].to_string());
            table
                .names
                .insert(record[0].to_string(), record[1].to_string());
        }

        info!(
            side_effects = table.names.len(),
            classes = table
                .classes
                .values()
                .collect::<BTreeSet<_>>()
                .len(),
            "loaded side-effect category table"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMBO: &str = "\
STITCH 1,STITCH 2,Polypharmacy Side Effect,Side Effect Name
S1,S2,SE1,nausea
S1,S2,SE2,vertigo
S1,S3,SE1,nausea
";

    #[test]
    fn combo_table_groups_side_effects_per_pair() {
        let table = ComboTable::from_reader(COMBO.as_bytes()).unwrap();

        assert_eq!(table.combo_pairs.len(), 2);
        assert_eq!(
            table.combo_pairs["S1_S2"],
            ("S1".to_string(), "S2".to_string())
        );
        assert_eq!(table.combo_side_effects["S1_S2"].len(), 2);
        assert_eq!(table.side_effect_names["SE1"], "nausea");
        assert_eq!(table.interaction_count(), 3);

        let drugs: Vec<_> = table.drug_ids().into_iter().collect();
        assert_eq!(drugs, vec!["S1", "S2", "S3"]);
    }

    #[test]
    fn combo_counts_each_pair_once_per_side_effect() {
        let table = ComboTable::from_reader(COMBO.as_bytes()).unwrap();
        let counts = table.side_effect_counts();
        assert_eq!(counts["SE1"], 2);
        assert_eq!(counts["SE2"], 1);
    }

    #[test]
    fn combo_table_rejects_short_rows() {
        let bad = "h1,h2,h3,h4\nS1,S2,SE1\n";
        let err = ComboTable::from_reader(bad.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse {
                table: "combo",
                expected: 4,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn ppi_table_drops_self_loops_and_isolates() {
        let csv = "Gene 1,Gene 2\nG1,G2\nG3,G3\nG2,G1\n";
        let table = PpiTable::from_reader(csv.as_bytes()).unwrap();

        // G3 only appeared in a self-loop, so it is gone entirely.
        assert_eq!(table.edges, vec![("G1".to_string(), "G2".to_string())]);
        assert!(!table.genes.contains("G3"));
        assert_eq!(table.genes.len(), 2);
    }

    #[test]
    fn target_table_groups_by_drug() {
        let csv = "STITCH,Gene\nS1,G1\nS1,G2\nS2,G1\n";
        let table = TargetTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.drug_targets["S1"].len(), 2);
        assert_eq!(table.drug_targets["S2"].len(), 1);
    }

    #[test]
    fn mono_table_rejoins_comma_names() {
        let csv = "STITCH,Side Effect,Name\nS1,SE9,\"headache\"\nS1,SE10,pain, severe\n";
        let table = MonoTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.side_effect_names["SE10"], "pain, severe");
        assert_eq!(table.drug_side_effects["S1"].len(), 2);
    }

    #[test]
    fn category_table_parses() {
        let csv = "Side Effect,Name,Class\nSE1,nausea,gastro\nSE2,vertigo,neuro\n";
        let table = CategoryTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.classes["SE1"], "gastro");
        assert_eq!(table.names["SE2"], "vertigo");
    }
}
