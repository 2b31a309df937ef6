//! IUPHAR / Guide to Pharmacology tables.
//!
//! The compiled downloads (`iuphar_compiled`) carry targets, ligands and
//! interactions. Free-text function notes and structural counts only exist in
//! the full database dump (`iuphar`), keyed by the dump's `object_id`, which
//! is the same id as the compiled `target_id`.

use std::collections::HashSet;

use super::{Inputs, columns, flag, normalize_hgnc, to_transaction};
use crate::error::DaedalusError;
use crate::table::Table;

pub const TARGETS: &str = "targets+families";
pub const LIGANDS: &str = "ligands";
pub const INTERACTIONS: &str = "interactions";

pub fn targets(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let targets = inputs.frame("iuphar_casted", TARGETS)?;
    let target_id = targets.require("target_id")?;
    let target_name = targets.require("target_name")?;
    let target_type = targets.require("type")?;
    let family_id = targets.require("family_id")?;
    let family_name = targets.require("family_name")?;
    let hgnc = targets.require("hgnc_id")?;

    let mut table = Table::new(columns(&[
        "target_id",
        "target_name",
        "target_type",
        "family_id",
        "family_name",
        "hugo_gene_id",
    ]));
    for row in targets.rows() {
        let Some(id) = &row[target_id] else { continue };
        // Multi-gene targets list their HGNC ids separated by `|`.
        let genes = row[hgnc]
            .as_deref()
            .map(|ids| ids.split('|').filter_map(normalize_hgnc).collect::<Vec<_>>())
            .unwrap_or_default();
        let genes = if genes.is_empty() { vec![None] } else { genes.into_iter().map(Some).collect() };
        for gene in genes {
            table.push_row(vec![
                Some(id.clone()),
                row[target_name].as_deref().map(strip_html),
                row[target_type].clone(),
                row[family_id].clone(),
                row[family_name].as_deref().map(strip_html),
                gene,
            ])?;
        }
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "iuphar_targets"))
}

pub fn ligands(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let ligands = inputs.frame("iuphar_casted", LIGANDS)?;
    let id = ligands.require("ligand_id")?;
    let name = ligands.require("name")?;
    let kind = ligands.require("type")?;
    let approved = ligands.require("approved")?;

    let mut table = Table::new(columns(&["ligand_id", "ligand_name", "ligand_type", "is_approved"]));
    for row in ligands.rows() {
        let Some(ligand) = &row[id] else { continue };
        table.push_row(vec![
            Some(ligand.clone()),
            row[name].as_deref().map(strip_html),
            row[kind].clone(),
            Some(flag(row[approved].as_deref())),
        ])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "iuphar_ligands"))
}

pub fn interactions(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let human = inputs
        .frame("iuphar_casted", INTERACTIONS)?
        .filter_by("target_species", |species| species == Some("Human"))?;
    let mut table = human.select(&[
        ("target_id", "target_id"),
        ("ligand_id", "ligand_id"),
        ("type", "interaction_type"),
        ("action", "action"),
        ("primary_target", "is_primary_target"),
        ("affinity_units", "affinity_units"),
        ("affinity_median", "affinity_median"),
    ])?;
    table.drop_missing(&["target_id", "ligand_id"])?;
    table.map_column("is_primary_target", |value| Some(flag(Some(value))))?;
    table.drop_duplicates();
    Ok(to_transaction(&table, "iuphar_interaction"))
}

pub fn function(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let objects = inputs.frame("iuphar", "object")?;
    let mut table = objects.select(&[("object_id", "target_id"), ("comments", "function_description")])?;
    table.map_column("function_description", |text| {
        let clean = strip_html(text);
        (!clean.is_empty()).then_some(clean)
    })?;
    table.drop_missing(&["target_id", "function_description"])?;
    Ok(to_transaction(&table, "target_function"))
}

pub fn structure(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let species = inputs.frame("iuphar", "species")?;
    let human = species
        .filter_by("name", |name| name == Some("Human"))?
        .distinct("species_id")?
        .into_iter()
        .collect::<HashSet<_>>();

    let info = inputs
        .frame("iuphar", "structural_info")?
        .filter_by("species_id", |id| id.map(|id| human.contains(id)).unwrap_or(false))?;
    let mut table = info.select(&[
        ("object_id", "target_id"),
        ("transmembrane", "transmembrane_domains"),
        ("pore_loops", "pore_loops"),
        ("amino_acids", "amino_acids"),
    ])?;
    table.drop_missing(&["target_id"])?;
    table.drop_duplicates();
    Ok(to_transaction(&table, "target_structure"))
}

/// Removes markup tags such as `<i>` and `<sub>` from IUPHAR text fields.
pub(crate) fn strip_html(text: &str) -> String {
    let mut clean = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => clean.push(ch),
            _ => {}
        }
    }
    clean.trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::table::Dataset;

    fn frame(names: &[&str], rows: Vec<Vec<Option<&str>>>) -> Table {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.map(str::to_string)).collect())
            .collect();
        Table::from_rows(columns(names), rows).unwrap()
    }

    #[test]
    fn multi_gene_targets_expand() {
        let targets_frame = frame(
            &["type", "family_id", "family_name", "target_id", "target_name", "hgnc_id"],
            vec![vec![
                Some("lgic"),
                Some("76"),
                Some("GABA<sub>A</sub> receptors"),
                Some("404"),
                Some("&alpha;1"),
                Some("4075|4076"),
            ]],
        );
        let casted = Dataset::Frames(BTreeMap::from([(TARGETS.to_string(), targets_frame)]));
        let mut inputs = Inputs::new().with("iuphar_casted", casted);
        let statements = targets(&mut inputs).unwrap();
        assert!(statements[0].contains("'GABAA receptors', 'HGNC:4075'"));
        assert!(statements[0].contains("'HGNC:4076'"));
    }

    #[test]
    fn structure_keeps_human_entries_only() {
        let species = frame(
            &["species_id", "name"],
            vec![vec![Some("1"), Some("Human")], vec![Some("2"), Some("Mouse")]],
        );
        let info = frame(
            &["object_id", "species_id", "transmembrane", "amino_acids", "pore_loops"],
            vec![
                vec![Some("383"), Some("1"), Some("2"), Some("490"), Some("1")],
                vec![Some("383"), Some("2"), Some("2"), Some("491"), Some("1")],
            ],
        );
        let dump = Dataset::Frames(BTreeMap::from([
            ("species".to_string(), species),
            ("structural_info".to_string(), info),
        ]));
        let mut inputs = Inputs::new().with("iuphar", dump);
        let statements = structure(&mut inputs).unwrap();
        assert!(statements[0].contains("('383', '2', '1', '490')"));
        assert!(!statements[0].contains("491"));
    }

    #[test]
    fn strips_markup() {
        assert_eq!(strip_html(" K<sub>ir</sub>2.1 "), "Kir2.1");
    }
}
