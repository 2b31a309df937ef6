//! Carrier and pump tables drawn from HGNC gene groups.

use std::collections::{HashMap, HashSet};

use super::channels::group_members;
use super::{Inputs, columns, normalize_hgnc, to_transaction};
use crate::error::DaedalusError;
use crate::table::Table;

pub fn aquaporins(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let members = group_members(inputs.dataset("hugo")?, "aquaporins")?;
    let locations = inputs
        .frame("patlas", "subcellular_location")?
        .lookup("gene", "main_location")?;

    let mut table = Table::new(columns(&["ensg", "hugo_gene_id", "main_location"]));
    for (ensg, hgnc) in members {
        let location = locations.get(&ensg).cloned();
        table.push_row(vec![Some(ensg), hgnc, location])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "aquaporins"))
}

pub fn solute_carriers(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let group = inputs.frame("hugo", "solute_carriers")?;
    let ensg = group.require("ensembl_gene_id")?;
    let hgnc = group.require("hgnc_id")?;
    let symbol = group.require("approved_symbol")?;

    let slc = inputs.table("slc")?;
    let gene = slc.require("human_gene_name")?;
    let substrates = slc.require("predominant_substrates")?;
    let transport = slc.require("transport_type")?;
    let mut annotations: HashMap<String, (Option<String>, Option<String>)> = HashMap::new();
    for row in slc.rows() {
        if let Some(name) = row[gene].as_deref().map(clean_symbol) {
            annotations
                .entry(name)
                .or_insert_with(|| (row[substrates].clone(), row[transport].clone()));
        }
    }

    let mut table = Table::new(columns(&[
        "ensg",
        "hugo_gene_id",
        "hugo_gene_symbol",
        "carried_solutes",
        "transport_type",
    ]));
    for row in group.rows() {
        let Some(gene_id) = &row[ensg] else { continue };
        let (solutes, kind) = row[symbol]
            .as_deref()
            .and_then(|name| annotations.get(&clean_symbol(name)))
            .cloned()
            .unwrap_or((None, None));
        table.push_row(vec![
            Some(gene_id.clone()),
            row[hgnc].as_deref().and_then(normalize_hgnc),
            row[symbol].clone(),
            solutes,
            kind,
        ])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "solute_carriers"))
}

/// Members of the HGNC group named by the `group` argument, minus members
/// of the optional `exclude` group, loaded into the table named by `table`.
pub fn hugo_group(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let group = inputs.arg("group")?;
    let target = inputs.arg("table")?;
    let hugo = inputs.dataset("hugo")?;

    let excluded = match inputs.optional_arg("exclude") {
        Some(exclude) => group_members(hugo, exclude)?
            .into_iter()
            .map(|(ensg, _)| ensg)
            .collect::<HashSet<_>>(),
        None => HashSet::new(),
    };

    let frame = hugo.frame(group)?;
    let names = frame.column_index("group_name");
    let ensg = frame.require("ensembl_gene_id")?;
    let hgnc = frame.require("hgnc_id")?;
    let mut table = Table::new(columns(&["ensg", "hugo_gene_id", "group_name"]));
    for row in frame.rows() {
        let Some(gene) = row[ensg].as_deref().map(str::trim).filter(|id| !id.is_empty()) else {
            continue;
        };
        if excluded.contains(gene) {
            continue;
        }
        let name = names.and_then(|i| row[i].clone()).unwrap_or_else(|| group.to_string());
        table.push_row(vec![
            Some(gene.to_string()),
            row[hgnc].as_deref().and_then(normalize_hgnc),
            Some(name),
        ])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, target))
}

/// SLC table cells sometimes carry footnote marks (`SLC2A1*`).
fn clean_symbol(value: &str) -> String {
    value
        .trim()
        .trim_end_matches(|ch: char| !ch.is_ascii_alphanumeric())
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::{frame_of, frames_of};

    fn group(rows: Vec<Vec<Option<&str>>>) -> Table {
        frame_of(&["hgnc_id", "approved_symbol", "ensembl_gene_id", "group_name"], rows)
    }

    #[test]
    fn atp_driven_excludes_aaa_atpases() {
        let hugo = frames_of(vec![
            (
                "atpases",
                group(vec![
                    vec![Some("HGNC:799"), Some("ATP1A1"), Some("ENSG00000163399"), Some("ATPases")],
                    vec![Some("HGNC:9548"), Some("PSMC1"), Some("ENSG00000100764"), Some("ATPases")],
                ]),
            ),
            (
                "AAA_atpases",
                group(vec![vec![Some("HGNC:9548"), Some("PSMC1"), Some("ENSG00000100764"), None]]),
            ),
        ]);
        let mut inputs = Inputs::new()
            .with("hugo", hugo)
            .with_arg("group", "atpases")
            .with_arg("exclude", "AAA_atpases")
            .with_arg("table", "atp_driven_transporters");
        let statements = hugo_group(&mut inputs).unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("INSERT INTO \"atp_driven_transporters\""));
        assert!(statements[0].contains("'ENSG00000163399', 'HGNC:799', 'ATPases'"));
        assert!(!statements[0].contains("ENSG00000100764"));
    }

    #[test]
    fn solute_carriers_pick_up_slc_annotations() {
        let hugo = frames_of(vec![(
            "solute_carriers",
            group(vec![vec![Some("HGNC:11005"), Some("SLC2A1"), Some("ENSG00000117394"), None]]),
        )]);
        let slc = frame_of(
            &["human_gene_name", "predominant_substrates", "transport_type"],
            vec![vec![Some("SLC2A1*"), Some("glucose"), Some("F")]],
        );
        let mut inputs = Inputs::new()
            .with("hugo", hugo)
            .with("slc", crate::table::Dataset::Frame(slc));
        let statements = solute_carriers(&mut inputs).unwrap();
        assert!(statements[0].contains("('ENSG00000117394', 'HGNC:11005', 'SLC2A1', 'glucose', 'F')"));
    }
}
