//! Identifier tables built from the BioMart downloads.

use super::{Inputs, columns, normalize_hgnc, strip_version, to_transaction};
use crate::error::DaedalusError;
use crate::table::Table;

pub const GENE_VERSION: &str = "gene_stable_id_version";
pub const TRANSCRIPT_VERSION: &str = "transcript_stable_id_version";
pub const PROTEIN_VERSION: &str = "protein_stable_id_version";
pub const PDB_ID: &str = "pdb_id";
pub const REFSEQ_MRNA: &str = "refseq_mrna_id";
pub const REFSEQ_PEPTIDE: &str = "refseq_peptide_id";
pub const HGNC_ID: &str = "hgnc_id";
pub const HGNC_SYMBOL: &str = "hgnc_symbol";
pub const GENE_DESCRIPTION: &str = "gene_description";
pub const ENTREZ_ID: &str = "ncbi_gene_(formerly_entrezgene)_id";

pub fn gene_ids(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let entrez = inputs.frame("mart_data", "entrez")?;
    let gene = entrez.require(GENE_VERSION)?;
    let ncbi = entrez.require(ENTREZ_ID)?;

    let mut table = Table::new(columns(&["ensg", "ensg_version", "ncbi_gene_id"]));
    for row in entrez.rows() {
        let Some(version) = &row[gene] else { continue };
        table.push_row(vec![
            Some(strip_version(version)?),
            Some(version.clone()),
            row[ncbi].clone(),
        ])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "gene_ids"))
}

pub fn transcript_ids(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let ids = inputs.frame("mart_data", "IDs")?;
    let gene = ids.require(GENE_VERSION)?;
    let transcript = ids.require(TRANSCRIPT_VERSION)?;

    let mut table = Table::new(columns(&["ensg", "enst", "enst_version"]));
    for row in ids.rows() {
        let (Some(gene), Some(transcript)) = (&row[gene], &row[transcript]) else {
            continue;
        };
        table.push_row(vec![
            Some(strip_version(gene)?),
            Some(strip_version(transcript)?),
            Some(transcript.clone()),
        ])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "transcript_ids"))
}

pub fn refseq_mrna(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let proteins = inputs.frame("mart_data", "proteins")?;
    let transcript = proteins.require(TRANSCRIPT_VERSION)?;
    let refseq = proteins.require(REFSEQ_MRNA)?;

    let mut table = Table::new(columns(&["enst", "refseq_transcript_id"]));
    for row in proteins.rows() {
        let (Some(transcript), Some(refseq)) = (&row[transcript], &row[refseq]) else {
            continue;
        };
        table.push_row(vec![Some(strip_version(transcript)?), Some(refseq.clone())])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "mrna_refseq"))
}

pub fn protein_structures(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let proteins = inputs.frame("mart_data", "proteins")?;
    let transcript = proteins.require(TRANSCRIPT_VERSION)?;
    let protein = proteins.require(PROTEIN_VERSION)?;
    let pdb = proteins.require(PDB_ID)?;

    let mut table = Table::new(columns(&["enst", "ensp", "ensp_version", "pdb_id"]));
    for row in proteins.rows() {
        let (Some(transcript), Some(protein), Some(pdb)) = (&row[transcript], &row[protein], &row[pdb])
        else {
            continue;
        };
        table.push_row(vec![
            Some(strip_version(transcript)?),
            Some(strip_version(protein)?),
            Some(protein.clone()),
            Some(pdb.to_ascii_uppercase()),
        ])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "protein_structures"))
}

pub fn gene_names(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let names = inputs.frame("mart_data", "gene_names")?;
    let gene = names.require(GENE_VERSION)?;
    let hgnc = names.require(HGNC_ID)?;
    let symbol = names.require(HGNC_SYMBOL)?;
    let description = names.require(GENE_DESCRIPTION)?;

    let mut table = Table::new(columns(&[
        "ensg",
        "hugo_gene_id",
        "hugo_gene_symbol",
        "hugo_gene_name",
    ]));
    for row in names.rows() {
        let (Some(gene), Some(hgnc)) = (&row[gene], row[hgnc].as_deref().and_then(normalize_hgnc))
        else {
            continue;
        };
        table.push_row(vec![
            Some(strip_version(gene)?),
            Some(hgnc),
            row[symbol].clone(),
            row[description].as_deref().map(strip_source_note),
        ])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "gene_names"))
}

/// BioMart descriptions end with ` [Source:HGNC Symbol;Acc:HGNC:11005]`.
fn strip_source_note(description: &str) -> String {
    match description.find(" [Source:") {
        Some(start) => description[..start].to_string(),
        None => description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::table::Dataset;

    fn mart(frame: &str, names: &[&str], rows: Vec<Vec<Option<&str>>>) -> Inputs {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.map(str::to_string)).collect())
            .collect();
        let table = Table::from_rows(columns(names), rows).unwrap();
        let frames = BTreeMap::from([(frame.to_string(), table)]);
        Inputs::new().with("mart_data", Dataset::Frames(frames))
    }

    #[test]
    fn gene_names_drop_unnamed_and_strip_source() {
        let mut inputs = mart(
            "gene_names",
            &[HGNC_ID, HGNC_SYMBOL, GENE_DESCRIPTION, GENE_VERSION],
            vec![
                vec![
                    Some("HGNC:11005"),
                    Some("SLC2A1"),
                    Some("solute carrier family 2 member 1 [Source:HGNC Symbol;Acc:HGNC:11005]"),
                    Some("ENSG00000117394.24"),
                ],
                vec![None, None, None, Some("ENSG00000000001.1")],
            ],
        );
        let statements = gene_names(&mut inputs).unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("('ENSG00000117394', 'HGNC:11005', 'SLC2A1', 'solute carrier family 2 member 1')"));
        assert!(!statements[0].contains("ENSG00000000001"));
    }

    #[test]
    fn transcript_ids_keep_versions() {
        let mut inputs = mart(
            "IDs",
            &[GENE_VERSION, TRANSCRIPT_VERSION],
            vec![vec![Some("ENSG00000117394.24"), Some("ENST00000426263.10")]],
        );
        let statements = transcript_ids(&mut inputs).unwrap();
        assert!(statements[0].contains("('ENSG00000117394', 'ENST00000426263', 'ENST00000426263.10')"));
    }

    #[test]
    fn malformed_ids_fail_the_runner() {
        let mut inputs = mart(
            "entrez",
            &[GENE_VERSION, ENTREZ_ID],
            vec![vec![Some("not-an-id"), Some("6513")]],
        );
        assert!(gene_ids(&mut inputs).is_err());
    }
}
