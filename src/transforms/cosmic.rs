//! COSMIC Cancer Gene Census membership.

use std::collections::HashMap;

use super::ensembl::{ENTREZ_ID, GENE_VERSION};
use super::{Inputs, columns, flag, strip_version, to_transaction};
use crate::error::DaedalusError;
use crate::table::Table;

pub fn cosmic_genes(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let entrez = inputs.frame("mart_data", "entrez")?;
    let mut genes: HashMap<String, String> = HashMap::new();
    for (ncbi, version) in entrez.lookup(ENTREZ_ID, GENE_VERSION)? {
        genes.insert(ncbi, strip_version(&version)?);
    }

    // The census leaves some Entrez ids blank; the HGNC mapping file fills
    // them in by symbol.
    let fallback = inputs
        .frame("cosmic", "IDs")?
        .lookup("cosmic_gene_name", "entrez_id")?;

    let census = inputs.frame("cosmic", "census")?;
    let symbol = census.require("gene_symbol")?;
    let entrez_id = census.require("entrez_geneid")?;
    let tier = census.require("tier")?;
    let hallmark = census.require("hallmark")?;
    let somatic = census.require("somatic")?;
    let germline = census.require("germline")?;
    let role = census.require("role_in_cancer")?;

    let mut table = Table::new(columns(&[
        "ensg",
        "gene_symbol",
        "tier",
        "is_hallmark",
        "is_somatic",
        "is_germline",
        "role_in_cancer",
    ]));
    for row in census.rows() {
        let ncbi = row[entrez_id]
            .clone()
            .or_else(|| row[symbol].as_ref().and_then(|name| fallback.get(name).cloned()));
        let Some(ensg) = ncbi.and_then(|id| genes.get(id.trim()).cloned()) else {
            continue;
        };
        table.push_row(vec![
            Some(ensg),
            row[symbol].clone(),
            row[tier].clone(),
            Some(flag(row[hallmark].as_deref())),
            Some(flag(row[somatic].as_deref())),
            Some(flag(row[germline].as_deref())),
            row[role].clone(),
        ])?;
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "cosmic_genes"))
}
