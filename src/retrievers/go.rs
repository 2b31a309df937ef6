use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::biomart::query_biomart;
use super::endpoints::{GO_QUERY, GO_TERMS};
use crate::cache::Hook;
use crate::error::DaedalusError;
use crate::fetch::Fetcher;
use crate::table::{Dataset, Table};

/// Ensembl genes annotated under each Gene Ontology term of interest.
///
/// Each frame is a single `ensg` column of distinct gene ids.
pub struct GeneOntology {
    fetcher: Arc<dyn Fetcher>,
}

impl GeneOntology {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl Hook for GeneOntology {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!("starting to retrieve Gene Ontology annotations");
        let mut frames = BTreeMap::new();
        for (name, term) in GO_TERMS {
            info!("retrieving genes under {term} ({name})");
            let query = GO_QUERY.replace("{go_ids}", term);
            let genes = query_biomart(self.fetcher.as_ref(), &format!("GO {term}"), &query)?;
            let ids = genes.distinct("gene_stable_id")?;
            frames.insert(name.to_string(), Table::single_column("ensg", ids));
        }
        Ok(Dataset::Frames(frames))
    }
}
