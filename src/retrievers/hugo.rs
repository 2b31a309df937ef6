use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::endpoints::{HUGO_GROUPS, HUGO_NOMENCLATURE, hugo_group_url};
use super::standardize;
use crate::cache::Hook;
use crate::decompress::maybe_gunzip;
use crate::error::DaedalusError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::table::{Dataset, ReadOptions, Table, read_delimited};

/// The HGNC complete set, under `nomenclature`, and one frame per gene
/// group of interest.
pub struct Hugo {
    fetcher: Arc<dyn Fetcher>,
}

impl Hugo {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    fn fetch(&self, dataset: &str, url: &str) -> Result<Table, DaedalusError> {
        let body = maybe_gunzip(self.fetcher.fetch(&FetchRequest::get(url))?)?;
        // Multi-valued HGNC cells are quoted.
        let options = ReadOptions {
            quoting: true,
            ..ReadOptions::tsv()
        };
        Ok(standardize(read_delimited(dataset, &body, &options)?))
    }
}

impl Hook for Hugo {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!("starting to retrieve from HGNC");
        let mut frames = BTreeMap::new();
        info!("retrieving the HGNC complete set");
        frames.insert(
            "nomenclature".to_string(),
            self.fetch("HGNC nomenclature", HUGO_NOMENCLATURE)?,
        );
        for (name, id) in HUGO_GROUPS {
            info!("retrieving HGNC gene group {id} ({name})");
            let table = self.fetch(&format!("HGNC group {name}"), &hugo_group_url(*id))?;
            frames.insert(name.to_string(), table);
        }
        Ok(Dataset::Frames(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrievers::testing::CannedFetcher;

    #[test]
    fn nomenclature_and_groups() {
        let mut fetcher = CannedFetcher::new().serve(
            HUGO_NOMENCLATURE,
            "hgnc_id\tsymbol\tname\tensembl_gene_id\nHGNC:6218\tKCNA1\t\"potassium channel\"\tENSG00000111262\n",
        );
        for (_, id) in HUGO_GROUPS {
            fetcher = fetcher.serve(
                hugo_group_url(*id),
                "HGNC ID\tApproved symbol\tEnsembl gene ID\tGroup name\nHGNC:6218\tKCNA1\tENSG00000111262\tPotassium voltage-gated channels\n",
            );
        }
        let fetcher = Arc::new(fetcher);
        let dataset = Hugo::new(fetcher.clone()).retrieve().unwrap();

        assert_eq!(fetcher.request_count(), HUGO_GROUPS.len() + 1);
        let nomenclature = dataset.frame("nomenclature").unwrap();
        assert_eq!(nomenclature.rows()[0][2].as_deref(), Some("potassium channel"));
        let group = dataset.frame("potassium_ion_channels").unwrap();
        assert_eq!(group.columns(), &["hgnc_id", "approved_symbol", "ensembl_gene_id", "group_name"]);
    }
}
