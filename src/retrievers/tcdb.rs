use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::endpoints::TCDB;
use super::fetch_table;
use crate::cache::Hook;
use crate::error::DaedalusError;
use crate::fetch::Fetcher;
use crate::table::{Dataset, ReadOptions};

/// Transporter Classification Database mappings and family definitions.
pub struct Tcdb {
    fetcher: Arc<dyn Fetcher>,
}

impl Tcdb {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl Hook for Tcdb {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!("starting to retrieve from TCDB");
        let mut frames = BTreeMap::new();
        for table in TCDB {
            let options = ReadOptions::tsv().with_names(table.columns);
            let frame = fetch_table(
                self.fetcher.as_ref(),
                &format!("TCDB {}", table.name),
                table.url,
                &options,
            )?;
            frames.insert(table.name.to_string(), frame);
        }
        Ok(Dataset::Frames(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrievers::testing::CannedFetcher;

    #[test]
    fn headerless_tables_get_named_columns() {
        let fetcher = CannedFetcher::new()
            .serve(TCDB[0].url, "GO:0005215\t2.A.1\tMFS\n")
            .serve(TCDB[1].url, "NP_001035.1\t2.A.1.1.28\tThe Major Facilitator Superfamily\n")
            .serve(TCDB[2].url, "2.A.1\tThe Major Facilitator Superfamily (MFS)\n");

        let dataset = Tcdb::new(Arc::new(fetcher)).retrieve().unwrap();
        let refseq = dataset.frame("RefSeq_to_TC").unwrap();
        assert_eq!(refseq.columns(), &["refseq_id", "tc_id", "family_name"]);
        assert_eq!(refseq.rows()[0][1].as_deref(), Some("2.A.1.1.28"));
        let definitions = dataset.frame("TC_definitions").unwrap();
        assert_eq!(definitions.len(), 1);
    }
}
