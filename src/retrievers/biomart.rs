use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::endpoints::{BIOMART, BIOMART_QUERIES};
use super::standardize;
use crate::cache::Hook;
use crate::error::DaedalusError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::table::{Dataset, ReadOptions, Table, read_delimited};

/// Ensembl BioMart exports: gene, transcript and protein identifiers.
pub struct Biomart {
    fetcher: Arc<dyn Fetcher>,
}

impl Biomart {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl Hook for Biomart {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!("starting to retrieve from BioMart");
        let mut frames = BTreeMap::new();
        for (name, query) in BIOMART_QUERIES {
            info!("attempting to retrieve {name}");
            let table = query_biomart(self.fetcher.as_ref(), &format!("biomart {name}"), query)?;
            frames.insert(name.to_string(), table);
        }
        Ok(Dataset::Frames(frames))
    }
}

/// Runs one XML query against the BioMart service and reads the TSV reply.
pub(crate) fn query_biomart(
    fetcher: &dyn Fetcher,
    dataset: &str,
    query: &str,
) -> Result<Table, DaedalusError> {
    let body = fetcher.fetch(&FetchRequest::get(BIOMART).query("query", query))?;
    // BioMart reports malformed queries in a 200 body.
    if body.starts_with(b"Query ERROR") {
        let message = String::from_utf8_lossy(&body).trim().to_string();
        return Err(DaedalusError::Parse {
            dataset: dataset.to_string(),
            message,
        });
    }
    let table = read_delimited(dataset, &body, &ReadOptions::tsv())?;
    Ok(standardize(table))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::retrievers::testing::CannedFetcher;
    use crate::transforms::ensembl::{ENTREZ_ID, GENE_VERSION};

    fn mart() -> CannedFetcher {
        CannedFetcher::new()
            .serve_query(
                BIOMART,
                "entrezgene_id",
                "Gene stable ID version\tNCBI gene (formerly Entrezgene) ID\nENSG00000141510.18\t7157\n",
            )
            .serve_query(
                BIOMART,
                "refseq_peptide",
                "Transcript stable ID version\tProtein stable ID version\tPDB ID\tRefSeq mRNA ID\tRefSeq peptide ID\n",
            )
            .serve_query(
                BIOMART,
                "ensembl_transcript_id_version",
                "Gene stable ID version\tTranscript stable ID version\n",
            )
            .serve_query(
                BIOMART,
                "hgnc_symbol",
                "HGNC ID\tHGNC symbol\tGene description\tGene stable ID version\n",
            )
    }

    #[test]
    fn retrieves_every_query_as_a_frame() {
        let fetcher = Arc::new(mart());
        let dataset = Biomart::new(fetcher.clone()).retrieve().unwrap();
        let Dataset::Frames(frames) = &dataset else {
            panic!("expected frames");
        };
        assert_eq!(
            frames.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["IDs", "entrez", "gene_names", "proteins"]
        );
        let entrez = dataset.frame("entrez").unwrap();
        assert_eq!(entrez.columns(), &[GENE_VERSION.to_string(), ENTREZ_ID.to_string()]);
        assert_eq!(entrez.len(), 1);
        assert_eq!(fetcher.request_count(), 4);
    }

    #[test]
    fn query_errors_in_the_body_are_parse_failures() {
        let fetcher = CannedFetcher::new().serve(BIOMART, "Query ERROR: caught BioMart::Exception");
        let err = query_biomart(&fetcher, "biomart entrez", "<Query/>").unwrap_err();
        assert_matches!(err, DaedalusError::Parse { .. });
    }
}
