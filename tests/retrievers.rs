use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;

use daedalus::cache::{Hook, ResourceCache};
use daedalus::domain::CacheKey;
use daedalus::error::DaedalusError;
use daedalus::fetch::{FetchRequest, Fetcher};
use daedalus::retrievers::endpoints::{HUGO_GROUPS, HUGO_NOMENCLATURE, hugo_group_url};
use daedalus::retrievers::{DumpParser, Hugo, default_hooks};

/// Serves bodies by URL; everything else is a 404.
#[derive(Default)]
struct MockFetcher {
    bodies: HashMap<String, Vec<u8>>,
    seen: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn serve(mut self, url: impl Into<String>, body: &str) -> Self {
        self.bodies.insert(url.into(), body.as_bytes().to_vec());
        self
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, DaedalusError> {
        self.seen.lock().unwrap().push(request.url.clone());
        self.bodies
            .get(&request.url)
            .cloned()
            .ok_or_else(|| DaedalusError::FetchStatus {
                url: request.url.clone(),
                status: 404,
                message: "Not Found".to_string(),
            })
    }
}

#[test]
fn unreachable_sources_fail_per_key() {
    let cache = ResourceCache::new(default_hooks(Arc::new(MockFetcher::default()), None));
    cache.populate().unwrap();

    assert_eq!(cache.failed_keys().len(), 8);
    assert_matches!(
        cache.acquire(CacheKey::Biomart),
        Err(DaedalusError::HookFailed { key, message }) if key == "biomart" && message.contains("404")
    );
    assert_matches!(cache.acquire(CacheKey::Cosmic), Err(DaedalusError::InvalidCacheKey(_)));
}

#[test]
fn hugo_groups_are_read_with_standard_columns() {
    let group = "HGNC ID\tApproved symbol\tApproved name\tEnsembl gene ID\tGroup name\n\
                 HGNC:633\tAQP1\taquaporin 1\tENSG00000240583\tAquaporins\n";
    let mut fetcher = MockFetcher::default().serve(
        HUGO_NOMENCLATURE,
        "hgnc_id\tsymbol\tname\tensembl_gene_id\nHGNC:633\tAQP1\taquaporin 1\tENSG00000240583\n",
    );
    for (_, id) in HUGO_GROUPS {
        fetcher = fetcher.serve(hugo_group_url(*id), group);
    }
    let dataset = Hugo::new(Arc::new(fetcher)).retrieve().unwrap();

    let aquaporins = dataset.frame("aquaporins").unwrap();
    assert_eq!(
        aquaporins.lookup("ensembl_gene_id", "hgnc_id").unwrap()["ENSG00000240583"],
        "HGNC:633"
    );
    assert!(dataset.frame("nomenclature").is_ok());
}

#[test]
fn dump_parser_is_incremental() {
    let mut parser = DumpParser::new().unwrap();
    for line in [
        "SET client_encoding = 'UTF8';",
        "COPY public.structural_info (object_id, species_id, transmembrane) FROM stdin;",
        "2508\t1\t6",
        "\\.",
    ] {
        parser.feed(line).unwrap();
    }
    let tables = parser.finish().unwrap();
    assert_eq!(tables["structural_info"].rows()[0][2].as_deref(), Some("6"));
}
