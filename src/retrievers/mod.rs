//! Cache hooks that retrieve each source dataset over HTTP.

mod biomart;
mod cosmic;
pub mod endpoints;
mod go;
mod hugo;
mod iuphar;
mod protein_atlas;
mod slc;
mod tcdb;

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::HookRegistry;
use crate::domain::CacheKey;
use crate::error::DaedalusError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::table::{ReadOptions, Table, read_delimited};

pub use biomart::Biomart;
pub use cosmic::{Cosmic, CosmicCredentials};
pub use go::GeneOntology;
pub use hugo::Hugo;
pub use iuphar::{DumpParser, IupharCompiled, IupharDump};
pub use protein_atlas::ProteinAtlas;
pub use slc::SoluteCarrierTables;
pub use tcdb::Tcdb;

/// Every source hook, in retrieval order. COSMIC is registered only when
/// credentials are available.
pub fn default_hooks(
    fetcher: Arc<dyn Fetcher>,
    cosmic: Option<CosmicCredentials>,
) -> HookRegistry {
    let mut registry = HookRegistry::new();
    registry
        .register(CacheKey::Iuphar, IupharDump::new(fetcher.clone()))
        .register(CacheKey::IupharCompiled, IupharCompiled::new(fetcher.clone()))
        .register(CacheKey::Tcdb, Tcdb::new(fetcher.clone()))
        .register(CacheKey::Hugo, Hugo::new(fetcher.clone()))
        .register(CacheKey::Slc, SoluteCarrierTables::new(fetcher.clone()))
        .register(CacheKey::Go, GeneOntology::new(fetcher.clone()))
        .register(CacheKey::ProteinAtlas, ProteinAtlas::new(fetcher.clone()))
        .register(CacheKey::Biomart, Biomart::new(fetcher.clone()));
    match cosmic {
        Some(credentials) => {
            registry.register(CacheKey::Cosmic, Cosmic::new(fetcher, credentials));
        }
        None => warn!("no COSMIC credentials given; the cosmic dataset will not be retrieved"),
    }
    registry
}

/// Lowercases, trims and snake-cases a source column header.
pub fn standardize_column(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

pub(crate) fn standardize(mut table: Table) -> Table {
    table.rename_columns(standardize_column);
    table
}

/// Fetches `url` and reads its body as a delimited table with standardized
/// column names.
pub(crate) fn fetch_table(
    fetcher: &dyn Fetcher,
    dataset: &str,
    url: &str,
    options: &ReadOptions,
) -> Result<Table, DaedalusError> {
    info!("retrieving {dataset}");
    let body = fetcher.fetch(&FetchRequest::get(url))?;
    let table = read_delimited(dataset, &body, options)?;
    Ok(standardize(table))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use crate::error::DaedalusError;
    use crate::fetch::{FetchRequest, Fetcher};

    struct Canned {
        url: String,
        needle: Option<String>,
        body: Vec<u8>,
    }

    /// Serves canned bodies by URL, optionally narrowed by a fragment of a
    /// query value, and records every request.
    #[derive(Default)]
    pub struct CannedFetcher {
        bodies: Vec<Canned>,
        pub requests: Mutex<Vec<FetchRequest>>,
    }

    impl CannedFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn serve(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
            self.bodies.push(Canned {
                url: url.into(),
                needle: None,
                body: body.into(),
            });
            self
        }

        pub fn serve_query(
            mut self,
            url: impl Into<String>,
            needle: &str,
            body: impl Into<Vec<u8>>,
        ) -> Self {
            self.bodies.push(Canned {
                url: url.into(),
                needle: Some(needle.to_string()),
                body: body.into(),
            });
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Fetcher for CannedFetcher {
        fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, DaedalusError> {
            self.requests.lock().unwrap().push(request.clone());
            self.bodies
                .iter()
                .find(|canned| {
                    canned.url == request.url
                        && canned.needle.as_ref().is_none_or(|needle| {
                            request.query.iter().any(|(_, value)| value.contains(needle.as_str()))
                        })
                })
                .map(|canned| canned.body.clone())
                .ok_or_else(|| DaedalusError::FetchStatus {
                    url: request.url.clone(),
                    status: 404,
                    message: "not served".to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_headers() {
        assert_eq!(standardize_column(" Target id "), "target_id");
        assert_eq!(standardize_column("HGNC ID"), "hgnc_id");
        assert_eq!(standardize_column("Main location"), "main_location");
    }

    #[test]
    fn cosmic_hook_requires_credentials() {
        let fetcher: Arc<dyn Fetcher> = Arc::new(testing::CannedFetcher::new());
        let without = default_hooks(fetcher.clone(), None);
        assert!(!without.contains(CacheKey::Cosmic));
        assert_eq!(without.len(), 8);

        let with = default_hooks(fetcher, Some(CosmicCredentials::new("a@b.org", "pw")));
        assert!(with.contains(CacheKey::Cosmic));
        assert_eq!(with.len(), 9);
    }
}
