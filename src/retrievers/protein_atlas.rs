use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::endpoints::PROTEIN_ATLAS;
use super::standardize;
use crate::cache::Hook;
use crate::decompress::unzip_first;
use crate::error::DaedalusError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::table::{Dataset, ReadOptions, read_delimited};

/// Human Protein Atlas tissue expression and subcellular location exports.
pub struct ProteinAtlas {
    fetcher: Arc<dyn Fetcher>,
}

impl ProteinAtlas {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl Hook for ProteinAtlas {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!("starting to retrieve from the Human Protein Atlas");
        let mut frames = BTreeMap::new();
        for (name, url) in PROTEIN_ATLAS {
            info!("retrieving {name}");
            let archive = self.fetcher.fetch(&FetchRequest::get(*url))?;
            let (entry, body) = unzip_first(&archive)?;
            let table = read_delimited(&format!("Protein Atlas {entry}"), &body, &ReadOptions::tsv())?;
            frames.insert(name.to_string(), standardize(table));
        }
        Ok(Dataset::Frames(frames))
    }
}
