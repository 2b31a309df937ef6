use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use super::endpoints::SLC_TABLES;
use super::standardize_column;
use crate::cache::Hook;
use crate::decompress::{maybe_gunzip, utf8};
use crate::error::DaedalusError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::table::{Dataset, Table};

const DATASET: &str = "SLC tables";

/// The SLC tables site: every HTML table on the page, stacked into one frame.
pub struct SoluteCarrierTables {
    fetcher: Arc<dyn Fetcher>,
}

impl SoluteCarrierTables {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl Hook for SoluteCarrierTables {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!("starting to retrieve the SLC tables");
        let body = maybe_gunzip(self.fetcher.fetch(&FetchRequest::get(SLC_TABLES))?)?;
        let page = utf8(DATASET, body)?;
        Ok(Dataset::Frame(parse_tables(&page)?))
    }
}

fn selector(css: &str) -> Result<Selector, DaedalusError> {
    Selector::parse(css).map_err(|err| DaedalusError::Parse {
        dataset: DATASET.to_string(),
        message: format!("bad selector {css}: {err}"),
    })
}

fn cell_text(cell: ElementRef<'_>) -> Option<String> {
    let text = cell.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Reads every `<table>` whose first row is its header.
pub(crate) fn parse_tables(page: &str) -> Result<Table, DaedalusError> {
    let document = Html::parse_document(page);
    let tables = selector("table")?;
    let rows = selector("tr")?;
    let cells = selector("th, td")?;

    let mut frames = Vec::new();
    for table in document.select(&tables) {
        let mut table_rows = table.select(&rows);
        let Some(header) = table_rows.next() else {
            continue;
        };
        let columns = header
            .select(&cells)
            .map(|cell| standardize_column(&cell_text(cell).unwrap_or_default()))
            .collect::<Vec<_>>();
        let mut frame = Table::new(columns);
        for row in table_rows {
            let mut values = row.select(&cells).map(cell_text).collect::<Vec<_>>();
            if values.iter().all(Option::is_none) {
                continue;
            }
            values.resize(frame.columns().len(), None);
            frame.push_row(values)?;
        }
        debug!(rows = frame.len(), "read SLC table");
        frames.push(frame);
    }
    if frames.is_empty() {
        return Err(DaedalusError::Parse {
            dataset: DATASET.to_string(),
            message: "page holds no tables".to_string(),
        });
    }
    Ok(Table::concat(frames))
}
