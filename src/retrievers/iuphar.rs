use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info};

use super::endpoints::{IUPHAR_COMPILED, IUPHAR_DB};
use super::fetch_table;
use crate::cache::Hook;
use crate::decompress::{unzip_first, utf8};
use crate::error::DaedalusError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::table::{Dataset, ReadOptions, Table};

const NULL: &str = "\\N";
const END_OF_DATA: &str = "\\.";

/// Collects the `COPY ... FROM stdin;` blocks of a PostgreSQL plain-text
/// dump into one frame per table.
pub struct DumpParser {
    copy_line: Regex,
    tables: BTreeMap<String, Table>,
    open: Option<(String, Table)>,
}

impl DumpParser {
    pub fn new() -> Result<Self, DaedalusError> {
        let copy_line = Regex::new(r"^COPY (\S+) \((.*?)\) FROM stdin;").map_err(|err| {
            DaedalusError::Parse {
                dataset: "IUPHAR dump".to_string(),
                message: err.to_string(),
            }
        })?;
        Ok(Self {
            copy_line,
            tables: BTreeMap::new(),
            open: None,
        })
    }

    pub fn feed(&mut self, line: &str) -> Result<(), DaedalusError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match self.open.take() {
            Some((name, table)) if line == END_OF_DATA => {
                debug!(table = %name, rows = table.len(), "read dump table");
                self.tables.insert(name, table);
            }
            Some((name, mut table)) => {
                let row = line
                    .split('\t')
                    .map(|cell| (cell != NULL).then(|| cell.to_string()))
                    .collect::<Vec<_>>();
                if row.len() != table.columns().len() {
                    return Err(DaedalusError::Parse {
                        dataset: format!("IUPHAR dump table {name}"),
                        message: format!(
                            "row has {} fields, expected {}",
                            row.len(),
                            table.columns().len()
                        ),
                    });
                }
                table.push_row(row)?;
                self.open = Some((name, table));
            }
            None => {
                if let Some(captures) = self.copy_line.captures(line) {
                    let name = unquote(captures[1].trim_start_matches("public.")).to_string();
                    let columns = captures[2]
                        .split(',')
                        .map(|column| unquote(column.trim()).to_string())
                        .collect();
                    self.open = Some((name, Table::new(columns)));
                }
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<BTreeMap<String, Table>, DaedalusError> {
        match self.open {
            Some((name, _)) => Err(DaedalusError::Parse {
                dataset: format!("IUPHAR dump table {name}"),
                message: "dump ended inside a COPY block".to_string(),
            }),
            None => Ok(self.tables),
        }
    }

    pub fn parse(dump: &str) -> Result<BTreeMap<String, Table>, DaedalusError> {
        let mut parser = Self::new()?;
        for line in dump.lines() {
            parser.feed(line)?;
        }
        parser.finish()
    }
}

fn unquote(identifier: &str) -> &str {
    identifier
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(identifier)
}

/// The full IUPHAR/BPS Guide to Pharmacology database dump.
pub struct IupharDump {
    fetcher: Arc<dyn Fetcher>,
}

impl IupharDump {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl Hook for IupharDump {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!("starting to retrieve the IUPHAR database dump");
        let archive = self.fetcher.fetch(&FetchRequest::get(IUPHAR_DB))?;
        let (entry, bytes) = unzip_first(&archive)?;
        info!("parsing {entry}");
        let dump = utf8("IUPHAR dump", bytes)?;
        Ok(Dataset::Frames(DumpParser::parse(&dump)?))
    }
}

/// The compiled IUPHAR CSV exports: targets, ligands and interactions.
pub struct IupharCompiled {
    fetcher: Arc<dyn Fetcher>,
}

impl IupharCompiled {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

impl Hook for IupharCompiled {
    fn retrieve(&self) -> Result<Dataset, DaedalusError> {
        info!("starting to retrieve compiled IUPHAR tables");
        let mut frames = BTreeMap::new();
        // Each export opens with a one-line version banner.
        let options = ReadOptions::csv().skip_lines(1);
        for (name, url) in IUPHAR_COMPILED {
            let table = fetch_table(
                self.fetcher.as_ref(),
                &format!("IUPHAR {name}"),
                url,
                &options,
            )?;
            frames.insert(name.to_string(), table);
        }
        Ok(Dataset::Frames(frames))
    }
}
