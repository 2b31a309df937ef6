//! Transforms: cached datasets in, load statements out.
//!
//! Every transform has the same shape, `fn(&mut Inputs) -> Result<Vec<String>>`,
//! and sees only the datasets its runner declared. They never touch the
//! store; the orchestrator applies what they return.

use std::collections::BTreeMap;

use crate::db::{quote_identifier, quote_literal};
use crate::domain::EnsemblId;
use crate::error::DaedalusError;
use crate::table::{Dataset, Table};

pub mod atlas;
pub mod carriers;
pub mod channels;
pub mod cosmic;
pub mod ensembl;
pub mod iuphar;
pub mod tcdb;

/// Rows per generated `INSERT`.
pub const INSERT_CHUNK_ROWS: usize = 500;

pub type Transform = fn(&mut Inputs) -> Result<Vec<String>, DaedalusError>;

/// The datasets and constant arguments handed to one transform, by
/// parameter name.
#[derive(Debug, Default)]
pub struct Inputs {
    datasets: BTreeMap<&'static str, Dataset>,
    args: BTreeMap<&'static str, &'static str>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, dataset: Dataset) {
        self.datasets.insert(name, dataset);
    }

    pub fn with(mut self, name: &'static str, dataset: Dataset) -> Self {
        self.insert(name, dataset);
        self
    }

    pub fn set_arg(&mut self, name: &'static str, value: &'static str) {
        self.args.insert(name, value);
    }

    pub fn with_arg(mut self, name: &'static str, value: &'static str) -> Self {
        self.set_arg(name, value);
        self
    }

    pub fn dataset(&self, name: &str) -> Result<&Dataset, DaedalusError> {
        self.datasets
            .get(name)
            .ok_or_else(|| DaedalusError::Transform(format!("missing input '{name}'")))
    }

    /// The single frame held by input `name`.
    pub fn table(&self, name: &str) -> Result<&Table, DaedalusError> {
        self.dataset(name)?.as_frame()
    }

    /// Frame `frame` of the collection held by input `name`.
    pub fn frame(&self, name: &str, frame: &str) -> Result<&Table, DaedalusError> {
        self.dataset(name)?.frame(frame)
    }

    pub fn arg(&self, name: &str) -> Result<&'static str, DaedalusError> {
        self.args
            .get(name)
            .copied()
            .ok_or_else(|| DaedalusError::Transform(format!("missing argument '{name}'")))
    }

    pub fn optional_arg(&self, name: &str) -> Option<&'static str> {
        self.args.get(name).copied()
    }
}

/// Renders `table` as `INSERT` statements into `target`, in chunks of
/// [`INSERT_CHUNK_ROWS`]. An empty table yields no statements.
pub fn to_transaction(table: &Table, target: &str) -> Vec<String> {
    let columns = table
        .columns()
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Vec<_>>()
        .join(", ");
    let head = format!("INSERT INTO {} ({columns}) VALUES\n", quote_identifier(target));

    table
        .rows()
        .chunks(INSERT_CHUNK_ROWS)
        .map(|chunk| {
            let values = chunk
                .iter()
                .map(|row| {
                    let cells = row
                        .iter()
                        .map(|cell| match cell {
                            Some(value) => quote_literal(value),
                            None => "NULL".to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("({cells})")
                })
                .collect::<Vec<_>>()
                .join(",\n");
            format!("{head}{values};")
        })
        .collect()
}

/// `ENSG00000139618.17` -> `ENSG00000139618`.
pub(crate) fn strip_version(value: &str) -> Result<String, DaedalusError> {
    let id: EnsemblId = value.parse()?;
    Ok(id.without_version().to_string())
}

/// HGNC ids come both as `HGNC:5` and as bare `5`; the store uses the
/// prefixed form.
pub(crate) fn normalize_hgnc(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with("HGNC:") {
        Some(trimmed.to_string())
    } else {
        Some(format!("HGNC:{trimmed}"))
    }
}

/// Yes/no style cells as `1`/`0`.
pub(crate) fn flag(value: Option<&str>) -> String {
    let truthy = value
        .map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "yes" | "y" | "true" | "t" | "1"
            )
        })
        .unwrap_or(false);
    if truthy { "1" } else { "0" }.to_string()
}

pub(crate) fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[cfg(test)]
pub(crate) fn frame_of(names: &[&str], rows: Vec<Vec<Option<&str>>>) -> Table {
    let rows = rows
        .into_iter()
        .map(|row| row.into_iter().map(|cell| cell.map(str::to_string)).collect())
        .collect();
    Table::from_rows(columns(names), rows).unwrap_or_else(|err| panic!("bad fixture: {err}"))
}

#[cfg(test)]
pub(crate) fn frames_of(frames: Vec<(&str, Table)>) -> Dataset {
    Dataset::Frames(
        frames
            .into_iter()
            .map(|(name, table)| (name.to_string(), table))
            .collect(),
    )
}
