//! Tabular frames and the datasets held by the resource cache.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::DaedalusError;

pub type Row = Vec<Option<String>>;

/// A frame of string cells. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// Decoded form of a [`Table`] before its rows are checked against the columns.
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl TryFrom<RawTable> for Table {
    type Error = DaedalusError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Table::from_rows(raw.columns, raw.rows)
    }
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, DaedalusError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn single_column<I>(name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            columns: vec![name.to_string()],
            rows: values.into_iter().map(|value| vec![Some(value)]).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Row) -> Result<(), DaedalusError> {
        if row.len() != self.columns.len() {
            return Err(DaedalusError::Transform(format!(
                "row has {} cells but the frame has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn require(&self, name: &str) -> Result<usize, DaedalusError> {
        self.column_index(name).ok_or_else(|| {
            DaedalusError::Transform(format!(
                "missing column '{name}' (available: {})",
                self.columns.join(", ")
            ))
        })
    }

    /// Cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<Option<&str>>, DaedalusError> {
        let index = self.require(name)?;
        Ok(self.rows.iter().map(|row| row[index].as_deref()).collect())
    }

    /// Distinct non-missing values of one column, in first-seen order.
    pub fn distinct(&self, name: &str) -> Result<Vec<String>, DaedalusError> {
        let mut seen = HashSet::new();
        Ok(self
            .column(name)?
            .into_iter()
            .flatten()
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect())
    }

    pub fn rename_columns<F>(&mut self, rename: F)
    where
        F: Fn(&str) -> String,
    {
        for column in &mut self.columns {
            *column = rename(column);
        }
    }

    /// Projects `(source, target)` column pairs into a new frame.
    pub fn select(&self, mapping: &[(&str, &str)]) -> Result<Table, DaedalusError> {
        let indices = mapping
            .iter()
            .map(|(source, _)| self.require(source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Table {
            columns: mapping.iter().map(|(_, target)| target.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    pub fn map_column<F>(&mut self, name: &str, map: F) -> Result<(), DaedalusError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let index = self.require(name)?;
        for row in &mut self.rows {
            row[index] = row[index].as_deref().and_then(&map);
        }
        Ok(())
    }

    /// Keeps the rows whose cell in `name` satisfies `keep`.
    pub fn filter_by<F>(&self, name: &str, keep: F) -> Result<Table, DaedalusError>
    where
        F: Fn(Option<&str>) -> bool,
    {
        let index = self.require(name)?;
        Ok(Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row[index].as_deref()))
                .cloned()
                .collect(),
        })
    }

    /// Drops rows with a missing value in any of `names`.
    pub fn drop_missing(&mut self, names: &[&str]) -> Result<(), DaedalusError> {
        let indices = names
            .iter()
            .map(|name| self.require(name))
            .collect::<Result<Vec<_>, _>>()?;
        self.rows
            .retain(|row| indices.iter().all(|&i| row[i].is_some()));
        Ok(())
    }

    pub fn drop_duplicates(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
    }

    /// Maps `key` cells to `value` cells; the first occurrence of a key wins.
    pub fn lookup(&self, key: &str, value: &str) -> Result<HashMap<String, String>, DaedalusError> {
        let key_index = self.require(key)?;
        let value_index = self.require(value)?;
        let mut map = HashMap::new();
        for row in &self.rows {
            if let (Some(k), Some(v)) = (&row[key_index], &row[value_index]) {
                map.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        Ok(map)
    }

    /// Stacks frames, aligning cells by column name. Columns missing from a
    /// frame are filled with `None`.
    pub fn concat<I>(tables: I) -> Table
    where
        I: IntoIterator<Item = Table>,
    {
        let tables = tables.into_iter().collect::<Vec<_>>();
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        let mut rows = Vec::new();
        for table in tables {
            let positions = columns
                .iter()
                .map(|column| table.column_index(column))
                .collect::<Vec<_>>();
            for row in table.rows {
                rows.push(
                    positions
                        .iter()
                        .map(|position| position.and_then(|i| row[i].clone()))
                        .collect(),
                );
            }
        }
        Table { columns, rows }
    }
}

/// The value of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Dataset {
    Frame(Table),
    Frames(BTreeMap<String, Table>),
}

impl Dataset {
    pub fn as_frame(&self) -> Result<&Table, DaedalusError> {
        match self {
            Dataset::Frame(table) => Ok(table),
            Dataset::Frames(_) => Err(DaedalusError::Transform(
                "expected a single frame, found a frame collection".to_string(),
            )),
        }
    }

    pub fn frame(&self, name: &str) -> Result<&Table, DaedalusError> {
        match self {
            Dataset::Frames(frames) => frames.get(name).ok_or_else(|| {
                DaedalusError::Transform(format!(
                    "missing frame '{name}' (available: {})",
                    frames.keys().cloned().collect::<Vec<_>>().join(", ")
                ))
            }),
            Dataset::Frame(_) => Err(DaedalusError::Transform(format!(
                "expected a frame collection holding '{name}', found a single frame"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    FirstRow,
    Names(Vec<String>),
}

/// How to read a delimited text body into a [`Table`].
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub delimiter: u8,
    pub header: Header,
    pub skip_lines: usize,
    pub quoting: bool,
}

impl ReadOptions {
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            header: Header::FirstRow,
            skip_lines: 0,
            quoting: false,
        }
    }

    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            header: Header::FirstRow,
            skip_lines: 0,
            quoting: true,
        }
    }

    pub fn with_names(mut self, names: &[&str]) -> Self {
        self.header = Header::Names(names.iter().map(|name| name.to_string()).collect());
        self
    }

    pub fn skip_lines(mut self, lines: usize) -> Self {
        self.skip_lines = lines;
        self
    }
}

pub fn read_delimited(
    dataset: &str,
    bytes: &[u8],
    options: &ReadOptions,
) -> Result<Table, DaedalusError> {
    let parse_err = |message: String| DaedalusError::Parse {
        dataset: dataset.to_string(),
        message,
    };

    let mut body = bytes;
    for _ in 0..options.skip_lines {
        body = match body.iter().position(|&b| b == b'\n') {
            Some(newline) => &body[newline + 1..],
            None => &[],
        };
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(matches!(options.header, Header::FirstRow))
        .quoting(options.quoting)
        .flexible(true)
        .from_reader(body);

    let columns = match &options.header {
        Header::Names(names) => names.clone(),
        Header::FirstRow => reader
            .headers()
            .map_err(|err| parse_err(err.to_string()))?
            .iter()
            .map(|name| name.trim().to_string())
            .collect(),
    };

    let mut table = Table::new(columns);
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|err| parse_err(err.to_string()))?;
        if record.len() > table.columns.len() {
            return Err(parse_err(format!(
                "record {} has {} fields, expected {}",
                line + 1,
                record.len(),
                table.columns.len()
            )));
        }
        let mut row: Row = record
            .iter()
            .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
            .collect();
        row.resize(table.columns.len(), None);
        table.rows.push(row);
    }
    Ok(table)
}
