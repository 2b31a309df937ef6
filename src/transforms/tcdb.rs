//! Transporter Classification Database tables.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::ensembl::{REFSEQ_PEPTIDE, TRANSCRIPT_VERSION};
use super::{Inputs, columns, strip_version, to_transaction};
use crate::error::DaedalusError;
use crate::table::Table;

pub const GO_TO_TC: &str = "GO_to_TC";
pub const REFSEQ_TO_TC: &str = "RefSeq_to_TC";
pub const TC_DEFINITIONS: &str = "TC_definitions";

/// The top-level TC classes.
pub const TC_CLASSES: &[(&str, &str)] = &[
    ("1", "Channels/Pores"),
    ("2", "Electrochemical Potential-driven Transporters"),
    ("3", "Primary Active Transporters"),
    ("4", "Group Translocators"),
    ("5", "Transmembrane Electron Carriers"),
    ("8", "Accessory Factors Involved in Transport"),
    ("9", "Incompletely Characterized Transport Systems"),
];

/// A TC number such as `2.A.1.1.1`: class, subclass, family and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcId {
    parts: Vec<String>,
}

impl TcId {
    /// `2`
    pub fn class(&self) -> &str {
        &self.parts[0]
    }

    /// `2.A`
    pub fn subclass(&self) -> String {
        self.parts[..2].join(".")
    }

    /// `2.A.1`
    pub fn family(&self) -> String {
        self.parts[..3].join(".")
    }
}

impl fmt::Display for TcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}

impl FromStr for TcId {
    type Err = DaedalusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts = value.trim().split('.').map(str::to_string).collect::<Vec<_>>();
        let valid = parts.len() >= 3
            && parts[0].chars().all(|ch| ch.is_ascii_digit())
            && parts[1].len() == 1
            && parts[1].chars().all(|ch| ch.is_ascii_uppercase())
            && parts[2..]
                .iter()
                .all(|part| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit()));
        if !valid {
            return Err(DaedalusError::Transform(format!("invalid TC number: {value}")));
        }
        Ok(Self { parts })
    }
}

pub fn tcdb_ids(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let proteins = inputs.frame("mart_data", "proteins")?;
    let mut transcripts: HashMap<String, Vec<String>> = HashMap::new();
    let transcript = proteins.require(TRANSCRIPT_VERSION)?;
    let peptide = proteins.require(REFSEQ_PEPTIDE)?;
    for row in proteins.rows() {
        if let (Some(transcript), Some(peptide)) = (&row[transcript], &row[peptide]) {
            transcripts
                .entry(unversioned(peptide).to_string())
                .or_default()
                .push(strip_version(transcript)?);
        }
    }

    let refseq = inputs.frame("tcdb_data", REFSEQ_TO_TC)?;
    let refseq_id = refseq.require("refseq_id")?;
    let tc_id = refseq.require("tc_id")?;

    let mut table = Table::new(columns(&["enst", "tcid", "tcid_type", "tcid_subtype", "tcid_family"]));
    for row in refseq.rows() {
        let (Some(refseq), Some(tc)) = (&row[refseq_id], &row[tc_id]) else {
            continue;
        };
        let Some(enst) = transcripts.get(unversioned(refseq)) else {
            continue;
        };
        let tc: TcId = match tc.parse() {
            Ok(tc) => tc,
            Err(err) => {
                debug!(error = %err, "skipping TCDB row");
                continue;
            }
        };
        for transcript in enst {
            table.push_row(vec![
                Some(transcript.clone()),
                Some(tc.to_string()),
                Some(tc.class().to_string()),
                Some(tc.subclass()),
                Some(tc.family()),
            ])?;
        }
    }
    table.drop_duplicates();
    Ok(to_transaction(&table, "tcdb_ids"))
}

/// Class names and family definitions, as two tables.
pub fn tcdb_definitions(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let mut types = Table::new(columns(&["tcid_type", "type_name"]));
    for (class, name) in TC_CLASSES {
        types.push_row(vec![Some(class.to_string()), Some(name.to_string())])?;
    }

    let definitions = inputs.frame("tcdb_data", TC_DEFINITIONS)?;
    let tc_id = definitions.require("tc_id")?;
    let definition = definitions.require("definition")?;

    let mut families = Table::new(columns(&["tcid_family", "family_definition"]));
    let mut seen = HashSet::new();
    for row in definitions.rows() {
        let Some(Ok(tc)) = row[tc_id].as_deref().map(str::parse::<TcId>) else {
            continue;
        };
        let family = tc.family();
        if seen.insert(family.clone()) {
            families.push_row(vec![Some(family), row[definition].clone()])?;
        }
    }

    let mut statements = to_transaction(&types, "tcdb_types");
    statements.extend(to_transaction(&families, "tcdb_families"));
    Ok(statements)
}

/// RefSeq accessions with the `.N` version dropped.
fn unversioned(accession: &str) -> &str {
    accession
        .split_once('.')
        .map(|(base, _)| base)
        .unwrap_or(accession)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::{frame_of, frames_of};

    #[test]
    fn tc_numbers_split_into_levels() {
        let tc: TcId = "2.A.1.1.1".parse().unwrap();
        assert_eq!(tc.class(), "2");
        assert_eq!(tc.subclass(), "2.A");
        assert_eq!(tc.family(), "2.A.1");
        assert!("2.a.1".parse::<TcId>().is_err());
        assert!("2.A".parse::<TcId>().is_err());
    }

    #[test]
    fn refseq_rows_join_to_transcripts() {
        let mart = frames_of(vec![(
            "proteins",
            frame_of(
                &[TRANSCRIPT_VERSION, REFSEQ_PEPTIDE],
                vec![vec![Some("ENST00000426263.10"), Some("NP_006507")]],
            ),
        )]);
        let tcdb = frames_of(vec![(
            REFSEQ_TO_TC,
            frame_of(
                &["refseq_id", "tc_id", "family_name"],
                vec![
                    vec![Some("NP_006507.2"), Some("2.A.1.1.28"), Some("MFS")],
                    vec![Some("NP_000000.1"), Some("1.A.1.1.1"), Some("VIC")],
                ],
            ),
        )]);
        let mut inputs = Inputs::new().with("mart_data", mart).with("tcdb_data", tcdb);
        let statements = tcdb_ids(&mut inputs).unwrap();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("('ENST00000426263', '2.A.1.1.28', '2', '2.A', '2.A.1')"));
        assert!(!statements[0].contains("1.A.1.1.1"));
    }

    #[test]
    fn definitions_emit_types_and_unique_families() {
        let tcdb = frames_of(vec![(
            TC_DEFINITIONS,
            frame_of(
                &["tc_id", "definition"],
                vec![
                    vec![Some("1.A.1"), Some("The Voltage-gated Ion Channel (VIC) Superfamily")],
                    vec![Some("1.A.1.1"), Some("duplicate family level")],
                ],
            ),
        )]);
        let mut inputs = Inputs::new().with("tcdb_data", tcdb);
        let statements = tcdb_definitions(&mut inputs).unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("INSERT INTO \"tcdb_types\""));
        assert!(!statements[1].contains("duplicate family level"));
    }
}
