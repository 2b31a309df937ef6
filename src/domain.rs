use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DaedalusError;

/// Identifier of one resource cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CacheKey {
    #[serde(rename = "iuphar")]
    Iuphar,
    #[serde(rename = "iuphar_compiled")]
    IupharCompiled,
    #[serde(rename = "tcdb")]
    Tcdb,
    #[serde(rename = "hugo")]
    Hugo,
    #[serde(rename = "slc")]
    Slc,
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "patlas")]
    ProteinAtlas,
    #[serde(rename = "biomart")]
    Biomart,
    #[serde(rename = "cosmic")]
    Cosmic,
}

impl CacheKey {
    pub const ALL: [CacheKey; 9] = [
        CacheKey::Iuphar,
        CacheKey::IupharCompiled,
        CacheKey::Tcdb,
        CacheKey::Hugo,
        CacheKey::Slc,
        CacheKey::Go,
        CacheKey::ProteinAtlas,
        CacheKey::Biomart,
        CacheKey::Cosmic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::Iuphar => "iuphar",
            CacheKey::IupharCompiled => "iuphar_compiled",
            CacheKey::Tcdb => "tcdb",
            CacheKey::Hugo => "hugo",
            CacheKey::Slc => "slc",
            CacheKey::Go => "GO",
            CacheKey::ProteinAtlas => "patlas",
            CacheKey::Biomart => "biomart",
            CacheKey::Cosmic => "cosmic",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CacheKey {
    type Err = DaedalusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        CacheKey::ALL
            .into_iter()
            .find(|key| key.as_str() == trimmed)
            .ok_or_else(|| DaedalusError::InvalidCacheKey(value.to_string()))
    }
}

/// Identifier of one transform runner. `ALL` is the fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunnerId {
    GeneIds,
    TranscriptIds,
    RefseqMrna,
    ProteinStructures,
    GeneNames,
    IupharTargets,
    IupharLigands,
    IupharInteractions,
    TcdbIds,
    TcdbDefinitions,
    IonChannels,
    Cosmic,
    Aquaporins,
    SoluteCarriers,
    AbcTransporters,
    AtpDriven,
    TissueOfOrigin,
    Function,
    Structure,
}

impl RunnerId {
    pub const ALL: [RunnerId; 19] = [
        RunnerId::GeneIds,
        RunnerId::TranscriptIds,
        RunnerId::RefseqMrna,
        RunnerId::ProteinStructures,
        RunnerId::GeneNames,
        RunnerId::IupharTargets,
        RunnerId::IupharLigands,
        RunnerId::IupharInteractions,
        RunnerId::TcdbIds,
        RunnerId::TcdbDefinitions,
        RunnerId::IonChannels,
        RunnerId::Cosmic,
        RunnerId::Aquaporins,
        RunnerId::SoluteCarriers,
        RunnerId::AbcTransporters,
        RunnerId::AtpDriven,
        RunnerId::TissueOfOrigin,
        RunnerId::Function,
        RunnerId::Structure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RunnerId::GeneIds => "gene_ids",
            RunnerId::TranscriptIds => "transcript_ids",
            RunnerId::RefseqMrna => "refseq_mrna",
            RunnerId::ProteinStructures => "protein_structures",
            RunnerId::GeneNames => "gene_names",
            RunnerId::IupharTargets => "iuphar_targets",
            RunnerId::IupharLigands => "iuphar_ligands",
            RunnerId::IupharInteractions => "iuphar_interactions",
            RunnerId::TcdbIds => "tcdb_ids",
            RunnerId::TcdbDefinitions => "tcdb_definitions",
            RunnerId::IonChannels => "ion_channels",
            RunnerId::Cosmic => "cosmic",
            RunnerId::Aquaporins => "aquaporins",
            RunnerId::SoluteCarriers => "solute_carriers",
            RunnerId::AbcTransporters => "ABC_transporters",
            RunnerId::AtpDriven => "ATP_driven",
            RunnerId::TissueOfOrigin => "tissue_of_origin",
            RunnerId::Function => "function",
            RunnerId::Structure => "structure",
        }
    }
}

impl fmt::Display for RunnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for RunnerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for RunnerId {
    type Err = DaedalusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        RunnerId::ALL
            .into_iter()
            .find(|id| id.as_str() == trimmed)
            .ok_or_else(|| DaedalusError::UnknownRunner(value.to_string()))
    }
}

/// An Ensembl stable id such as `ENSG00000139618.17`, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsemblId {
    base: String,
    version: Option<String>,
}

impl EnsemblId {
    /// The id without its version suffix (`ENSG00000139618`).
    pub fn without_version(&self) -> &str {
        &self.base
    }

    /// The version suffix alone (`17`), if present.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The full id including the version, if present.
    pub fn full(&self) -> String {
        match &self.version {
            Some(version) => format!("{}.{version}", self.base),
            None => self.base.clone(),
        }
    }
}

impl fmt::Display for EnsemblId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full())
    }
}

impl FromStr for EnsemblId {
    type Err = DaedalusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (base, version) = match trimmed.split_once('.') {
            Some((base, version)) => (base, Some(version)),
            None => (trimmed, None),
        };
        let is_valid = base.starts_with("ENS")
            && base.len() > 3
            && base.chars().all(|ch| ch.is_ascii_alphanumeric())
            && version
                .map(|v| !v.is_empty() && v.chars().all(|ch| ch.is_ascii_digit()))
                .unwrap_or(true);
        if !is_valid {
            return Err(DaedalusError::Transform(format!(
                "invalid Ensembl id: {value}"
            )));
        }
        Ok(Self {
            base: base.to_string(),
            version: version.map(str::to_string),
        })
    }
}
