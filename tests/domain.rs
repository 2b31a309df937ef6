use std::str::FromStr;

use assert_matches::assert_matches;

use daedalus::domain::{CacheKey, EnsemblId, RunnerId};
use daedalus::error::DaedalusError;

#[test]
fn cache_keys_use_source_names() {
    assert_eq!(CacheKey::from_str("GO").unwrap(), CacheKey::Go);
    assert_eq!(CacheKey::from_str(" patlas ").unwrap(), CacheKey::ProteinAtlas);
    assert_eq!(CacheKey::Go.to_string(), "GO");
    assert_eq!(serde_json::to_string(&CacheKey::IupharCompiled).unwrap(), "\"iuphar_compiled\"");
    assert_matches!(CacheKey::from_str("go"), Err(DaedalusError::InvalidCacheKey(_)));
}

#[test]
fn runner_names_round_trip() {
    for id in RunnerId::ALL {
        assert_eq!(id.as_str().parse::<RunnerId>().unwrap(), id);
    }
    assert_eq!(serde_json::to_string(&RunnerId::AtpDriven).unwrap(), "\"ATP_driven\"");
    assert_matches!("atp_driven".parse::<RunnerId>(), Err(DaedalusError::UnknownRunner(_)));
}

#[test]
fn ensembl_ids_split_versions() {
    let id: EnsemblId = "ENSG00000139618.17".parse().unwrap();
    assert_eq!(id.without_version(), "ENSG00000139618");
    assert_eq!(id.version(), Some("17"));
    assert_eq!(id.to_string(), "ENSG00000139618.17");

    let bare: EnsemblId = "ENST00000380152".parse().unwrap();
    assert_eq!(bare.version(), None);

    assert!("NM_000059.4".parse::<EnsemblId>().is_err());
    assert!("ENSG00000139618.".parse::<EnsemblId>().is_err());
}
