//! Ion channels: HGNC channel groups and GO channel terms, annotated with
//! carried ions, gating and the matching IUPHAR target.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{Inputs, columns, normalize_hgnc, to_transaction};
use crate::error::DaedalusError;
use crate::table::{Dataset, Table};

/// HGNC groups whose members are channels, with the ion they carry.
const ION_GROUPS: &[(&str, Option<&str>)] = &[
    ("ion_channels", None),
    ("sodium_ion_channels", Some("Na+")),
    ("calcium_ion_channels", Some("Ca2+")),
    ("potassium_ion_channels", Some("K+")),
    ("chloride_ion_channels", Some("Cl-")),
];

const GATING_GROUPS: &[(&str, &str)] = &[
    ("ligand_gated_ion_channels", "ligand"),
    ("voltage_gated_ion_channels", "voltage"),
    ("ph_sensing_ion_channels", "pH"),
    ("volume_regulated_ion_channels", "volume"),
];

const ION_TERMS: &[(&str, Option<&str>)] = &[
    ("monoatomic_ion_channel", None),
    ("monoatomic_anion_channel", None),
    ("monoatomic_cation_channel", None),
    ("sodium_ion_channels", Some("Na+")),
    ("calcium_ion_channels", Some("Ca2+")),
    ("potassium_ion_channels", Some("K+")),
    ("chloride_ion_channels", Some("Cl-")),
    ("proton_ion_channels", Some("H+")),
];

const GATING_TERMS: &[(&str, &str)] = &[("mechanosensitive_channels", "mechanical")];

#[derive(Default)]
struct Channel {
    hgnc: Option<String>,
    ions: BTreeSet<&'static str>,
    gating: BTreeSet<&'static str>,
}

pub fn ion_channels(inputs: &mut Inputs) -> Result<Vec<String>, DaedalusError> {
    let hugo = inputs.dataset("hugo")?;
    let go = inputs.dataset("gene_ontology")?;
    let mut channels: BTreeMap<String, Channel> = BTreeMap::new();

    for (group, ion) in ION_GROUPS {
        for (ensg, hgnc) in group_members(hugo, group)? {
            let channel = channels.entry(ensg).or_default();
            channel.hgnc = channel.hgnc.take().or(hgnc);
            channel.ions.extend(*ion);
        }
    }
    for (term, ion) in ION_TERMS {
        for ensg in term_members(go, term)? {
            channels.entry(ensg).or_default().ions.extend(*ion);
        }
    }

    // Gating only annotates genes already known to be channels.
    for (group, gating) in GATING_GROUPS {
        for (ensg, _) in group_members(hugo, group)? {
            if let Some(channel) = channels.get_mut(&ensg) {
                channel.gating.insert(*gating);
            }
        }
    }
    for (term, gating) in GATING_TERMS {
        for ensg in term_members(go, term)? {
            if let Some(channel) = channels.get_mut(&ensg) {
                channel.gating.insert(*gating);
            }
        }
    }

    let nomenclature = hugo
        .frame("nomenclature")?
        .lookup("ensembl_gene_id", "hgnc_id")?;
    let targets = target_ids(inputs.frame("iuphar_compiled", super::iuphar::TARGETS)?)?;
    let names = inputs.frame("iuphar_data", "object")?.lookup("object_id", "name")?;

    let mut table = Table::new(columns(&[
        "ensg",
        "hugo_gene_id",
        "carried_ions",
        "gating_mechanism",
        "target_id",
        "channel_name",
    ]));
    for (ensg, channel) in channels {
        let hgnc = channel
            .hgnc
            .or_else(|| nomenclature.get(&ensg).cloned())
            .and_then(|id| normalize_hgnc(&id));
        let target = hgnc.as_ref().and_then(|id| targets.get(id)).cloned();
        let name = target
            .as_ref()
            .and_then(|id| names.get(id))
            .map(|name| super::iuphar::strip_html(name));
        table.push_row(vec![
            Some(ensg),
            hgnc,
            join(&channel.ions),
            join(&channel.gating),
            target,
            name,
        ])?;
    }
    Ok(to_transaction(&table, "channels"))
}

/// `(ensg, hgnc)` pairs of one HGNC group download.
pub(crate) fn group_members(
    hugo: &Dataset,
    group: &str,
) -> Result<Vec<(String, Option<String>)>, DaedalusError> {
    let frame = hugo.frame(group)?;
    let ensg = frame.require("ensembl_gene_id")?;
    let hgnc = frame.require("hgnc_id")?;
    Ok(frame
        .rows()
        .iter()
        .filter_map(|row| {
            let gene = row[ensg].as_deref()?.trim();
            (!gene.is_empty()).then(|| {
                (
                    gene.to_string(),
                    row[hgnc].as_deref().and_then(normalize_hgnc),
                )
            })
        })
        .collect())
}

fn term_members(go: &Dataset, term: &str) -> Result<Vec<String>, DaedalusError> {
    go.frame(term)?.distinct("ensg")
}

/// HGNC id -> IUPHAR target id, from the compiled target list.
fn target_ids(targets: &Table) -> Result<HashMap<String, String>, DaedalusError> {
    let target = targets.require("target_id")?;
    let hgnc = targets.require("hgnc_id")?;
    let mut map = HashMap::new();
    for row in targets.rows() {
        let (Some(target), Some(ids)) = (&row[target], &row[hgnc]) else {
            continue;
        };
        for id in ids.split('|').filter_map(normalize_hgnc) {
            map.entry(id).or_insert_with(|| target.clone());
        }
    }
    Ok(map)
}

fn join(values: &BTreeSet<&str>) -> Option<String> {
    (!values.is_empty()).then(|| values.iter().copied().collect::<Vec<_>>().join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::{frame_of, frames_of};

    fn group(rows: Vec<Vec<Option<&str>>>) -> Table {
        frame_of(&["hgnc_id", "approved_symbol", "ensembl_gene_id"], rows)
    }

    fn inputs() -> Inputs {
        let scn5a = || vec![vec![Some("HGNC:10593"), Some("SCN5A"), Some("ENSG00000183873")]];
        let mut groups = vec![(
            "nomenclature",
            frame_of(
                &["hgnc_id", "symbol", "ensembl_gene_id"],
                vec![vec![Some("HGNC:6251"), Some("KCNJ2"), Some("ENSG00000123700")]],
            ),
        )];
        for (name, _) in ION_GROUPS {
            let rows = if matches!(*name, "ion_channels" | "sodium_ion_channels") { scn5a() } else { vec![] };
            groups.push((*name, group(rows)));
        }
        for (name, _) in GATING_GROUPS {
            let rows = if *name == "voltage_gated_ion_channels" { scn5a() } else { vec![] };
            groups.push((*name, group(rows)));
        }

        let terms = ION_TERMS
            .iter()
            .map(|(term, _)| *term)
            .chain(GATING_TERMS.iter().map(|(term, _)| *term))
            .map(|term| {
                let members = if term == "potassium_ion_channels" {
                    vec!["ENSG00000123700".to_string()]
                } else {
                    vec![]
                };
                (term, Table::single_column("ensg", members))
            })
            .collect();

        let compiled = frames_of(vec![(
            crate::transforms::iuphar::TARGETS,
            frame_of(&["target_id", "hgnc_id"], vec![vec![Some("578"), Some("10593")]]),
        )]);
        let dump = frames_of(vec![(
            "object",
            frame_of(&["object_id", "name"], vec![vec![Some("578"), Some("Na<sub>V</sub>1.5")]]),
        )]);
        Inputs::new()
            .with("hugo", frames_of(groups))
            .with("gene_ontology", frames_of(terms))
            .with("iuphar_compiled", compiled)
            .with("iuphar_data", dump)
    }

    #[test]
    fn merges_groups_terms_and_targets() {
        let statements = ion_channels(&mut inputs()).unwrap();
        assert_eq!(statements.len(), 1);
        let sql = &statements[0];
        assert!(sql.contains("('ENSG00000123700', 'HGNC:6251', 'K+', NULL, NULL, NULL)"));
        assert!(sql.contains("('ENSG00000183873', 'HGNC:10593', 'Na+', 'voltage', '578', 'NaV1.5')"));
    }
}
