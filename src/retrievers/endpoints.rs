//! Remote locations of every source dataset.

pub const BIOMART: &str = "https://ensembl.org/biomart/martservice";

const BIOMART_ENTREZ: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE Query>
<Query  virtualSchemaName = "default" formatter = "TSV" header = "1" uniqueRows = "1" datasetConfigVersion = "0.6" >
	<Dataset name = "hsapiens_gene_ensembl" interface = "default" >
		<Filter name = "biotype" value = "protein_coding"/>
		<Attribute name = "ensembl_gene_id_version" />
		<Attribute name = "entrezgene_id" />
	</Dataset>
</Query>"#;

const BIOMART_IDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE Query>
<Query  virtualSchemaName = "default" formatter = "TSV" header = "1" uniqueRows = "1" datasetConfigVersion = "0.6" >
	<Dataset name = "hsapiens_gene_ensembl" interface = "default" >
		<Filter name = "biotype" value = "protein_coding"/>
		<Attribute name = "ensembl_gene_id_version" />
		<Attribute name = "ensembl_transcript_id_version" />
	</Dataset>
</Query>"#;

const BIOMART_PROTEINS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE Query>
<Query  virtualSchemaName = "default" formatter = "TSV" header = "1" uniqueRows = "1" datasetConfigVersion = "0.6" >
	<Dataset name = "hsapiens_gene_ensembl" interface = "default" >
		<Filter name = "biotype" value = "protein_coding"/>
		<Attribute name = "ensembl_transcript_id_version" />
		<Attribute name = "ensembl_peptide_id_version" />
		<Attribute name = "pdb" />
		<Attribute name = "refseq_mrna" />
		<Attribute name = "refseq_peptide" />
	</Dataset>
</Query>"#;

const BIOMART_GENE_NAMES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE Query>
<Query  virtualSchemaName = "default" formatter = "TSV" header = "1" uniqueRows = "1" datasetConfigVersion = "0.6" >
	<Dataset name = "hsapiens_gene_ensembl" interface = "default" >
		<Filter name = "biotype" value = "protein_coding"/>
		<Attribute name = "hgnc_id" />
		<Attribute name = "hgnc_symbol" />
		<Attribute name = "description" />
		<Attribute name = "ensembl_gene_id_version" />
	</Dataset>
</Query>"#;

/// BioMart queries by frame name.
pub const BIOMART_QUERIES: &[(&str, &str)] = &[
    ("entrez", BIOMART_ENTREZ),
    ("IDs", BIOMART_IDS),
    ("proteins", BIOMART_PROTEINS),
    ("gene_names", BIOMART_GENE_NAMES),
];

/// A headerless TCDB table and the names of its columns.
pub struct TcdbTable {
    pub name: &'static str,
    pub url: &'static str,
    pub columns: &'static [&'static str],
}

pub const TCDB: &[TcdbTable] = &[
    TcdbTable {
        name: "GO_to_TC",
        url: "https://www.tcdb.org/cgi-bin/projectv/public/go.py",
        columns: &["go_id", "tc_id", "family_name"],
    },
    TcdbTable {
        name: "RefSeq_to_TC",
        url: "https://www.tcdb.org/cgi-bin/projectv/public/refseq.py",
        columns: &["refseq_id", "tc_id", "family_name"],
    },
    TcdbTable {
        name: "TC_definitions",
        url: "https://www.tcdb.org/cgi-bin/projectv/public/families.py",
        columns: &["tc_id", "definition"],
    },
];

pub const COSMIC: &[(&str, &str)] = &[
    (
        "census",
        "https://cancer.sanger.ac.uk/cosmic/file_download/GRCh38/cosmic/v96/cancer_gene_census.csv",
    ),
    (
        "IDs",
        "https://cancer.sanger.ac.uk/cosmic/file_download/GRCh38/cosmic/v96/CosmicHGNC.tsv.gz",
    ),
];

pub const IUPHAR_DB: &str = "https://www.guidetopharmacology.org/DATA/public_iuphardb_v2024.4.zip";

pub const IUPHAR_COMPILED: &[(&str, &str)] = &[
    (
        "targets+families",
        "https://www.guidetopharmacology.org/DATA/targets_and_families.csv",
    ),
    ("ligands", "https://www.guidetopharmacology.org/DATA/ligands.csv"),
    (
        "interactions",
        "https://www.guidetopharmacology.org/DATA/interactions.csv",
    ),
];

pub const HUGO_NOMENCLATURE: &str = "https://ftp.ebi.ac.uk/pub/databases/genenames/out_of_date_hgnc/archive/monthly/tsv/hgnc_complete_set_2024-08-23.txt";

pub fn hugo_group_url(id: u32) -> String {
    format!("https://www.genenames.org/cgi-bin/genegroup/download?id={id}&type=branch")
}

/// HGNC gene groups by frame name.
pub const HUGO_GROUPS: &[(&str, u32)] = &[
    ("ion_channels", 177),
    ("sodium_ion_channels", 179),
    ("calcium_ion_channels", 182),
    ("potassium_ion_channels", 183),
    ("chloride_ion_channels", 278),
    ("porins", 304),
    ("aquaporins", 305),
    ("ligand_gated_ion_channels", 161),
    ("voltage_gated_ion_channels", 178),
    ("ph_sensing_ion_channels", 290),
    ("volume_regulated_ion_channels", 1158),
    ("ABC_transporters", 417),
    ("solute_carriers", 752),
    ("atpases", 412),
    // Not transporters; used to exclude members from `atpases`.
    ("AAA_atpases", 413),
];

pub const SLC_TABLES: &str = "http://slc.bioparadigms.org/";

/// `{go_ids}` takes a comma-separated list of fewer than 500 terms.
pub const GO_QUERY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE Query>
<Query  virtualSchemaName = "default" formatter = "TSV" header = "1" uniqueRows = "1" count = "" datasetConfigVersion = "0.6" >
	<Dataset name = "hsapiens_gene_ensembl" interface = "default" >
		<Filter name = "biotype" value = "protein_coding"/>
		<Filter name = "go_parent_term" value = "{go_ids}"/>
		<Attribute name = "ensembl_gene_id" />
		<Attribute name = "go_id" />
	</Dataset>
</Query>
"#;

/// GO terms by frame name. Each is fetched on its own: child terms are not
/// reliably reported under their parents.
pub const GO_TERMS: &[(&str, &str)] = &[
    ("transmembrane_transporter_activity", "GO:0005478"),
    ("monoatomic_anion_transporter", "GO:0008509"),
    ("monoatomic_cation_transporter", "GO:0008324"),
    ("monoatomic_ion_channel", "GO:0005216"),
    ("monoatomic_anion_channel", "GO:0005253"),
    ("monoatomic_cation_channel", "GO:0005261"),
    ("chloride_ion_channels", "GO:0005254"),
    ("calcium_ion_channels", "GO:0005262"),
    ("potassium_ion_channels", "GO:0005267"),
    ("proton_ion_channels", "GO:0015252"),
    ("sodium_ion_channels", "GO:0005272"),
    ("mechanosensitive_channels", "GO:0008381"),
];

pub const PROTEIN_ATLAS: &[(&str, &str)] = &[
    (
        "normal_tissue_expression",
        "https://v23.proteinatlas.org/download/normal_tissue.tsv.zip",
    ),
    (
        "subcellular_location",
        "https://v23.proteinatlas.org/download/subcellular_location.tsv.zip",
    ),
];
