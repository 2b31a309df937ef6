//! Store bootstrapping: the schema before the load, fix-ups and indexes after.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

use crate::db::{Database, quote_identifier};
use crate::error::DaedalusError;

/// The schema every generated database starts from.
pub const SCHEMA: &str = include_str!("../assets/schema.sql");

/// Identifier columns that get a single-column index after the load.
pub const ID_COLUMNS: &[&str] = &[
    "ensg",
    "ensp",
    "hugo_gene_id",
    "target_id",
    "ligand_id",
    "family_id",
    "enst",
    "refseq_transcript_id",
    "pdb_id",
    "tcid_family",
    "tcid",
    "tcid_type",
    "tcid_subtype",
    "enst_version",
];

/// Runs `schema` in one transaction. The store must be empty.
pub fn initialize_schema(db: &Database, schema: &str) -> Result<(), DaedalusError> {
    if !db.is_empty()? {
        return Err(DaedalusError::StoreNotEmpty);
    }
    let script = format!("BEGIN;\n{schema}\nEND;");
    db.execute_script(&script).map_err(|err| {
        // Leave the store as empty as we found it.
        let _ = db.execute_script("ROLLBACK;");
        DaedalusError::Schema(err.to_string())
    })
}

/// A post-build fix-up script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixup {
    pub name: String,
    pub sql: String,
}

/// Lists the fix-up scripts to apply, in application order.
pub trait FixupSource {
    fn discover(&self) -> Result<Vec<Fixup>, DaedalusError>;
}

/// No fix-ups at all.
pub struct NoFixups;

impl FixupSource for NoFixups {
    fn discover(&self) -> Result<Vec<Fixup>, DaedalusError> {
        Ok(Vec::new())
    }
}

/// The `*.sql` files of a directory, in file name order.
pub struct DirectoryFixups {
    dir: Utf8PathBuf,
}

impl DirectoryFixups {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }
}

impl FixupSource for DirectoryFixups {
    fn discover(&self) -> Result<Vec<Fixup>, DaedalusError> {
        if !self.dir.as_std_path().exists() {
            warn!(dir = %self.dir, "fix-up directory does not exist");
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(self.dir.as_std_path())
            .map_err(|err| DaedalusError::Filesystem(format!("read {}: {err}", self.dir)))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|err| DaedalusError::Filesystem(err.to_string()))?
                .path();
            if path.is_file() && path.extension().map(|ext| ext == "sql").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let sql = fs::read_to_string(&path).map_err(|err| {
                    DaedalusError::Filesystem(format!("read {}: {err}", path.display()))
                })?;
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default();
                Ok(Fixup { name, sql })
            })
            .collect()
    }
}

/// Splits a script on `;`, ignoring terminators inside quotes and comments.
/// Fragments holding only whitespace or comments are dropped; every kept
/// statement ends with `;`.
pub fn split_statements(sql: &str) -> Vec<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mode {
        Code,
        Single,
        Double,
        LineComment,
        BlockComment,
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    // Whether `current` holds anything other than whitespace and comments.
    let mut has_code = false;
    let mut mode = Mode::Code;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        match mode {
            Mode::Code => match ch {
                ';' => {
                    if has_code {
                        let statement = current.trim();
                        statements.push(format!("{statement};"));
                    }
                    current.clear();
                    has_code = false;
                    continue;
                }
                '\'' => {
                    mode = Mode::Single;
                    has_code = true;
                }
                '"' => {
                    mode = Mode::Double;
                    has_code = true;
                }
                '-' if chars.peek() == Some(&'-') => mode = Mode::LineComment,
                '/' if chars.peek() == Some(&'*') => mode = Mode::BlockComment,
                c if !c.is_whitespace() => has_code = true,
                _ => {}
            },
            Mode::Single if ch == '\'' => mode = Mode::Code,
            Mode::Double if ch == '"' => mode = Mode::Code,
            Mode::LineComment if ch == '\n' => mode = Mode::Code,
            Mode::BlockComment if ch == '*' && chars.peek() == Some(&'/') => {
                current.push(ch);
                if let Some(slash) = chars.next() {
                    current.push(slash);
                }
                mode = Mode::Code;
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if has_code {
        let statement = current.trim();
        statements.push(format!("{statement};"));
    }
    statements
}

/// One executed fix-up statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixupStatement {
    pub script: String,
    /// 1-based position within the script.
    pub position: usize,
    pub changes: u64,
}

impl FixupStatement {
    pub fn is_noop(&self) -> bool {
        self.changes == 0
    }
}

/// Applies every discovered fix-up, statement by statement, in order.
/// Statements that change no rows are logged as warnings.
pub fn apply_post_build_fixups(
    db: &Database,
    source: &dyn FixupSource,
) -> Result<Vec<FixupStatement>, DaedalusError> {
    info!("looking for post-build transactions");
    let fixups = source.discover()?;
    if fixups.is_empty() {
        info!("found no transactions to apply");
        return Ok(Vec::new());
    }

    info!("found {} hooks to apply, applying", fixups.len());
    let mut executed = Vec::new();
    for fixup in &fixups {
        for (i, statement) in split_statements(&fixup.sql).iter().enumerate() {
            let position = i + 1;
            info!("executing post-build hook {} [{position}]", fixup.name);
            let changes = db.execute(statement).map_err(|err| {
                DaedalusError::Database(format!("post-build hook {} [{position}]: {err}", fixup.name))
            })?;
            let applied = FixupStatement {
                script: fixup.name.clone(),
                position,
                changes,
            };
            if applied.is_noop() {
                warn!("post-build hook {} [{position}] did not affect the database", fixup.name);
            }
            executed.push(applied);
        }
    }
    Ok(executed)
}

pub fn index_name(table: &str, column: &str) -> String {
    format!("{table}_{column}_index")
}

/// Indexes every column named in `id_columns`, on every table. Returns the
/// created index names.
pub fn create_identifier_indexes(
    db: &Database,
    id_columns: &[&str],
) -> Result<Vec<String>, DaedalusError> {
    info!("getting all table names");
    let mut created = Vec::new();
    for table in db.table_names()? {
        for column in db.table_columns(&table)? {
            if !id_columns.contains(&column.as_str()) {
                continue;
            }
            info!("creating a new index on table {table} with col {column}");
            let name = index_name(&table, &column);
            db.execute_script(&format!(
                "CREATE INDEX {} ON {} ({});",
                quote_identifier(&name),
                quote_identifier(&table),
                quote_identifier(&column)
            ))?;
            created.push(name);
        }
    }
    info!(count = created.len(), "finished creating table indexes");
    Ok(created)
}
