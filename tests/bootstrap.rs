use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use daedalus::bootstrap::{
    DirectoryFixups, Fixup, FixupSource, FixupStatement, ID_COLUMNS, SCHEMA, apply_post_build_fixups,
    create_identifier_indexes, initialize_schema,
};
use daedalus::db::Database;
use daedalus::error::DaedalusError;

struct Scripts(Vec<Fixup>);

impl FixupSource for Scripts {
    fn discover(&self) -> Result<Vec<Fixup>, DaedalusError> {
        Ok(self.0.clone())
    }
}

#[test]
fn indexes_only_allow_listed_columns() {
    let db = Database::open_in_memory().unwrap();
    db.execute_script("CREATE TABLE T1 (ensg TEXT, name TEXT); CREATE TABLE T2 (other TEXT);")
        .unwrap();

    let created = create_identifier_indexes(&db, &["ensg"]).unwrap();
    assert_eq!(created, vec!["T1_ensg_index".to_string()]);

    let count: i64 = db
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'T1_ensg_index'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn schema_requires_an_empty_store() {
    let db = Database::open_in_memory().unwrap();
    initialize_schema(&db, SCHEMA).unwrap();
    assert!(db.table_names().unwrap().contains(&"gene_ids".to_string()));
    assert_matches!(initialize_schema(&db, SCHEMA), Err(DaedalusError::StoreNotEmpty));
}

#[test]
fn broken_schema_leaves_the_store_empty() {
    let db = Database::open_in_memory().unwrap();
    let err = initialize_schema(&db, "CREATE TABLE a (x TEXT); CREATE TABLE oops (;").unwrap_err();
    assert_matches!(err, DaedalusError::Schema(_));
    assert!(db.is_empty().unwrap());
}

#[test]
fn every_schema_table_gets_identifier_indexes() {
    let db = Database::open_in_memory().unwrap();
    initialize_schema(&db, SCHEMA).unwrap();
    let created = create_identifier_indexes(&db, ID_COLUMNS).unwrap();
    assert!(created.contains(&"gene_ids_ensg_index".to_string()));
    assert!(created.contains(&"tcdb_ids_tcid_family_index".to_string()));
    assert!(!created.iter().any(|name| name.starts_with("tcdb_types_type_name")));
}

#[test]
fn fixups_run_in_order_and_count_statements() {
    let db = Database::open_in_memory().unwrap();
    db.execute_script("CREATE TABLE t (id INTEGER, v TEXT); INSERT INTO t VALUES (1, 'a');")
        .unwrap();
    let scripts = Scripts(vec![
        Fixup {
            name: "01_update.sql".to_string(),
            sql: "UPDATE t SET v = 'b;c' WHERE id = 1; -- trailing\n;".to_string(),
        },
        Fixup {
            name: "02_noop.sql".to_string(),
            sql: "/* nothing matches */ DELETE FROM t WHERE id = 99;".to_string(),
        },
    ]);

    let applied = apply_post_build_fixups(&db, &scripts).unwrap();
    assert_eq!(
        applied,
        vec![
            FixupStatement { script: "01_update.sql".to_string(), position: 1, changes: 1 },
            FixupStatement { script: "02_noop.sql".to_string(), position: 1, changes: 0 },
        ]
    );
    let noops = applied.iter().filter(|statement| statement.is_noop()).collect::<Vec<_>>();
    assert_eq!(noops.len(), 1);
    assert_eq!(noops[0].script, "02_noop.sql");
    let v: String = db
        .connection()
        .query_row("SELECT v FROM t WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(v, "b;c");
}

#[test]
fn fixup_directory_is_read_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("02_second.sql"), "UPDATE t SET v = v || '2';").unwrap();
    std::fs::write(dir.path().join("01_first.sql"), "UPDATE t SET v = v || '1';").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not sql").unwrap();
    let source = DirectoryFixups::new(Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap());

    let names = source
        .discover()
        .unwrap()
        .into_iter()
        .map(|fixup| fixup.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["01_first.sql", "02_second.sql"]);

    let db = Database::open_in_memory().unwrap();
    db.execute_script("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('');").unwrap();
    apply_post_build_fixups(&db, &source).unwrap();
    let v: String = db
        .connection()
        .query_row("SELECT v FROM t", [], |row| row.get(0))
        .unwrap();
    assert_eq!(v, "12");
}

#[test]
fn missing_fixup_directory_means_no_fixups() {
    let source = DirectoryFixups::new("/nonexistent/daedalus-fixups");
    assert!(source.discover().unwrap().is_empty());
}

#[test]
fn failing_fixup_statement_is_an_error() {
    let db = Database::open_in_memory().unwrap();
    let scripts = Scripts(vec![Fixup {
        name: "bad.sql".to_string(),
        sql: "UPDATE nowhere SET v = 1;".to_string(),
    }]);
    let err = apply_post_build_fixups(&db, &scripts).unwrap_err();
    assert!(err.to_string().contains("bad.sql"));
}
