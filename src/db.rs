use camino::Utf8Path;
use rusqlite::Connection;

use crate::error::DaedalusError;

/// The relational store the runners load into.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Utf8Path) -> Result<Self, DaedalusError> {
        let conn = Connection::open(path.as_std_path())
            .map_err(|err| DaedalusError::Database(format!("cannot open {path}: {err}")))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, DaedalusError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| DaedalusError::Database(format!("cannot open in-memory store: {err}")))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs a multi-statement script.
    pub fn execute_script(&self, script: &str) -> Result<(), DaedalusError> {
        self.conn.execute_batch(script)?;
        Ok(())
    }

    /// Runs one statement and returns the number of rows it changed.
    pub fn execute(&self, statement: &str) -> Result<u64, DaedalusError> {
        self.conn.execute_batch(statement)?;
        self.last_changes()
    }

    /// Rows changed by the most recent statement.
    pub fn last_changes(&self) -> Result<u64, DaedalusError> {
        let changes: i64 = self.conn.query_row("SELECT changes();", [], |row| row.get(0))?;
        Ok(changes.max(0) as u64)
    }

    /// User tables, in name order.
    pub fn table_names(&self) -> Result<Vec<String>, DaedalusError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name;",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn table_columns(&self, table: &str) -> Result<Vec<String>, DaedalusError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid;")?;
        let columns = stmt
            .query_map([table], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(columns)
    }

    pub fn is_empty(&self) -> Result<bool, DaedalusError> {
        let objects: i64 = self.conn.query_row(
            "SELECT count(*) FROM sqlite_master WHERE name NOT LIKE 'sqlite_%';",
            [],
            |row| row.get(0),
        )?;
        Ok(objects == 0)
    }

    pub fn row_count(&self, table: &str) -> Result<u64, DaedalusError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT count(*) FROM {};", quote_identifier(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    pub fn close(self) -> Result<(), DaedalusError> {
        self.conn
            .close()
            .map_err(|(_, err)| DaedalusError::Database(format!("cannot close store: {err}")))
    }
}

/// Double-quotes an SQL identifier.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quotes an SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn introspects_tables_and_columns() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.is_empty().unwrap());
        db.execute_script("CREATE TABLE b (x); CREATE TABLE a (ensg, name);")
            .unwrap();
        assert_eq!(db.table_names().unwrap(), vec!["a", "b"]);
        assert_eq!(db.table_columns("a").unwrap(), vec!["ensg", "name"]);
        assert!(!db.is_empty().unwrap());
    }

    #[test]
    fn execute_reports_changes() {
        let db = Database::open_in_memory().unwrap();
        db.execute_script("CREATE TABLE t (v);").unwrap();
        assert_eq!(db.execute("INSERT INTO t VALUES (1), (2);").unwrap(), 2);
        assert_eq!(db.execute("UPDATE t SET v = 3 WHERE v = 9;").unwrap(), 0);
        assert_eq!(db.row_count("t").unwrap(), 2);
    }

    #[test]
    fn quoting_escapes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
