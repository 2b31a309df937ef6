use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use tempfile::Builder;

use crate::error::DaedalusError;

pub const DATABASE_NAME: &str = "db.sqlite";
pub const SNAPSHOT_NAME: &str = "datacache.json.gz";
pub const CONFIG_NAME: &str = "daedalus.json";

/// Where one generation run puts its files.
#[derive(Debug, Clone)]
pub struct Layout {
    root: Utf8PathBuf,
}

impl Layout {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn current() -> Result<Self, DaedalusError> {
        let cwd = std::env::current_dir().map_err(|err| DaedalusError::Filesystem(err.to_string()))?;
        let root = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|_| DaedalusError::Filesystem("invalid working directory path".to_string()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn database_path(&self) -> Utf8PathBuf {
        self.root.join(DATABASE_NAME)
    }

    pub fn snapshot_path(&self) -> Utf8PathBuf {
        self.root.join(SNAPSHOT_NAME)
    }

    pub fn ensure_root(&self) -> Result<(), DaedalusError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| DaedalusError::Filesystem(err.to_string()))
    }

    /// The per-user config file, e.g. `~/.config/daedalus/daedalus.json`.
    pub fn user_config_path() -> Option<Utf8PathBuf> {
        ProjectDirs::from("", "", "daedalus").and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.config_dir().join(CONFIG_NAME)).ok()
        })
    }

    /// Writes `content` next to `path` and renames it into place, creating
    /// missing parent directories.
    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), DaedalusError> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
            _ => Utf8PathBuf::from("."),
        };
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| DaedalusError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix(".daedalus-write")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| DaedalusError::Filesystem(err.to_string()))?;
        temp.write_all(content)
            .map_err(|err| DaedalusError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| DaedalusError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = Layout::new(Utf8PathBuf::from("/data/mtpdb"));
        assert!(layout.database_path().ends_with("db.sqlite"));
        assert!(layout.snapshot_path().ends_with("datacache.json.gz"));
    }

    #[test]
    fn atomic_write_creates_parents() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let target = root.join("nested").join("file.bin");
        Layout::write_bytes_atomic(&target, b"payload").unwrap();
        assert_eq!(fs::read(target.as_std_path()).unwrap(), b"payload");
    }
}
