use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::PopulateStrategy;
use crate::error::DaedalusError;
use crate::layout::{CONFIG_NAME, Layout};
use crate::orchestrator::RunSelection;
use crate::retrievers::CosmicCredentials;

/// Worker count used when parallel population is asked for without a size.
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub output_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub run: Vec<String>,
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub skip_post: bool,
    #[serde(default)]
    pub regen_cache: bool,
    #[serde(default)]
    pub parallel: Option<ParallelEntry>,
    #[serde(default)]
    pub fixups_dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub cosmic: Option<CosmicEntry>,
}

/// `"parallel": true` or `"parallel": 8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParallelEntry {
    Enabled(bool),
    Workers(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CosmicEntry {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub output_dir: Utf8PathBuf,
    pub selection: RunSelection,
    pub skip_post: bool,
    pub regen_cache: bool,
    pub strategy: PopulateStrategy,
    pub fixups_dir: Option<Utf8PathBuf>,
    pub cosmic: Option<CosmicCredentials>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&Utf8Path>) -> Result<ResolvedConfig, DaedalusError> {
        Self::resolve_config(Self::load(path)?)
    }

    /// Reads the config file. An explicit path must exist; otherwise
    /// `daedalus.json` in the working directory, then the per-user config
    /// file, are tried and a missing file means defaults.
    pub fn load(path: Option<&Utf8Path>) -> Result<Config, DaedalusError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let candidates = [Some(Utf8PathBuf::from(CONFIG_NAME)), Layout::user_config_path()];
                match candidates.into_iter().flatten().find(|path| path.exists()) {
                    Some(path) => path,
                    None => return Ok(Config::default()),
                }
            }
        };
        debug!(path = %config_path, "reading config");

        let content = fs::read_to_string(&config_path)
            .map_err(|_| DaedalusError::ConfigRead(config_path.clone().into_std_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| DaedalusError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, DaedalusError> {
        let selection = RunSelection::from_names(&config.run, &config.skip)?;
        let strategy = match config.parallel {
            None | Some(ParallelEntry::Enabled(false)) => PopulateStrategy::Sequential,
            Some(ParallelEntry::Enabled(true)) => PopulateStrategy::Parallel {
                workers: DEFAULT_WORKERS,
            },
            Some(ParallelEntry::Workers(workers)) => PopulateStrategy::Parallel {
                workers: workers.max(1),
            },
        };

        Ok(ResolvedConfig {
            output_dir: config.output_dir.unwrap_or_else(|| Utf8PathBuf::from(".")),
            selection,
            skip_post: config.skip_post,
            regen_cache: config.regen_cache,
            strategy,
            fixups_dir: config.fixups_dir,
            cosmic: config
                .cosmic
                .map(|entry| CosmicCredentials::new(entry.email, entry.password)),
        })
    }
}
