//! One full database build: schema, cache, runners, fixups, indexes.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::bootstrap::{self, FixupSource, ID_COLUMNS, SCHEMA};
use crate::cache::{CacheSource, HookRegistry, PopulateStrategy, ResourceCache};
use crate::db::Database;
use crate::domain::RunnerId;
use crate::error::DaedalusError;
use crate::layout::Layout;
use crate::orchestrator::{Daedalus, FailureStage, RunOutcome, RunSelection};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub selection: RunSelection,
    pub skip_post: bool,
    pub regen_cache: bool,
    pub strategy: PopulateStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunnerSummary {
    pub runner: RunnerId,
    pub status: RunnerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FailureStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerStatus {
    Applied,
    Skipped,
    Failed,
}

impl From<&RunOutcome> for RunnerSummary {
    fn from(outcome: &RunOutcome) -> Self {
        match outcome {
            RunOutcome::Applied { runner, statements } => Self {
                runner: *runner,
                status: RunnerStatus::Applied,
                statements: Some(*statements),
                stage: None,
                error: None,
            },
            RunOutcome::Skipped { runner } => Self {
                runner: *runner,
                status: RunnerStatus::Skipped,
                statements: None,
                stage: None,
                error: None,
            },
            RunOutcome::Failed(failure) => Self {
                runner: failure.runner,
                status: RunnerStatus::Failed,
                statements: None,
                stage: Some(failure.stage),
                error: Some(failure.error.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub database: Utf8PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cache_source: Option<CacheSource>,
    /// Set when a runner failed; fixups and indexes were then not applied.
    pub aborted: bool,
    pub runners: Vec<RunnerSummary>,
    /// `None` when post-build fixups were skipped or the build aborted.
    pub fixups_applied: Option<usize>,
    /// Fixup statements that changed no rows, as `script [position]`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub noop_fixups: Vec<String>,
    pub indexes: Vec<String>,
}

impl GenerationReport {
    pub fn failed_runners(&self) -> Vec<RunnerId> {
        self.runners
            .iter()
            .filter(|summary| summary.status == RunnerStatus::Failed)
            .map(|summary| summary.runner)
            .collect()
    }

    /// Folds an aborted build into [`DaedalusError::Aborted`].
    pub fn into_result(self) -> Result<Self, DaedalusError> {
        if !self.aborted {
            return Ok(self);
        }
        Err(DaedalusError::Aborted {
            failed: self
                .failed_runners()
                .into_iter()
                .map(|id| id.to_string())
                .collect(),
        })
    }
}

/// Builds `db.sqlite` under `layout`, failing with
/// [`DaedalusError::Aborted`] if any runner failed.
pub fn generate_database(
    layout: &Layout,
    options: &GenerateOptions,
    hooks: HookRegistry,
    fixups: &dyn FixupSource,
) -> Result<GenerationReport, DaedalusError> {
    build_database(layout, options, hooks, fixups)?.into_result()
}

/// Builds `db.sqlite` under `layout` from the datasets `hooks` produce.
///
/// Refuses to touch an existing database, and creates none when the cache
/// cannot be populated. A failed runner does not stop later runners; the
/// returned report is then marked aborted and fixups and indexes are skipped.
pub fn build_database(
    layout: &Layout,
    options: &GenerateOptions,
    hooks: HookRegistry,
    fixups: &dyn FixupSource,
) -> Result<GenerationReport, DaedalusError> {
    let started_at = Utc::now();
    let database = layout.database_path();
    if database.as_std_path().exists() {
        return Err(DaedalusError::DatabaseExists(database.into_std_path_buf()));
    }
    layout.ensure_root()?;

    let cache = ResourceCache::new(hooks)
        .with_snapshot(layout.snapshot_path())
        .with_strategy(options.strategy);
    if options.regen_cache && cache.invalidate_snapshot()? {
        info!("regenerating cache from source");
    }
    let selected = RunnerId::ALL
        .into_iter()
        .filter(|id| options.selection.includes(*id))
        .count();
    if selected > 0 {
        cache.populate()?;
    }

    info!(path = %database, "creating database");
    let db = Database::open(&database)?;
    bootstrap::initialize_schema(&db, SCHEMA)?;

    let report = Daedalus::new(&db, &cache).run(options.selection.skip_set())?;
    let runners = report.outcomes.iter().map(RunnerSummary::from).collect::<Vec<_>>();
    let mut generation = GenerationReport {
        database,
        started_at,
        finished_at: started_at,
        cache_source: cache.source(),
        aborted: !report.is_success(),
        runners,
        fixups_applied: None,
        noop_fixups: Vec::new(),
        indexes: Vec::new(),
    };
    if let Err(err) = report.into_result() {
        error!("{err}");
        db.close()?;
        generation.finished_at = Utc::now();
        return Ok(generation);
    }

    if options.skip_post {
        info!("skipping post-build hooks");
    } else {
        info!("executing post-build hooks");
        let applied = bootstrap::apply_post_build_fixups(&db, fixups)?;
        generation.noop_fixups = applied
            .iter()
            .filter(|statement| statement.is_noop())
            .map(|statement| format!("{} [{}]", statement.script, statement.position))
            .collect();
        generation.fixups_applied = Some(applied.len());
    }

    info!("creating identifier indexes");
    generation.indexes = bootstrap::create_identifier_indexes(&db, ID_COLUMNS)?;
    db.close()?;

    generation.finished_at = Utc::now();
    info!(
        elapsed_s = (generation.finished_at - started_at).num_seconds(),
        "finished building the database"
    );
    Ok(generation)
}
