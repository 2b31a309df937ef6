//! Daedalus: runs every transform runner against the store, in a fixed order,
//! and collects failures instead of stopping at the first one.

use std::backtrace::Backtrace;
use std::collections::BTreeSet;
use std::error::Error as _;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cache::{ResourceCache, panic_message};
use crate::db::Database;
use crate::domain::{CacheKey, RunnerId};
use crate::error::DaedalusError;
use crate::transforms::{self, Inputs, Transform};

/// A runner: its cache inputs by parameter name, constant arguments and the
/// transform producing its load statements.
#[derive(Clone, Copy)]
pub struct RunnerBinding {
    pub id: RunnerId,
    pub inputs: &'static [(&'static str, CacheKey)],
    pub args: &'static [(&'static str, &'static str)],
    pub transform: Transform,
}

impl RunnerBinding {
    pub const fn new(
        id: RunnerId,
        inputs: &'static [(&'static str, CacheKey)],
        transform: Transform,
    ) -> Self {
        Self {
            id,
            inputs,
            args: &[],
            transform,
        }
    }

    pub const fn with_args(mut self, args: &'static [(&'static str, &'static str)]) -> Self {
        self.args = args;
        self
    }

    pub fn cache_keys(&self) -> Vec<CacheKey> {
        let mut keys = Vec::new();
        for (_, key) in self.inputs {
            if !keys.contains(key) {
                keys.push(*key);
            }
        }
        keys
    }
}

const MART: &[(&str, CacheKey)] = &[("mart_data", CacheKey::Biomart)];
const IUPHAR_CASTED: &[(&str, CacheKey)] = &[("iuphar_casted", CacheKey::IupharCompiled)];
const IUPHAR_DUMP: &[(&str, CacheKey)] = &[("iuphar", CacheKey::Iuphar)];
const HUGO: &[(&str, CacheKey)] = &[("hugo", CacheKey::Hugo)];

/// Every runner, in execution order.
pub const DEFAULT_RUNNERS: [RunnerBinding; 19] = [
    RunnerBinding::new(RunnerId::GeneIds, MART, transforms::ensembl::gene_ids),
    RunnerBinding::new(RunnerId::TranscriptIds, MART, transforms::ensembl::transcript_ids),
    RunnerBinding::new(RunnerId::RefseqMrna, MART, transforms::ensembl::refseq_mrna),
    RunnerBinding::new(
        RunnerId::ProteinStructures,
        MART,
        transforms::ensembl::protein_structures,
    ),
    RunnerBinding::new(RunnerId::GeneNames, MART, transforms::ensembl::gene_names),
    RunnerBinding::new(RunnerId::IupharTargets, IUPHAR_CASTED, transforms::iuphar::targets),
    RunnerBinding::new(RunnerId::IupharLigands, IUPHAR_CASTED, transforms::iuphar::ligands),
    RunnerBinding::new(
        RunnerId::IupharInteractions,
        IUPHAR_CASTED,
        transforms::iuphar::interactions,
    ),
    RunnerBinding::new(
        RunnerId::TcdbIds,
        &[("tcdb_data", CacheKey::Tcdb), ("mart_data", CacheKey::Biomart)],
        transforms::tcdb::tcdb_ids,
    ),
    RunnerBinding::new(
        RunnerId::TcdbDefinitions,
        &[("tcdb_data", CacheKey::Tcdb)],
        transforms::tcdb::tcdb_definitions,
    ),
    RunnerBinding::new(
        RunnerId::IonChannels,
        &[
            ("iuphar_data", CacheKey::Iuphar),
            ("hugo", CacheKey::Hugo),
            ("iuphar_compiled", CacheKey::IupharCompiled),
            ("gene_ontology", CacheKey::Go),
        ],
        transforms::channels::ion_channels,
    ),
    RunnerBinding::new(
        RunnerId::Cosmic,
        &[("cosmic", CacheKey::Cosmic), ("mart_data", CacheKey::Biomart)],
        transforms::cosmic::cosmic_genes,
    ),
    RunnerBinding::new(
        RunnerId::Aquaporins,
        &[("hugo", CacheKey::Hugo), ("patlas", CacheKey::ProteinAtlas)],
        transforms::carriers::aquaporins,
    ),
    RunnerBinding::new(
        RunnerId::SoluteCarriers,
        &[("hugo", CacheKey::Hugo), ("slc", CacheKey::Slc)],
        transforms::carriers::solute_carriers,
    ),
    RunnerBinding::new(RunnerId::AbcTransporters, HUGO, transforms::carriers::hugo_group)
        .with_args(&[("group", "ABC_transporters"), ("table", "abc_transporters")]),
    RunnerBinding::new(RunnerId::AtpDriven, HUGO, transforms::carriers::hugo_group).with_args(&[
        ("group", "atpases"),
        ("exclude", "AAA_atpases"),
        ("table", "atp_driven_transporters"),
    ]),
    RunnerBinding::new(
        RunnerId::TissueOfOrigin,
        &[("patlas", CacheKey::ProteinAtlas)],
        transforms::atlas::tissue_of_origin,
    ),
    RunnerBinding::new(RunnerId::Function, IUPHAR_DUMP, transforms::iuphar::function),
    RunnerBinding::new(RunnerId::Structure, IUPHAR_DUMP, transforms::iuphar::structure),
];

/// Which runners one pass executes, stored as the set to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSelection {
    skip: BTreeSet<RunnerId>,
}

impl RunSelection {
    pub fn all() -> Self {
        Self::default()
    }

    /// Accepts a run list or a skip list. A run list becomes the skip list of
    /// every other runner.
    pub fn resolve(run: &[RunnerId], skip: &[RunnerId]) -> Result<Self, DaedalusError> {
        if !run.is_empty() && !skip.is_empty() {
            return Err(DaedalusError::ConflictingSelection);
        }
        let skip = if run.is_empty() {
            skip.iter().copied().collect()
        } else {
            RunnerId::ALL
                .into_iter()
                .filter(|id| !run.contains(id))
                .collect()
        };
        Ok(Self { skip })
    }

    /// Like [`RunSelection::resolve`], from runner names.
    pub fn from_names<S: AsRef<str>>(run: &[S], skip: &[S]) -> Result<Self, DaedalusError> {
        if !run.is_empty() && !skip.is_empty() {
            return Err(DaedalusError::ConflictingSelection);
        }
        let parse = |names: &[S]| {
            names
                .iter()
                .map(|name| name.as_ref().parse::<RunnerId>())
                .collect::<Result<Vec<_>, _>>()
        };
        Self::resolve(&parse(run)?, &parse(skip)?)
    }

    pub fn skip_set(&self) -> &BTreeSet<RunnerId> {
        &self.skip
    }

    pub fn includes(&self, id: RunnerId) -> bool {
        !self.skip.contains(&id)
    }
}

/// Where a runner failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Acquire,
    Transform,
    Apply,
}

#[derive(Debug)]
pub struct RunFailure {
    pub runner: RunnerId,
    pub stage: FailureStage,
    pub error: DaedalusError,
    pub trace: String,
}

#[derive(Debug)]
pub enum RunOutcome {
    Applied { runner: RunnerId, statements: usize },
    Skipped { runner: RunnerId },
    Failed(RunFailure),
}

impl RunOutcome {
    pub fn runner(&self) -> RunnerId {
        match self {
            RunOutcome::Applied { runner, .. } | RunOutcome::Skipped { runner } => *runner,
            RunOutcome::Failed(failure) => failure.runner,
        }
    }
}

/// Outcomes of one pass, in execution order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<RunOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &RunFailure> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RunOutcome::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    pub fn failed_runners(&self) -> Vec<RunnerId> {
        self.failures().map(|failure| failure.runner).collect()
    }

    pub fn applied_runners(&self) -> Vec<RunnerId> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                RunOutcome::Applied { runner, .. } => Some(*runner),
                _ => None,
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Folds the pass into one result: any failed runner aborts.
    pub fn into_result(self) -> Result<Self, DaedalusError> {
        if self.is_success() {
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

pub struct Daedalus<'a> {
    db: &'a Database,
    cache: &'a ResourceCache,
    runners: Vec<RunnerBinding>,
}

impl<'a> Daedalus<'a> {
    /// Binds the default runners. Touches neither the cache nor the store.
    pub fn new(db: &'a Database, cache: &'a ResourceCache) -> Self {
        Self::with_runners(db, cache, DEFAULT_RUNNERS.to_vec())
    }

    pub fn with_runners(
        db: &'a Database,
        cache: &'a ResourceCache,
        runners: Vec<RunnerBinding>,
    ) -> Self {
        Self { db, cache, runners }
    }

    pub fn runners(&self) -> &[RunnerBinding] {
        &self.runners
    }

    /// Runs every runner not in `skip`, then logs the trace of every failure.
    ///
    /// Runner failures are collected into the report. An unusable cache
    /// snapshot stops the pass at once and is returned as the error.
    pub fn run(&self, skip: &BTreeSet<RunnerId>) -> Result<RunReport, DaedalusError> {
        if !skip.contains(&RunnerId::Cosmic)
            && self.runners.iter().any(|runner| runner.id == RunnerId::Cosmic)
            && !self.cache.is_registered(CacheKey::Cosmic)
        {
            warn!("COSMIC data is not available but the 'cosmic' runner is not skipped; it will fail");
        }

        let total = self.runners.len();
        let mut report = RunReport::default();
        for (i, binding) in self.runners.iter().enumerate() {
            let position = i + 1;
            if skip.contains(&binding.id) {
                info!("[ {position} / {total} ] Skipped {}", binding.id);
                report.outcomes.push(RunOutcome::Skipped { runner: binding.id });
                continue;
            }

            info!("[ {position} / {total} ] Running {}", binding.id);
            let started = Instant::now();
            match self.run_one(binding) {
                Ok(statements) => {
                    debug!(
                        runner = %binding.id,
                        statements,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "runner applied"
                    );
                    report.outcomes.push(RunOutcome::Applied {
                        runner: binding.id,
                        statements,
                    });
                }
                Err(Halt::Fatal(err)) => {
                    error!("Runner '{}' hit an unusable cache snapshot: {err}", binding.id);
                    return Err(err);
                }
                Err(Halt::Failed(failure)) => {
                    error!(
                        "Runner '{}' failed during {:?}: {}. Continuing before dumping error info.",
                        binding.id, failure.stage, failure.error
                    );
                    report.outcomes.push(RunOutcome::Failed(failure));
                }
            }
        }

        if !report.is_success() {
            info!("dumping failure traces");
            for failure in report.failures() {
                error!(
                    "Runner {} failed with error >> {} <<. Dumped trace:\n-----------------------------\n{}",
                    failure.runner, failure.error, failure.trace
                );
            }
        }
        Ok(report)
    }

    fn run_one(&self, binding: &RunnerBinding) -> Result<usize, Halt> {
        let fail = |stage, error: DaedalusError, backtrace: Option<String>| {
            let trace = failure_trace(stage, &error, backtrace);
            Halt::Failed(RunFailure {
                runner: binding.id,
                stage,
                error,
                trace,
            })
        };

        let mut inputs = Inputs::new();
        for (name, key) in binding.inputs {
            let acquired = self.cache.acquire(*key).map_err(|err| {
                if err.is_snapshot() {
                    Halt::Fatal(err)
                } else {
                    fail(FailureStage::Acquire, err, None)
                }
            })?;
            inputs.insert(*name, acquired.into_inner());
        }
        for (name, value) in binding.args {
            inputs.set_arg(*name, *value);
        }

        let statements = match catch_unwind(AssertUnwindSafe(|| (binding.transform)(&mut inputs))) {
            Ok(Ok(statements)) => statements,
            Ok(Err(err)) => return Err(fail(FailureStage::Transform, err, None)),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                let backtrace = Backtrace::force_capture().to_string();
                return Err(fail(
                    FailureStage::Transform,
                    DaedalusError::Transform(format!("runner panicked: {message}")),
                    Some(backtrace),
                ));
            }
        };
        drop(inputs);

        self.apply(&statements)
            .map_err(|err| fail(FailureStage::Apply, err, None))?;
        Ok(statements.len())
    }

    /// Applies one runner's statements in a single transaction, so a rejected
    /// statement leaves none of that runner's rows behind.
    fn apply(&self, statements: &[String]) -> Result<(), DaedalusError> {
        self.db.execute_script("BEGIN;")?;
        for (i, statement) in statements.iter().enumerate() {
            if let Err(err) = self.db.execute_script(statement) {
                let _ = self.db.execute_script("ROLLBACK;");
                return Err(DaedalusError::Database(format!(
                    "statement {} of {}: {err}",
                    i + 1,
                    statements.len()
                )));
            }
        }
        self.db.execute_script("COMMIT;")
    }
}

enum Halt {
    Failed(RunFailure),
    Fatal(DaedalusError),
}

fn failure_trace(stage: FailureStage, error: &DaedalusError, backtrace: Option<String>) -> String {
    let mut trace = format!("stage: {stage:?}\nerror: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str(&format!("\ncaused by: {cause}"));
        source = cause.source();
    }
    let backtrace = backtrace.unwrap_or_else(|| Backtrace::capture().to_string());
    if !backtrace.is_empty() && !backtrace.starts_with("disabled") {
        trace.push_str("\nbacktrace:\n");
        trace.push_str(&backtrace);
    }
    trace
}

/// Runs the selected runners and folds the report.
pub fn populate_database(
    db: &Database,
    cache: &ResourceCache,
    selection: &RunSelection,
) -> Result<RunReport, DaedalusError> {
    Daedalus::new(db, cache).run(selection.skip_set())?.into_result()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn default_runners_follow_runner_order() {
        let ids = DEFAULT_RUNNERS.iter().map(|runner| runner.id).collect::<Vec<_>>();
        assert_eq!(ids, RunnerId::ALL.to_vec());
    }

    #[test]
    fn run_list_becomes_complement() {
        let selection = RunSelection::resolve(&[RunnerId::GeneIds], &[]).unwrap();
        assert!(selection.includes(RunnerId::GeneIds));
        assert_eq!(selection.skip_set().len(), RunnerId::ALL.len() - 1);
    }

    #[test]
    fn both_lists_conflict() {
        let err = RunSelection::from_names(&["gene_ids"], &["cosmic"]).unwrap_err();
        assert_matches!(err, DaedalusError::ConflictingSelection);
        let err = RunSelection::from_names(&["genes"], &[]).unwrap_err();
        assert_matches!(err, DaedalusError::UnknownRunner(_));
    }

    #[test]
    fn cache_keys_are_unique() {
        let channels = DEFAULT_RUNNERS
            .iter()
            .find(|runner| runner.id == RunnerId::IonChannels)
            .unwrap();
        assert_eq!(channels.cache_keys().len(), 4);
    }
}
