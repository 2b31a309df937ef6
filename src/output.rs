use std::io::{self, Write};

use serde::Serialize;

use crate::domain::{CacheKey, RunnerId};
use crate::generate::GenerationReport;
use crate::orchestrator::RunnerBinding;

/// One runner and the cache entries it reads.
#[derive(Debug, Serialize)]
pub struct RunnerListing {
    pub runner: RunnerId,
    pub inputs: Vec<CacheKey>,
}

impl From<&RunnerBinding> for RunnerListing {
    fn from(binding: &RunnerBinding) -> Self {
        Self {
            runner: binding.id,
            inputs: binding.cache_keys(),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &GenerationReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_runners(runners: &[RunnerListing]) -> io::Result<()> {
        Self::print_json(&runners)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_report(report: &GenerationReport) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "database: {}", report.database)?;
        for summary in &report.runners {
            match summary.statements {
                Some(statements) => writeln!(
                    stdout,
                    "  {:<20} {:?} ({statements} statements)",
                    summary.runner.as_str(),
                    summary.status
                )?,
                None => writeln!(stdout, "  {:<20} {:?}", summary.runner.as_str(), summary.status)?,
            }
        }
        if report.aborted {
            writeln!(stdout, "aborted: fixups and indexes were not applied")?;
        }
        if let Some(applied) = report.fixups_applied {
            writeln!(stdout, "fixup statements: {applied}")?;
        }
        for noop in &report.noop_fixups {
            writeln!(stdout, "  no rows changed: {noop}")?;
        }
        writeln!(stdout, "indexes: {}", report.indexes.len())?;
        Ok(())
    }

    pub fn print_runners(runners: &[RunnerListing]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for listing in runners {
            let inputs = listing
                .inputs
                .iter()
                .map(|key| key.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(stdout, "{:<20} {inputs}", listing.runner.as_str())?;
        }
        Ok(())
    }
}
