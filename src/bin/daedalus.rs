use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use daedalus::bootstrap::{DirectoryFixups, FixupSource, NoFixups};
use daedalus::config::{ConfigLoader, CosmicEntry, DEFAULT_WORKERS, ParallelEntry};
use daedalus::error::DaedalusError;
use daedalus::fetch::HttpFetcher;
use daedalus::generate::{GenerateOptions, build_database};
use daedalus::layout::Layout;
use daedalus::orchestrator::DEFAULT_RUNNERS;
use daedalus::output::{JsonOutput, RunnerListing, TextOutput};
use daedalus::retrievers::default_hooks;

#[derive(Parser)]
#[command(name = "daedalus")]
#[command(about = "Build a database of human membrane transport proteins")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download every source and build db.sqlite")]
    Generate(GenerateArgs),
    #[command(about = "List runners in execution order")]
    Runners(RunnersArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Directory receiving db.sqlite and the cache snapshot
    output_dir: Option<Utf8PathBuf>,

    #[arg(long, requires = "cosmic_password")]
    cosmic_email: Option<String>,

    #[arg(long, requires = "cosmic_email")]
    cosmic_password: Option<String>,

    /// Only run these runners
    #[arg(long, value_delimiter = ',', conflicts_with = "skip")]
    run: Vec<String>,

    /// Run every runner except these
    #[arg(long, value_delimiter = ',')]
    skip: Vec<String>,

    /// Do not apply post-build fixup scripts
    #[arg(long)]
    skip_post: bool,

    /// Remove the cache snapshot and download everything again
    #[arg(long)]
    regen_cache: bool,

    /// Retrieve sources on N worker threads
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "4")]
    parallel: Option<usize>,

    #[arg(long)]
    fixups_dir: Option<Utf8PathBuf>,

    #[arg(long)]
    config: Option<Utf8PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RunnersArgs {
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<DaedalusError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DaedalusError) -> u8 {
    match error {
        err if err.is_configuration() => 2,
        err if err.is_fetch() => 3,
        DaedalusError::Aborted { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Runners(args) => run_runners(args),
    }
}

fn run_generate(args: GenerateArgs) -> miette::Result<()> {
    let mut config = ConfigLoader::load(args.config.as_deref())?;
    if args.output_dir.is_some() {
        config.output_dir = args.output_dir;
    }
    if !args.run.is_empty() || !args.skip.is_empty() {
        config.run = args.run;
        config.skip = args.skip;
    }
    config.skip_post |= args.skip_post;
    config.regen_cache |= args.regen_cache;
    if let Some(workers) = args.parallel {
        config.parallel = Some(ParallelEntry::Workers(workers));
    }
    if args.fixups_dir.is_some() {
        config.fixups_dir = args.fixups_dir;
    }
    if let (Some(email), Some(password)) = (args.cosmic_email, args.cosmic_password) {
        config.cosmic = Some(CosmicEntry { email, password });
    }
    let resolved = ConfigLoader::resolve_config(config)?;

    let fetcher = HttpFetcher::new()?.with_progress(std::io::stderr().is_terminal());
    let hooks = default_hooks(Arc::new(fetcher), resolved.cosmic);
    let fixups: Box<dyn FixupSource> = match resolved.fixups_dir {
        Some(dir) => Box::new(DirectoryFixups::new(dir)),
        None => Box::new(NoFixups),
    };
    let options = GenerateOptions {
        selection: resolved.selection,
        skip_post: resolved.skip_post,
        regen_cache: resolved.regen_cache,
        strategy: resolved.strategy,
    };

    let layout = Layout::new(resolved.output_dir);
    let report = build_database(&layout, &options, hooks, fixups.as_ref())?;
    if args.json {
        JsonOutput::print_report(&report).into_diagnostic()?;
    } else {
        TextOutput::print_report(&report).into_diagnostic()?;
    }
    report.into_result()?;
    Ok(())
}

fn run_runners(args: RunnersArgs) -> miette::Result<()> {
    let listings = DEFAULT_RUNNERS.iter().map(RunnerListing::from).collect::<Vec<_>>();
    if args.json {
        JsonOutput::print_runners(&listings).into_diagnostic()?;
    } else {
        TextOutput::print_runners(&listings).into_diagnostic()?;
    }
    Ok(())
}
