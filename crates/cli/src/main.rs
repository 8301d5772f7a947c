use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use vic_engine::{BotConfig, DocumentStore, DryRunStore, Pipeline, QueryService, RunReport};
use vic_mediawiki::{connect, Credentials};

mod offline;

#[derive(Parser)]
#[command(name = "vicbot")]
#[command(about = "Maintenance bot for Valued Image Candidates on Wikimedia Commons", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print the run report as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file (defaults target Wikimedia Commons)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read from the wiki but only log the edits that would be made
    #[arg(long, global = true)]
    dry_run: bool,

    /// Bot password user name, e.g. `VICbot@vicbot`
    #[arg(long, global = true, env = "VICBOT_USERNAME")]
    username: Option<String>,

    #[arg(long, global = true, env = "VICBOT_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process recently decided candidates (default)
    Run,

    /// Refresh the random sample gallery only
    Sample,

    /// Move sorted staging entries into their topic galleries only
    Sweep,

    /// Resolve a local candidate document and print it as JSON
    Inspect(InspectArgs),

    /// Re-sort a local copy of the scope index and print it
    #[command(name = "sort-index")]
    SortIndex(SortIndexArgs),

    /// Print the effective configuration as TOML
    #[command(name = "print-config")]
    PrintConfig,
}

#[derive(Args)]
struct InspectArgs {
    /// File holding the candidate document's wikitext
    file: PathBuf,

    /// Candidate identifier (defaults to the file name)
    #[arg(long)]
    identifier: Option<String>,
}

#[derive(Args)]
struct SortIndexArgs {
    /// File holding the scope index wikitext
    file: PathBuf,
}

/// Wiki-facing subcommands
#[derive(Clone, Copy)]
enum Job {
    Run,
    Sample,
    Sweep,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    if !cli.verbose {
        builder.filter_module("reqwest", log::LevelFilter::Warn);
        builder.filter_module("hyper", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = offline::load_config(cli.config.as_deref())?;

    let job = match &cli.command {
        None | Some(Commands::Run) => Job::Run,
        Some(Commands::Sample) => Job::Sample,
        Some(Commands::Sweep) => Job::Sweep,
        Some(Commands::Inspect(args)) => {
            let inspection = offline::inspect(&args.file, args.identifier.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&inspection)?);
            return Ok(exit_code(inspection.is_resolved()));
        }
        Some(Commands::SortIndex(args)) => {
            print!("{}", offline::sort_index(&args.file)?);
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::PrintConfig) => {
            print!("{}", offline::render_config(&config)?);
            return Ok(ExitCode::SUCCESS);
        }
    };

    let credentials = credentials(cli.username, cli.password)?;
    if credentials.is_none() && !cli.dry_run {
        log::warn!("Running without credentials; every edit will be refused");
    }
    let (store, query) = connect(&config, credentials.as_ref())
        .await
        .with_context(|| format!("Failed to connect to {}", config.api_url))?;

    let outcome = if cli.dry_run {
        execute(Pipeline::new(DryRunStore::new(store), query, config), job).await
    } else {
        execute(Pipeline::new(store, query, config), job).await
    };

    match outcome {
        Ok(report) => {
            print_report(&report, cli.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_fatal() => {
            log::error!("Run aborted: {err}");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}

fn credentials(username: Option<String>, password: Option<String>) -> Result<Option<Credentials>> {
    match (username, password) {
        (Some(username), Some(password)) => Ok(Some(Credentials { username, password })),
        (None, None) => Ok(None),
        _ => bail!("--username and --password must be given together"),
    }
}

/// Run one wiki-facing job. Partial jobs log their diagnostics and leave the
/// diagnostics page of the last full run in place.
async fn execute<S, Q>(mut pipeline: Pipeline<S, Q>, job: Job) -> vic_engine::Result<RunReport>
where
    S: DocumentStore,
    Q: QueryService,
{
    match job {
        Job::Run => return pipeline.run().await,
        Job::Sample => pipeline.refresh_sample().await,
        Job::Sweep => pipeline.sweep_moves().await,
    }

    let mut report = pipeline.report().clone();
    report.diagnostics = pipeline.diagnostics().len();
    Ok(report)
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        log::info!(
            "Discovered {}, processed {} (promoted {}, rejected {}), skipped {}; {} save(s), {} diagnostic(s) in {} ms",
            report.discovered,
            report.processed(),
            report.promoted,
            report.rejected,
            report.skipped,
            report.saved,
            report.diagnostics,
            report.time_ms
        );
    }
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
