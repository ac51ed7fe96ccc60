use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use kite_classpath::IndexReport;
use kite_config::KiteConfig;
use kite_matcher::{CandidateUnit, MatchMode};
use kite_source::{ParsedSource, SourceError};
use kite_workspace::{CacheStatus, Workspace};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "kite", version, about = "Kite CLI (class index, members, completion, cache)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the project's classpath and persist the index
    Index(IndexArgs),
    /// List the members of a class, inherited ones included
    Members(MembersArgs),
    /// Complete a class name against the index
    Classes(ClassesArgs),
    /// Inspect or clear the project's persisted caches
    Cache(CacheArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// Project root (defaults to current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Extra classpath entry (class directory, jar or jmod); repeatable
    #[arg(long = "classpath", value_name = "ENTRY")]
    classpath: Vec<PathBuf>,
    /// Leave the JDK off the classpath
    #[arg(long)]
    no_jdk: bool,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct IndexArgs {
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Args)]
struct MembersArgs {
    /// Fully qualified class name (`java.util.Map.Entry` or `java.util.Map$Entry`)
    class: String,
    /// Only members matching this query
    #[arg(long)]
    query: Option<String>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Args)]
struct ClassesArgs {
    /// Partial class name
    query: String,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Maximum number of results (0 for all)
    #[arg(long)]
    limit: Option<usize>,
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Args)]
struct CacheArgs {
    #[command(subcommand)]
    command: CacheCommand,
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Show what is persisted for the project
    Status(ProjectArgs),
    /// Delete every persisted record of the project
    Clean(ProjectArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Prefix,
    Exact,
    Contains,
    CamelCase,
    Fuzzy,
    Auto,
}

impl From<ModeArg> for MatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Prefix => MatchMode::Prefix,
            ModeArg::Exact => MatchMode::Exact,
            ModeArg::Contains => MatchMode::Contains,
            ModeArg::CamelCase => MatchMode::CamelCase,
            ModeArg::Fuzzy => MatchMode::Fuzzy,
            ModeArg::Auto => MatchMode::Auto,
        }
    }
}

/// The CLI only inspects compiled classes; source queries have no front end.
struct NoFrontEnd;

impl kite_source::SourceParser for NoFrontEnd {
    fn parse(&self, path: &Path, _text: &str) -> kite_source::Result<ParsedSource> {
        Err(SourceError::parse(path, "no source front end is available in the CLI"))
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Index(args) => {
            let ws = open_workspace(&args.project, |_| {})?;
            let report = ws.build_index();
            let summary = IndexSummary::new(ws.root(), &report);
            ws.close()?;
            print_index_summary(&summary, args.project.json)?;
            Ok(if report.entries_failed > 0 { 1 } else { 0 })
        }
        Command::Members(args) => {
            let ws = open_workspace(&args.project, |config| {
                if let Some(mode) = args.mode {
                    config.completion.matcher = mode.into();
                }
                config.completion.max_results = 0;
            })?;
            ws.build_index();
            let members = ws.get_members(&args.class);
            if members.is_empty() && ws.resolve(&args.class).is_none() {
                eprintln!("members: class not found: {}", args.class);
                ws.close()?;
                return Ok(1);
            }
            let candidates: Vec<CandidateUnit> = match &args.query {
                Some(query) => ws.complete_members(&args.class, query, None),
                None => members.iter().map(CandidateUnit::from).collect(),
            };
            ws.close()?;
            print_candidates(&candidates, args.project.json)?;
            Ok(0)
        }
        Command::Classes(args) => {
            let ws = open_workspace(&args.project, |config| {
                if let Some(mode) = args.mode {
                    config.completion.matcher = mode.into();
                }
                if let Some(limit) = args.limit {
                    config.completion.max_results = limit;
                }
            })?;
            ws.build_index();
            let candidates = ws.complete_classes(&args.query, None);
            ws.close()?;
            print_candidates(&candidates, args.project.json)?;
            Ok(if candidates.is_empty() { 1 } else { 0 })
        }
        Command::Cache(args) => {
            let project = match &args.command {
                CacheCommand::Status(project) | CacheCommand::Clean(project) => project,
            };
            let ws = open_workspace(project, |_| {})?;
            match &args.command {
                CacheCommand::Status(_) => {
                    let status = CacheSummary::from(ws.cache_status()?);
                    print_cache_summary(&status, project.json)?;
                }
                CacheCommand::Clean(_) => {
                    ws.clear_cache()?;
                    if project.json {
                        print_json(&serde_json::json!({ "ok": true }))?;
                    } else {
                        println!("cache: cleaned {}", ws.root().display());
                    }
                }
            }
            ws.close()?;
            Ok(0)
        }
    }
}

fn open_workspace(args: &ProjectArgs, customize: impl FnOnce(&mut KiteConfig)) -> Result<Workspace> {
    let root = if args.path.is_file() {
        args.path
            .parent()
            .map(Path::to_path_buf)
            .context("file path has no parent directory")?
    } else {
        args.path.clone()
    };
    let (mut config, config_path) = kite_config::load_for_workspace(&root)
        .with_context(|| format!("failed to load config for {}", root.display()))?;
    config.classpath.entries.extend(args.classpath.iter().cloned());
    if args.no_jdk {
        config.classpath.include_jdk = false;
    }
    customize(&mut config);

    kite_config::init_tracing(&config.logging);
    if let Some(path) = &config_path {
        tracing::debug!(target = "kite.cli", config = %path.display(), "using config file");
    }

    Workspace::open(&root, config, Arc::new(NoFrontEnd))
        .with_context(|| format!("failed to open workspace at {}", root.display()))
}

#[derive(Serialize)]
struct IndexSummary {
    root: PathBuf,
    classes: usize,
    entries_indexed: usize,
    entries_failed: usize,
    entries_cached: usize,
    elapsed_ms: u128,
    fingerprint: String,
}

impl IndexSummary {
    fn new(root: &Path, report: &IndexReport) -> Self {
        Self {
            root: root.to_path_buf(),
            classes: report.classes,
            entries_indexed: report.entries_indexed,
            entries_failed: report.entries_failed,
            entries_cached: report.entries_cached,
            elapsed_ms: report.duration.as_millis(),
            fingerprint: report.fingerprint.to_string(),
        }
    }
}

#[derive(Serialize)]
struct CacheSummary {
    dir: Option<PathBuf>,
    member_sets: usize,
    source_snapshots: usize,
    classpath_entries: usize,
    bytes: u64,
}

impl From<CacheStatus> for CacheSummary {
    fn from(status: CacheStatus) -> Self {
        Self {
            dir: status.root,
            member_sets: status.member_sets,
            source_snapshots: status.source_snapshots,
            classpath_entries: status.classpath_entries,
            bytes: status.bytes,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

fn print_index_summary(summary: &IndexSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    println!("indexed: {}", summary.root.display());
    println!("  classes: {}", summary.classes);
    println!("  entries_indexed: {}", summary.entries_indexed);
    println!("  entries_cached: {}", summary.entries_cached);
    println!("  entries_failed: {}", summary.entries_failed);
    println!("  elapsed_ms: {}", summary.elapsed_ms);
    Ok(())
}

fn print_candidates(candidates: &[CandidateUnit], json: bool) -> Result<()> {
    if json {
        return print_json(&candidates);
    }
    for candidate in candidates {
        println!("{}", candidate.declaration);
    }
    Ok(())
}

fn print_cache_summary(summary: &CacheSummary, json: bool) -> Result<()> {
    if json {
        return print_json(summary);
    }
    println!("cache:");
    match &summary.dir {
        Some(dir) => println!("  dir: {}", dir.display()),
        None => println!("  dir: (disabled)"),
    }
    println!("  member_sets: {}", summary.member_sets);
    println!("  source_snapshots: {}", summary.source_snapshots);
    println!("  classpath_entries: {}", summary.classpath_entries);
    println!("  bytes: {}", summary.bytes);
    Ok(())
}
