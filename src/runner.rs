use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, trace};

use crate::bulk::{self, BulkMode, BulkSpec};
use crate::cli::{BuildArgs, BulkArgs, Cli, Command, ConfigCommand, TargetArgs};
use crate::config::{self, ConfigPathSource, RepoTreeConfig};
use crate::confirm::{Confirm, FixedAnswer, TerminalPrompt};
use crate::gitops::{self, GitOutcome};
use crate::materialize::Materializer;
use crate::report::{Event, Reporter, TracingReporter};
use crate::tree::RepoSpec;
use crate::{schema, templates};

/// How a command finished when it did not fail outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Some entries could not be created or the schema was rejected.
    PartialFailure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::PartialFailure => ExitCode::from(2),
        }
    }
}

pub fn run(cli: Cli) -> Result<Outcome> {
    let ctx = CliContext::from(&cli);
    ctx.apply_chdir()?;

    match cli.command {
        Command::Config { command } => {
            handle_config(&ctx, command)?;
            Ok(Outcome::Success)
        }
        other => {
            let state = AppState::new(ctx)?;
            handle_with_state(&state, other)
        }
    }
}

fn handle_with_state(state: &AppState, command: Command) -> Result<Outcome> {
    match command {
        Command::Build(args) => handle_build(state, args),
        Command::Example(args) => handle_example(state, args),
        Command::Bulk(args) => handle_bulk(state, args),
        Command::Config { .. } => unreachable!("config commands handled earlier"),
    }
}

fn handle_build(state: &AppState, args: BuildArgs) -> Result<Outcome> {
    let schema_path = utf8(args.schema, "schema path")?;
    let mut reporter = TracingReporter::default();
    let Some(spec) = schema::load_or_report(&schema_path, &mut reporter) else {
        println!("No layout loaded from {}; nothing created.", schema_path);
        return Ok(outcome_for(reporter.failures()));
    };
    create_layout(state, &spec, &args.target, &mut reporter)
}

fn handle_example(state: &AppState, args: TargetArgs) -> Result<Outcome> {
    let raw = templates::get_string(templates::EXAMPLE_SCHEMA)?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("parsing bundled example layout")?;
    let spec = schema::from_value(&value)?
        .ok_or_else(|| anyhow!("bundled example layout is empty"))?;
    let mut reporter = TracingReporter::default();
    create_layout(state, &spec, &args, &mut reporter)
}

fn create_layout(
    state: &AppState,
    spec: &RepoSpec,
    target: &TargetArgs,
    reporter: &mut TracingReporter,
) -> Result<Outcome> {
    let base = utf8(target.base.clone(), "base directory")?;
    let (dirs, files) = spec.root.counts();
    info!(
        "Creating `{}` in {} ({} directories, {} files)",
        spec.name, base, dirs, files
    );

    let summary = Materializer::new().materialize(spec, &base, reporter)?;
    let root = base.join(&spec.name);
    if summary.is_clean() {
        println!(
            "[ok] Created {} directories and {} files under {}",
            summary.directories, summary.files, root
        );
    } else {
        println!(
            "[warn] Created {} directories and {} files under {}; {} entries failed",
            summary.directories, summary.files, root, summary.failures
        );
    }

    if target.no_git || !state.config.git.enabled {
        return Ok(outcome_for(reporter.failures()));
    }

    let mut confirm = state.ctx.confirmer();
    let settings = state.config.git.settings();
    match gitops::init_repository(&root, &settings, confirm.as_mut(), reporter)? {
        GitOutcome::Committed => println!("Initialized and committed git repository in {}", root),
        GitOutcome::Initialized => println!("Initialized git repository in {}", root),
        GitOutcome::Skipped => println!("Skipped git setup for {}", root),
    }
    Ok(outcome_for(reporter.failures()))
}

fn handle_bulk(state: &AppState, args: BulkArgs) -> Result<Outcome> {
    let defaults = &state.config.bulk;
    let spec = BulkSpec {
        repo_name: args.name,
        dir_count: args.dirs,
        file_count: args.files,
        nesting_depth: args.depth,
        file_name_prefix: args.file_prefix.unwrap_or_else(|| defaults.file_prefix.clone()),
        dir_name_prefix: args.dir_prefix.unwrap_or_else(|| defaults.dir_prefix.clone()),
        file_extension: args.extension.unwrap_or_else(|| defaults.extension.clone()),
        file_content: args.content.unwrap_or_else(|| defaults.content.clone()),
    };
    let mode = if args.nested {
        BulkMode::Nested
    } else {
        BulkMode::Flat
    };
    let base = utf8(args.base, "base directory")?;

    let mut confirm = state.ctx.confirmer();
    let mut reporter = BulkReporter::default();
    let Some(report) = bulk::run(&spec, mode, &base, confirm.as_mut(), &mut reporter)? else {
        println!("Kept existing {}; nothing generated.", base.join(&spec.repo_name));
        return Ok(Outcome::Success);
    };

    println!("[ok] {}", report.directories);
    println!("[ok] {}", report.files);
    Ok(outcome_for(report.failures))
}

/// Bulk runs create thousands of entries; only failures and phase timings
/// are worth logging at `info`.
#[derive(Default)]
struct BulkReporter {
    inner: TracingReporter,
}

impl Reporter for BulkReporter {
    fn record(&mut self, event: Event) {
        match event {
            Event::DirectoryCreated(path) | Event::FileCreated(path) => {
                trace!("created {}", path)
            }
            other => self.inner.record(other),
        }
    }
}

fn handle_config(ctx: &CliContext, command: Option<ConfigCommand>) -> Result<()> {
    let resolved = ctx.resolve_config_path()?;
    let config_path = resolved.path;
    match command {
        Some(ConfigCommand::Path) => {
            println!("Config path: {} ({})", config_path, resolved.source.as_str());
            Ok(())
        }
        None | Some(ConfigCommand::Show) => {
            if !config_path.exists() {
                println!("No config found at {}; using defaults.", config_path);
                println!("Use `repotree config generate` to scaffold one.");
            } else {
                println!("Config path: {} ({})", config_path, resolved.source.as_str());
            }
            let config = config::load_from_path(&config_path)?;
            println!("{}", config::format_summary(&config));
            Ok(())
        }
        Some(ConfigCommand::Generate { path, force }) => {
            let target = match path {
                Some(path) => utf8(path, "config generate path")?,
                None => config_path.clone(),
            };
            config::write_example_config(&target, force)?;
            if force {
                println!("Overwrote config at {}", target);
            } else {
                println!("Wrote example config to {}", target);
            }
            Ok(())
        }
    }
}

fn outcome_for(failures: usize) -> Outcome {
    if failures == 0 {
        Outcome::Success
    } else {
        Outcome::PartialFailure
    }
}

fn utf8(path: PathBuf, what: &str) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path).map_err(|_| anyhow!("{what} must be valid UTF-8"))
}

#[derive(Clone, Debug)]
struct CliContext {
    chdir: Option<PathBuf>,
    file: Option<PathBuf>,
    yes: bool,
    no: bool,
}

impl CliContext {
    fn apply_chdir(&self) -> Result<()> {
        if let Some(path) = &self.chdir {
            std::env::set_current_dir(path)
                .with_context(|| format!("changing directory to {}", path.display()))?;
        }
        Ok(())
    }

    fn resolve_config_path(&self) -> Result<config::ResolvedConfigPath> {
        let cwd = std::env::current_dir().context("determining current directory")?;
        let cwd = utf8(cwd, "current directory")?;
        config::resolve_path(self.file.as_deref(), &cwd)
    }

    fn confirmer(&self) -> Box<dyn Confirm> {
        if self.yes {
            Box::new(FixedAnswer(true))
        } else if self.no {
            Box::new(FixedAnswer(false))
        } else {
            Box::new(TerminalPrompt)
        }
    }
}

impl From<&Cli> for CliContext {
    fn from(cli: &Cli) -> Self {
        Self {
            chdir: cli.chdir.clone(),
            file: cli.file.clone(),
            yes: cli.yes,
            no: cli.no,
        }
    }
}

struct AppState {
    ctx: CliContext,
    config: RepoTreeConfig,
}

impl AppState {
    fn new(ctx: CliContext) -> Result<Self> {
        let resolved = ctx.resolve_config_path()?;
        let config = config::load_from_path(&resolved.path)?;
        log_config_source(&resolved.path, resolved.source);
        Ok(Self { ctx, config })
    }
}

fn log_config_source(path: &Utf8Path, source: ConfigPathSource) {
    if path.exists() {
        debug!("using config {} ({})", path, source.as_str());
    } else {
        debug!("no config at {}; using defaults", path);
    }
}
