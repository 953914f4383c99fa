use anyhow::{bail, Context, Result};
use dirprune::cli::{exit_code, Cli, Commands, ConfigActions, OutputFormat};
use dirprune::config::Config;
use dirprune::engine::remover::calculate_dir_size;
use dirprune::engine::{resolve, CancelToken, PruneOptions, Pruner, RunRequest, TargetName};
use dirprune::output::{ConsoleObserver, PruneReport, ScanItem, ScanReport};
use dirprune::safety::{prepare_roots, SafetyChecker};
use dirprune::utils::format_size_with;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let result = match Config::load_from(&config_path) {
        Ok(config) => run(cli, config, &config_path),
        Err(e) => Err(e),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli, config: Config, config_path: &Path) -> Result<ExitCode> {
    match cli.command {
        Commands::Scan {
            roots,
            targets,
            format,
            out,
        } => run_scan(&roots, &targets, &config, format, out.as_deref())?,
        Commands::Prune {
            roots,
            targets,
            yes,
            parallel_roots,
            workers,
            measure,
            quiet,
            format,
            out,
        } => {
            let mut options = config.prune_options();
            if let Some(n) = parallel_roots {
                options.max_parallel_roots = n.max(1);
            }
            options.max_workers = workers;
            options.measure_freed |= measure;
            return run_prune(
                &roots,
                &targets,
                options,
                PruneMode { yes, quiet },
                &config,
                format,
                out.as_deref(),
            );
        }
        Commands::Targets => {
            for name in &config.prune.targets {
                println!("{}", name);
            }
        }
        Commands::Config { action } => run_config(action, config, config_path)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn select_targets(overrides: &[String], config: &Config) -> Result<Vec<TargetName>> {
    let targets = if overrides.is_empty() {
        config.prune.targets.clone()
    } else {
        TargetName::parse_all(overrides.iter().cloned())?
    };

    if targets.is_empty() {
        bail!("no target folder names configured; add one with `dirprune config add-target`");
    }
    Ok(targets)
}

fn run_scan(
    roots: &[PathBuf],
    targets: &[String],
    config: &Config,
    format: OutputFormat,
    out: Option<&Path>,
) -> Result<()> {
    let targets = select_targets(targets, config)?;
    let roots = prepare_roots(&SafetyChecker::new(), roots)?;

    let items: Vec<ScanItem> = resolve(&roots, &targets)
        .par_iter()
        .map(|resolved| ScanItem {
            path: resolved.candidate.path.clone(),
            target: resolved.candidate.name.to_string(),
            state: resolved.liveness,
            size_bytes: resolved
                .is_live()
                .then(|| calculate_dir_size(&resolved.candidate.path)),
        })
        .collect();

    let report = ScanReport::new(
        roots,
        targets.iter().map(|t| t.to_string()).collect(),
        items,
    );

    match format {
        OutputFormat::Json => write_json(&report, out)?,
        OutputFormat::Human => {
            let raw = config.output.show_sizes_in_bytes;
            for item in report.items.iter().filter(|i| i.size_bytes.is_some()) {
                println!(
                    "  - {} ({})",
                    item.path.display(),
                    format_size_with(item.size_bytes.unwrap_or(0), raw)
                );
            }
            println!();
            println!(
                "Total: {} of {} folders present, {}",
                report.live_count,
                report.total_candidates,
                format_size_with(report.total_size_bytes, raw)
            );
        }
    }

    Ok(())
}

struct PruneMode {
    yes: bool,
    quiet: bool,
}

fn run_prune(
    roots: &[PathBuf],
    targets: &[String],
    options: PruneOptions,
    mode: PruneMode,
    config: &Config,
    format: OutputFormat,
    out: Option<&Path>,
) -> Result<ExitCode> {
    let targets = select_targets(targets, config)?;
    let roots = prepare_roots(&SafetyChecker::new(), roots)?;

    if !mode.yes {
        let resolved = resolve(&roots, &targets);
        let live: Vec<_> = resolved.iter().filter(|r| r.is_live()).collect();

        println!("Found {} of {} folders to delete:", live.len(), resolved.len());
        for item in &live {
            println!("  - {}", item.candidate.path.display());
        }
        println!("Use --yes to execute");
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Cancellation requested, finishing folders already in progress...");
        handler_token.cancel();
    })
    .context("failed to set Ctrl+C handler")?;

    let raw = config.output.show_sizes_in_bytes;
    let show_progress = !mode.quiet && config.output.progress;
    let measured = options.measure_freed;
    let request = RunRequest::new(roots, targets).with_options(options);

    let mut observer = ConsoleObserver::new(show_progress, raw);
    let summary = Pruner::new().run(request, cancel, &mut observer)?;
    let report = PruneReport::new(&summary, observer.into_items());

    match format {
        OutputFormat::Json => write_json(&report, out)?,
        OutputFormat::Human => {
            println!();
            println!("Results:");
            println!("  Deleted: {} folders", summary.deleted);
            println!("  Skipped: {} folders", summary.skipped);
            if summary.cancelled > 0 {
                println!("  Cancelled: {} folders", summary.cancelled);
            }
            println!("  Failed: {} folders", summary.failed);
            if measured {
                println!("  Freed: {}", format_size_with(summary.freed_bytes, raw));
            }
            println!("  Duration: {:?}", summary.duration);

            if !summary.failures.is_empty() {
                println!("\nFailed folders:");
                for (path, error) in &summary.failures {
                    println!("  - {}: {}", path.display(), error);
                }
            }
        }
    }

    if summary.is_cancelled() {
        warn!("run cancelled before all folders were visited");
    }
    Ok(ExitCode::from(exit_code(&summary)))
}

fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(path) = out {
        fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;
    } else {
        println!("{}", json);
    }
    Ok(())
}

fn run_config(action: ConfigActions, mut config: Config, config_path: &Path) -> Result<()> {
    match action {
        ConfigActions::Show => {
            println!("Configuration ({}):", config_path.display());
            println!("  Targets:");
            for name in &config.prune.targets {
                println!("    - {}", name);
            }
            println!("  Max parallel roots: {}", config.prune.max_parallel_roots);
            println!("  Measure freed space: {}", config.prune.measure_freed);
            println!("  Progress output: {}", config.output.progress);
            println!("  Sizes in bytes: {}", config.output.show_sizes_in_bytes);
        }
        ConfigActions::Set { key, value } => {
            config.set(&key, &value)?;
            config.save_to(config_path)?;
            println!("Set {} to {}", key, value);
        }
        ConfigActions::AddTarget { name } => {
            let target = TargetName::new(name)?;
            if config.add_target(target.clone()) {
                config.save_to(config_path)?;
                println!("Added target: {}", target);
            } else {
                println!("Target already configured: {}", target);
            }
        }
        ConfigActions::RemoveTarget { name } => {
            if config.remove_target(&name) {
                config.save_to(config_path)?;
                println!("Removed target: {}", name);
            } else {
                println!("Target not configured: {}", name);
            }
        }
        ConfigActions::Reset => {
            Config::default().save_to(config_path)?;
            println!("Configuration reset to defaults");
        }
    }

    Ok(())
}
