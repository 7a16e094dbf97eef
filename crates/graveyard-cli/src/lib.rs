//! Graveyard CLI
//!
//! Runs the remediation job against a directory snapshot file:
//! - `run`: resolve, scan and relocate; prints the run response
//! - `plan`: resolve and scan only; prints the scan report
//! - `resolve`: prints the identifier of the archival grouping

#![allow(missing_docs)]

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use graveyard_core::config::{DEFAULT_LOG_LEVEL, GRAVEYARD_OU_NAME, LOG_LEVEL};
use graveyard_core::directory::DEFAULT_PAGE_SIZE;
use graveyard_core::{
    CandidateScanner, ConfigError, DirectorySnapshot, GraveyardJob, GroupingResolver,
    InMemoryDirectory, InvocationContext, JobConfig, LogNotifier, RetryPolicy,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn snapshot_arg() -> Arg {
    Arg::new("snapshot")
        .long("snapshot")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Directory snapshot file (JSON, or YAML by .yaml/.yml extension)")
}

fn grouping_arg() -> Arg {
    Arg::new("grouping-name")
        .long("grouping-name")
        .env(GRAVEYARD_OU_NAME)
        .help("Name of the archival grouping")
}

fn page_size_arg() -> Arg {
    Arg::new("page-size")
        .long("page-size")
        .value_parser(value_parser!(usize))
        .help("Items per listing page served from the snapshot (default 20)")
}

/// Command-line definition
pub fn build_cli() -> Command {
    Command::new("graveyard")
        .version(graveyard_core::VERSION)
        .about("Moves closed accounts into the archival grouping")
        .subcommand_required(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .env(LOG_LEVEL)
                .default_value(DEFAULT_LOG_LEVEL)
                .help("Default log level (RUST_LOG overrides)"),
        )
        .subcommand(
            Command::new("run")
                .about("Relocate closed accounts and print the run response")
                .arg(snapshot_arg())
                .arg(grouping_arg())
                .arg(page_size_arg())
                .arg(
                    Arg::new("request-id")
                        .long("request-id")
                        .help("Correlation id for log events (random if omitted)"),
                )
                .arg(
                    Arg::new("max-attempts")
                        .long("max-attempts")
                        .default_value("3")
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Move attempts per account"),
                )
                .arg(
                    Arg::new("fail-fast")
                        .long("fail-fast")
                        .action(ArgAction::SetTrue)
                        .help("Do not retry permanent directory errors"),
                )
                .arg(
                    Arg::new("write-back")
                        .long("write-back")
                        .action(ArgAction::SetTrue)
                        .help("Save the relocated organization back to the snapshot file"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("List closed accounts that a run would relocate")
                .arg(snapshot_arg())
                .arg(grouping_arg())
                .arg(page_size_arg()),
        )
        .subcommand(
            Command::new("resolve")
                .about("Print the identifier of the archival grouping")
                .arg(snapshot_arg())
                .arg(grouping_arg()),
        )
}

/// Log level selected on the command line or environment
pub fn log_level(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("log-level")
        .map_or_else(|| DEFAULT_LOG_LEVEL.to_string(), |level| level.to_lowercase())
}

fn job_config(args: &ArgMatches, log_level: String) -> anyhow::Result<JobConfig> {
    let name = args
        .get_one::<String>("grouping-name")
        .cloned()
        .ok_or(ConfigError::Missing(GRAVEYARD_OU_NAME))?;
    let config = JobConfig::new(name).with_log_level(log_level);
    config.validate()?;
    Ok(config)
}

fn load_directory(args: &ArgMatches) -> anyhow::Result<(PathBuf, Arc<InMemoryDirectory>)> {
    let path = args
        .get_one::<PathBuf>("snapshot")
        .cloned()
        .context("--snapshot is required")?;
    let snapshot = DirectorySnapshot::load(&path)
        .with_context(|| format!("loading snapshot {}", path.display()))?;
    let page_size = args
        .try_get_one::<usize>("page-size")
        .ok()
        .flatten()
        .copied()
        .unwrap_or(DEFAULT_PAGE_SIZE);
    Ok((
        path,
        Arc::new(InMemoryDirectory::with_page_size(snapshot, page_size)),
    ))
}

/// Execute the selected subcommand and return its JSON output
///
/// # Errors
/// Returns an error for invalid configuration, unreadable snapshots and
/// fatal job errors (grouping not found, resolution or scan failure).
pub async fn execute(matches: &ArgMatches) -> anyhow::Result<serde_json::Value> {
    let level = log_level(matches);

    match matches.subcommand() {
        Some(("run", args)) => {
            let max_attempts = args.get_one::<u32>("max-attempts").copied().unwrap_or(3);
            let retry = RetryPolicy::new()
                .with_max_attempts(max_attempts)
                .with_fail_fast_on_permanent(args.get_flag("fail-fast"));
            let config = job_config(args, level)?.with_retry(retry);
            let (path, directory) = load_directory(args)?;
            let request_id = args
                .get_one::<String>("request-id")
                .cloned()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let job = GraveyardJob::with_notifier(
                Arc::clone(&directory),
                config,
                Arc::new(LogNotifier),
            );
            let response = job
                .handle(&json!({}), &InvocationContext::new(request_id))
                .await?;

            if args.get_flag("write-back") {
                directory
                    .snapshot()
                    .save(&path)
                    .with_context(|| format!("writing snapshot {}", path.display()))?;
                tracing::info!(snapshot = %path.display(), "Snapshot updated");
            }
            Ok(serde_json::to_value(response)?)
        }
        Some(("plan", args)) => {
            let config = job_config(args, level)?;
            let (_, directory) = load_directory(args)?;
            let target = GroupingResolver::new(Arc::clone(&directory))
                .resolve(&config.graveyard_ou_name)
                .await?;
            let report = CandidateScanner::new(directory).scan_report(&target).await?;
            Ok(json!({
                "graveyard_ou_id": target,
                "report": report,
            }))
        }
        Some(("resolve", args)) => {
            let config = job_config(args, level)?;
            let (_, directory) = load_directory(args)?;
            let target = GroupingResolver::new(directory)
                .resolve(&config.graveyard_ou_name)
                .await?;
            Ok(json!({
                "name": config.graveyard_ou_name,
                "id": target,
            }))
        }
        Some((other, _)) => anyhow::bail!("unknown command: {other}"),
        None => anyhow::bail!("no command given"),
    }
}
