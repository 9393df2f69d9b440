// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ens`: the command-line front end for the reconciliation engine
//!. Loads a persisted ensemble document, builds the live
//! topology graph, plans a task stream against the requested workflow,
//! runs it, and writes the updated document back.

mod color;
mod exit_error;
mod output;
mod topology;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ens_core::{Action, Status};
use ens_engine::job_options::RepairPolicy;
use ens_engine::{plan, JobOptions, Registry};
use ens_storage::{Ensemble, PersistedChangeLog};
use exit_error::ExitError;
use output::OutputFormat;
use tracing::{info, warn};

ens_core::define_id! {
    /// Identifies one CLI invocation's job run.
    pub struct JobId("job-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WorkflowArg {
    Deploy,
    Undeploy,
    Check,
    Discover,
    Stop,
    Run,
}

impl From<WorkflowArg> for Action {
    fn from(w: WorkflowArg) -> Self {
        match w {
            WorkflowArg::Deploy => Action::Deploy,
            WorkflowArg::Undeploy => Action::Undeploy,
            WorkflowArg::Check => Action::Check,
            WorkflowArg::Discover => Action::Discover,
            WorkflowArg::Stop => Action::Stop,
            WorkflowArg::Run => Action::Run,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum RepairArg {
    #[default]
    None,
    Degraded,
    Error,
    Notapplied,
}

impl From<RepairArg> for RepairPolicy {
    fn from(r: RepairArg) -> Self {
        match r {
            RepairArg::None => RepairPolicy::None,
            RepairArg::Degraded => RepairPolicy::Degraded,
            RepairArg::Error => RepairPolicy::Error,
            RepairArg::Notapplied => RepairPolicy::NotApplied,
        }
    }
}

/// `--jobexitcode`: the status severity tolerated before the process exits
/// non-zero. Each level tolerates everything the previous one did, plus its
/// own name — `degraded` still exits 0 on a degraded job, `error` still
/// exits 0 on an errored one, `never` always exits 0 on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum JobExitCodeArg {
    Ok,
    #[default]
    Degraded,
    Error,
    Never,
}

fn exceeds_threshold(status: Status, threshold: JobExitCodeArg) -> bool {
    match threshold {
        JobExitCodeArg::Never => false,
        JobExitCodeArg::Ok => status > Status::Ok,
        JobExitCodeArg::Degraded => status > Status::Degraded,
        JobExitCodeArg::Error => status > Status::Error,
    }
}

/// Declarative deployment and lifecycle reconciliation engine.
#[derive(Debug, Parser)]
#[command(name = "ens", version, about)]
struct Cli {
    /// Path to the ensemble/manifest YAML document.
    ensemble: PathBuf,

    /// Create instances for templates that have none yet.
    #[arg(long)]
    add: bool,
    /// Reconfigure instances whose inputs or dependencies changed.
    #[arg(long)]
    update: bool,
    /// Like --update, but only for changes carrying a major version bump.
    #[arg(long)]
    upgrade: bool,
    /// Run every in-scope instance regardless of detected change.
    #[arg(long)]
    all: bool,
    /// Reconcile instances already in the given status or worse.
    #[arg(long, value_enum, default_value_t = RepairArg::None)]
    repair: RepairArg,
    /// Render and gate tasks without invoking configurators.
    #[arg(long = "dryrun")]
    dryrun: bool,
    /// Only run non-mutating operations (check/discover).
    #[arg(long)]
    readonly: bool,
    /// Print the planned task stream and exit without running it.
    #[arg(long = "planonly")]
    planonly: bool,
    /// Drop decisions that aren't backed by a required dependency.
    #[arg(long = "requiredonly")]
    requiredonly: bool,
    /// Delete instances whose template was removed from the topology.
    #[arg(long = "revert-obsolete")]
    revert_obsolete: bool,
    /// The workflow to run.
    #[arg(long, value_enum, default_value_t = WorkflowArg::Deploy)]
    workflow: WorkflowArg,
    /// Scope the job to one or more named instances (repeatable).
    #[arg(long = "resource")]
    resource: Vec<String>,
    /// Alias for --resource.
    #[arg(long = "instance")]
    instance: Vec<String>,
    /// Verbose task-level logging.
    #[arg(short, long)]
    verbose: bool,
    /// Status severity that causes a non-zero exit code.
    #[arg(long = "jobexitcode", value_enum, default_value_t = JobExitCodeArg::Degraded)]
    jobexitcode: JobExitCodeArg,
    /// Print the job summary as JSON instead of text.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
    /// Base directory for revisioning and working directories. Defaults to
    /// the ensemble file's parent directory.
    #[arg(long = "home")]
    home: Option<PathBuf>,
    /// Append log output to this file instead of stderr.
    #[arg(long = "logfile")]
    logfile: Option<PathBuf>,
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match &cli.logfile {
        Some(path) => {
            if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
                subscriber.with_writer(std::sync::Mutex::new(file)).with_ansi(false).init();
                return;
            }
            subscriber.init();
        }
        None => subscriber.init(),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", color::error(&err.message));
            err.code
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32, ExitError> {
    let raw = std::fs::read_to_string(&cli.ensemble)
        .map_err(|e| ExitError::new(2, format!("reading {}: {e}", cli.ensemble.display())))?;
    let (mut doc, sites) =
        ens_storage::load(&raw).map_err(|e| ExitError::new(2, format!("loading ensemble: {e}")))?;

    let home = cli
        .home
        .clone()
        .or_else(|| cli.ensemble.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let declared_inputs =
        topology::declared_inputs(&doc).map_err(|e| ExitError::new(2, format!("reading declared inputs: {e}")))?;
    let bound_inputs: std::collections::HashMap<String, serde_json::Value> =
        match doc.environment.inputs.as_object() {
            Some(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            None => std::collections::HashMap::new(),
        };
    ens_engine::validate::validate_inputs(&declared_inputs, &bound_inputs)
        .map_err(|e| ExitError::new(1, format!("{e}")))?;

    let (mut graph, roots) =
        topology::build_graph(&doc).map_err(|e| ExitError::new(2, format!("building topology: {e}")))?;

    let mut changelog = PersistedChangeLog::from_records(doc.changes.clone());
    let job_ordinal = changelog
        .records()
        .iter()
        .map(|r| r.change_id.job_ordinal)
        .max()
        .unwrap_or(0)
        + 1;

    let clock = ens_core::SystemClock;
    let mut opts = JobOptions::new(cli.workflow.into(), clock.epoch_ms())
        .add(cli.add)
        .update(cli.update)
        .upgrade(cli.upgrade)
        .all(cli.all)
        .repair(cli.repair.into())
        .revert_obsolete(cli.revert_obsolete)
        .readonly(cli.readonly)
        .required_only(cli.requiredonly)
        .plan_only(cli.planonly)
        .dry_run(cli.dryrun)
        .verbose(cli.verbose);
    let mut scope = cli.resource.clone();
    scope.extend(cli.instance.clone());
    opts = opts.resources(scope);

    let mut requests = Vec::new();
    for &root in &roots {
        let planned = plan::plan(&graph, root, &opts, &changelog)
            .map_err(|e| ExitError::new(2, format!("planning {}: {e}", graph.instance(root).name)))?;
        requests.extend(planned);
    }

    if opts.plan_only {
        print_plan(&cli, &graph, &requests);
        return Ok(0);
    }

    let mut registry = Registry::new();
    ens_adapters::registry_defaults::register_all(&mut registry);

    let job_id = JobId::new();
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| ExitError::new(2, format!("starting async runtime: {e}")))?;
    let mut runner = ens_engine::runner::Runner::new(&registry, clock, job_ordinal);
    let data = runtime.block_on(runner.run_job(&mut graph, requests, &opts));

    for outcome in &data.tasks {
        if let Some(record) = &outcome.change_record {
            changelog.append(record.clone());
        }
    }

    let summary = ens_engine::summary::build(job_id.to_string(), &graph, &data);

    if !cli.readonly && !cli.dryrun {
        doc.status.topology.instances = topology::graph_to_instance_records(&graph, &roots);
        doc.changes = changelog.into_records();
        let serialized = ens_storage::save(&doc, &sites)
            .map_err(|e| ExitError::new(2, format!("serializing ensemble: {e}")))?;
        std::fs::write(&cli.ensemble, serialized)
            .map_err(|e| ExitError::new(2, format!("writing {}: {e}", cli.ensemble.display())))?;

        if let Ok(revisioning) = ens_storage::GitRevisioning::open(&home) {
            match revisioning.commit_all(&format!("job {}: {}", job_id, summary.job.status)) {
                Ok(commit) if !commit.is_empty() => info!(commit, "recorded ensemble revision"),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "revisioning commit failed"),
            }
        }
    }

    output::format_or_json(cli.output, &summary, || print_summary_text(&summary)).map_err(|e| {
        ExitError::new(2, format!("printing summary: {e}"))
    })?;

    if data.unexpected_abort {
        return Ok(2);
    }
    if exceeds_threshold(data.status(), cli.jobexitcode) {
        return Ok(1);
    }
    Ok(0)
}

fn print_plan(cli: &Cli, graph: &ens_core::TopologyGraph, requests: &[ens_core::TaskRequest]) {
    if cli.output == OutputFormat::Json {
        let rows: Vec<_> = requests
            .iter()
            .map(|r| {
                serde_json::json!({
                    "target": graph.instance(r.target).name,
                    "interface": r.interface,
                    "operation": r.operation,
                    "reason": r.reason,
                    "required": r.required,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
        return;
    }
    if requests.is_empty() {
        println!("Nothing to do.");
        return;
    }
    for r in requests {
        println!(
            "{:<24} {}.{:<16} {}",
            graph.instance(r.target).name,
            r.interface,
            r.operation,
            color::muted(&r.reason)
        );
    }
}

fn print_summary_text(summary: &ens_wire::JobSummary) {
    println!(
        "{} {} — {} total, {} ok, {} error, {} changed, {} skipped",
        color::header(&summary.job.id),
        summary.job.status,
        summary.job.total,
        summary.job.ok,
        summary.job.error,
        summary.job.changed,
        summary.job.skipped,
    );
    for task in &summary.tasks {
        let marker = if task.changed { "*" } else { " " };
        println!(
            "  {marker} {:<24} {:<10} {} {}",
            task.target,
            task.status,
            task.operation,
            color::muted(&task.reason)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_threshold_tolerates_named_level_and_below() {
        assert!(!exceeds_threshold(Status::Ok, JobExitCodeArg::Ok));
        assert!(exceeds_threshold(Status::Degraded, JobExitCodeArg::Ok));
        assert!(!exceeds_threshold(Status::Degraded, JobExitCodeArg::Degraded));
        assert!(exceeds_threshold(Status::Error, JobExitCodeArg::Degraded));
        assert!(!exceeds_threshold(Status::Error, JobExitCodeArg::Error));
        assert!(!exceeds_threshold(Status::Unknown, JobExitCodeArg::Never));
    }

    #[test]
    fn workflow_arg_maps_onto_action() {
        assert_eq!(Action::from(WorkflowArg::Undeploy), Action::Undeploy);
        assert_eq!(Action::from(WorkflowArg::Discover), Action::Discover);
    }
}
