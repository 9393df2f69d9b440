// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runner: drives the planner's `TaskRequest` stream to completion,
//! gating each task, handing it to its configurator, applying results, and
//! appending `ChangeRecord`s. One `tracing` span per unit of work, a
//! `thiserror` error enum per failure mode, and a pessimistic failure
//! path that assumes side effects occurred.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use ens_core::{
    Action, ChangeId, ChangeRecord, Clock, Created, InstanceHandle, JobRequest, Priority,
    ResourceChange, Status, TaskRequest, TaskResultSummary, TopologyGraph,
};
use tracing::{error, info, warn};

use crate::attributes::{apply_outputs, AttributeSnapshot};
use crate::configurator::{ConfiguratorResult, Step, StepResume, Task};
use crate::error::{GateError, RuntimeError};
use crate::expr::{eval_get_attribute, eval_shorthand};
use crate::job_options::JobOptions;
use crate::registry::{Implementation, Registry};

/// One terminal task outcome, as recorded for the job summary
/// (`ens-wire::TaskSummary` is built from these).
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub target_name: String,
    pub interface: String,
    pub operation: String,
    pub configurator: String,
    pub priority: Priority,
    pub reason: String,
    pub status: Status,
    pub changed: bool,
    pub change_record: Option<ChangeRecord>,
}

/// Aggregate outcome of one job run.
#[derive(Debug, Clone, Default)]
pub struct JobSummaryData {
    pub tasks: Vec<TaskOutcome>,
    pub unexpected_abort: bool,
}

impl JobSummaryData {
    pub fn status(&self) -> Status {
        self.tasks.iter().map(|t| t.status).max().unwrap_or(Status::Ok)
    }
}

/// Drives a single job's execution loop. Holds the pieces that persist
/// across the whole job: the set of `(target, op)` pairs already handled
/// (`workDone`), the FIFO sub-job queue, and the monotonically increasing
/// task ordinal that feeds `ChangeId`.
pub struct Runner<'a, C: Clock> {
    registry: &'a Registry,
    clock: C,
    job_ordinal: u32,
    next_task_ordinal: u32,
    work_done: HashSet<(String, String)>,
    sub_jobs: VecDeque<JobRequest>,
    should_abort: bool,
}

impl<'a, C: Clock> Runner<'a, C> {
    pub fn new(registry: &'a Registry, clock: C, job_ordinal: u32) -> Self {
        Self {
            registry,
            clock,
            job_ordinal,
            next_task_ordinal: 0,
            work_done: HashSet::new(),
            sub_jobs: VecDeque::new(),
            should_abort: false,
        }
    }

    fn next_change_id(&mut self) -> ChangeId {
        let id = ChangeId::new(self.job_ordinal, self.next_task_ordinal);
        self.next_task_ordinal += 1;
        id
    }

    /// Manually request the job stop dequeueing after the current task
    /// commits — external signals translate to this.
    pub fn abort(&mut self) {
        self.should_abort = true;
    }

    /// Run the whole job: drain `requests` in order, then drain any
    /// sub-jobs enqueued along the way.
    pub async fn run_job(
        &mut self,
        graph: &mut TopologyGraph,
        requests: Vec<TaskRequest>,
        opts: &JobOptions,
    ) -> JobSummaryData {
        let mut summary = JobSummaryData::default();
        self.drain_stream(graph, requests, opts, &mut summary).await;

        while let Some(job_request) = self.sub_jobs.pop_front() {
            if self.should_abort {
                break;
            }
            if !job_request.errors.is_empty() {
                for e in &job_request.errors {
                    warn!(error = %e, "sub-job request carried planning errors");
                }
            }
            // Sub-jobs reconcile newly discovered instances with the same
            // workflow the parent job was running.
            let sub_requests: Vec<TaskRequest> = job_request
                .instances
                .iter()
                .map(|&h| {
                    TaskRequest::new(h, "Standard", "create", "subJob").required(false)
                })
                .collect();
            self.drain_stream(graph, sub_requests, opts, &mut summary).await;
        }
        summary
    }

    async fn drain_stream(
        &mut self,
        graph: &mut TopologyGraph,
        requests: Vec<TaskRequest>,
        opts: &JobOptions,
        summary: &mut JobSummaryData,
    ) {
        for request in requests {
            if self.should_abort {
                break;
            }
            let key = (graph.instance(request.target).name.clone(), request.operation.clone());
            if self.work_done.contains(&key) {
                continue;
            }
            let mut sub_outcomes = Vec::new();
            let outcome = self.run_one(graph, &request, opts, &mut sub_outcomes).await;
            self.work_done.insert(key);
            summary.tasks.push(outcome);
            summary.tasks.extend(sub_outcomes);
            if !self.should_abort {
                self.should_abort = should_abort_default();
            }
        }
    }

    /// Execute a single top-level `TaskRequest` end to end: gate, drive the
    /// configurator, apply the result, append the `ChangeRecord`. Any
    /// sub-tasks run along the way are pushed onto `sub_outcomes` rather
    /// than returned, since the job summary needs every one of them.
    async fn run_one(
        &mut self,
        graph: &mut TopologyGraph,
        request: &TaskRequest,
        opts: &JobOptions,
        sub_outcomes: &mut Vec<TaskOutcome>,
    ) -> TaskOutcome {
        self.run_one_inner(graph, request, opts, None, sub_outcomes).await.0
    }

    /// The actual task execution path, shared by top-level tasks
    /// (`parent_id = None`) and inline sub-tasks (`parent_id =
    /// Some(producer's change_id)`). Returns both the `TaskOutcome` for
    /// bookkeeping and the raw `ConfiguratorResult`, since a sub-task's
    /// caller needs the latter to resume the producer with the sub-task's
    /// genuine outcome.
    async fn run_one_inner(
        &mut self,
        graph: &mut TopologyGraph,
        request: &TaskRequest,
        opts: &JobOptions,
        parent_id: Option<ChangeId>,
        sub_outcomes: &mut Vec<TaskOutcome>,
    ) -> (TaskOutcome, ConfiguratorResult) {
        let change_id = self.next_change_id();
        let target = request.target;
        let target_name = graph.instance(target).name.clone();
        let template = graph.template(graph.instance(target).template).clone();

        let implementation_raw = template
            .operation(&request.interface, &request.operation)
            .map(|op| op.implementation.clone())
            .unwrap_or_else(|| "shell".to_string());
        let implementation = Implementation::resolve(&implementation_raw, graph);

        let mut task = Task::new(change_id, target, target_name.clone(), request, implementation_raw.clone());
        task.parent_id = parent_id;
        task.dry_run = opts.dry_run;
        let operation = template.operation(&request.interface, &request.operation);
        task.timeout = operation.and_then(|op| op.timeout);
        if let Some(op) = operation {
            match render_declared_inputs(graph, target, &op.inputs) {
                Ok(inputs) => task.inputs = inputs,
                Err(e) => {
                    error!(error = %e, "input rendering failed");
                    let outcome = self.failed_outcome(graph, request, &template, &task, opts, e.to_string());
                    let result = ConfiguratorResult::failed_with_side_effects(e.to_string());
                    return (outcome, result);
                }
            }
        }

        let span = tracing::info_span!("run_task", target = %target_name, op = %request.operation, change_id = %change_id);
        let _enter = span.enter();

        // Gating.
        if request.required && !graph.instance(target).effective_status().is_operational() {
            let reason = GateError::DependencyNotOperational(target_name.clone()).to_string();
            let outcome = self.skipped_outcome(graph, request, &template, &task, opts, reason.clone());
            return (outcome, ConfiguratorResult::skipped(reason));
        }

        let configurator = match &implementation {
            Implementation::NodeTemplate(_) => None,
            _ => self.registry.resolve(&implementation),
        };
        let Some(configurator) = configurator else {
            let reason = format!("no configurator registered for {implementation_raw:?}");
            warn!(%reason, "gating failed");
            let outcome = self.skipped_outcome(graph, request, &template, &task, opts, reason.clone());
            return (outcome, ConfiguratorResult::skipped(reason));
        };

        if opts.dry_run && !configurator.can_dry_run(&task) {
            let reason = GateError::DryRunUnsupported.to_string();
            let outcome = self.skipped_outcome(graph, request, &template, &task, opts, reason.clone());
            return (outcome, ConfiguratorResult::skipped(reason));
        }
        if let Err(reason) = configurator.can_run(&task) {
            info!(%reason, "task skipped: canRun refused");
            let outcome = self.skipped_outcome(graph, request, &template, &task, opts, reason.clone());
            return (outcome, ConfiguratorResult::skipped(reason));
        }

        let priority = configurator.should_run(&task);
        if priority == Priority::Ignore {
            info!("task downgraded to no-op by shouldRun");
        }

        let rendered = match configurator.render(&task).await {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "render failed");
                let outcome = self.failed_outcome(graph, request, &template, &task, opts, e.to_string());
                let result = ConfiguratorResult::failed_with_side_effects(e.to_string());
                return (outcome, result);
            }
        };
        task.rendered = Some(rendered);

        let snapshot = AttributeSnapshot::capture(graph, target);
        let start = std::time::Instant::now();
        let result = if priority == Priority::Ignore {
            Ok(ConfiguratorResult::skipped("downgraded to no-op by shouldRun"))
        } else {
            self.drive(&*configurator, &task, graph, opts, sub_outcomes).await
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(cr) => {
                info!(elapsed_ms, status = %cr.ready_state, "task finished");
                let result = cr.clone();
                let outcome = self.apply_result(graph, request, &template, &task, opts, cr, snapshot);
                (outcome, result)
            }
            Err(e) => {
                error!(elapsed_ms, error = %e, "task errored; assuming side effects occurred");
                snapshot.revert(graph);
                let cr = ConfiguratorResult::failed_with_side_effects(e.to_string());
                let result = cr.clone();
                let outcome = self.apply_result(
                    graph,
                    request,
                    &template,
                    &task,
                    opts,
                    cr,
                    AttributeSnapshot::capture(graph, target),
                );
                (outcome, result)
            }
        }
    }

    /// Drive the cooperative configurator↔runner handshake to a terminal
    /// result. A yielded sub-task is run inline through the same execution
    /// path as a top-level task — gated, rendered, executed, applied — and
    /// its genuine `ConfiguratorResult` resumes the producer; its
    /// `TaskOutcome` is pushed onto `sub_outcomes` so it still appears in
    /// the job summary.
    async fn drive(
        &mut self,
        configurator: &dyn crate::configurator::Configurator,
        task: &Task,
        graph: &mut TopologyGraph,
        opts: &JobOptions,
        sub_outcomes: &mut Vec<TaskOutcome>,
    ) -> Result<ConfiguratorResult, RuntimeError> {
        let mut resume = None;
        loop {
            let step = match task.timeout {
                Some(timeout) => tokio::time::timeout(timeout, configurator.run(task, resume.take()))
                    .await
                    .map_err(|_| RuntimeError::Timeout(timeout))??,
                None => configurator.run(task, resume.take()).await?,
            };
            match step {
                Step::Done(result) => return Ok(result),
                Step::SubTask(sub_request) => {
                    // Sub-tasks run inline, sharing this job's changeId
                    // sequence; their real result is fed back to the
                    // producer on the next `run` call.
                    let (outcome, sub_result) = Box::pin(self.run_one_inner(
                        graph,
                        &sub_request,
                        opts,
                        Some(task.change_id),
                        sub_outcomes,
                    ))
                    .await;
                    sub_outcomes.push(outcome);
                    resume = Some(StepResume::Task(sub_result));
                }
                Step::SubJob(job_request) => {
                    self.sub_jobs.push_back(job_request);
                    resume = Some(StepResume::Job(Status::Ok));
                }
            }
        }
    }

    fn skipped_outcome(
        &self,
        graph: &mut TopologyGraph,
        request: &TaskRequest,
        template: &ens_core::Template,
        task: &Task,
        opts: &JobOptions,
        reason: String,
    ) -> TaskOutcome {
        let target_name = graph.instance(request.target).name.clone();
        let inputs_digest = ens_core::inputs_digest(
            &task.inputs.clone().into_iter().collect(),
            ens_core::DEFAULT_EXCLUDE,
        );
        let dependencies_digest = crate::plan::dependencies_digest(graph, template);
        let record = ChangeRecord {
            change_id: task.change_id,
            parent_id: task.parent_id,
            start_time_ms: self.clock.epoch_ms(),
            commit_id: None,
            action: opts.workflow,
            target: target_name.clone(),
            inputs_digest,
            dependencies_digest: Some(dependencies_digest),
            result: TaskResultSummary {
                status: Status::Pending,
                success: true,
                modified: false,
                messages: vec![reason.clone()],
            },
            resource_changes: Vec::new(),
        };
        TaskOutcome {
            target_name,
            interface: request.interface.clone(),
            operation: request.operation.clone(),
            configurator: template
                .operation(&request.interface, &request.operation)
                .map(|op| op.implementation.clone())
                .unwrap_or_default(),
            priority: Priority::Optional,
            reason,
            status: Status::Pending,
            changed: false,
            change_record: Some(record),
        }
    }

    fn failed_outcome(
        &self,
        graph: &mut TopologyGraph,
        request: &TaskRequest,
        template: &ens_core::Template,
        task: &Task,
        opts: &JobOptions,
        reason: String,
    ) -> TaskOutcome {
        let cr = ConfiguratorResult::failed_with_side_effects(reason);
        let snapshot = AttributeSnapshot::capture(graph, request.target);
        self.apply_result(graph, request, template, task, opts, cr, snapshot)
    }

    /// Apply a terminal `ConfiguratorResult` to its target and build the
    /// `ChangeRecord`.
    fn apply_result(
        &self,
        graph: &mut TopologyGraph,
        request: &TaskRequest,
        template: &ens_core::Template,
        task: &Task,
        opts: &JobOptions,
        result: ConfiguratorResult,
        snapshot: AttributeSnapshot,
    ) -> TaskOutcome {
        let target = request.target;
        let change_id = task.change_id;

        if result.modified {
            graph.instance_mut(target).last_state_change = Some(change_id.to_string());
        }
        if result.applied {
            debug_assert!(
                result.ready_state.is_operational() || result.ready_state == Status::Error,
                "applied=true requires readyState in operational ∪ {{error}}"
            );
            graph.instance_mut(target).local_status = result.ready_state;
        } else if result.ready_state == Status::NotApplied {
            snapshot.revert(graph);
        }

        if result.applied && result.ready_state.is_operational() {
            match request.operation.as_str() {
                "create" => {
                    let instance = graph.instance_mut(target);
                    if !instance.created.is_created() {
                        instance.created = Created::Task(change_id.to_string());
                    }
                }
                "delete" => graph.instance_mut(target).created = Created::No,
                _ => {}
            }
        }

        let config_changed = result.config_changed.unwrap_or(true);
        if config_changed {
            graph.instance_mut(target).last_config_change = Some(change_id.to_string());
        }

        apply_outputs(graph, target, &result.outputs);

        let target_name = graph.instance(target).name.clone();
        let resource_changes = result
            .outputs
            .keys()
            .map(|k| ResourceChange { key: k.clone(), previous: None, new: None })
            .collect::<Vec<_>>();

        let inputs_digest = ens_core::inputs_digest(
            &task.inputs.clone().into_iter().collect(),
            ens_core::DEFAULT_EXCLUDE,
        );
        let dependencies_digest = crate::plan::dependencies_digest(graph, template);
        let record = ChangeRecord {
            change_id,
            parent_id: task.parent_id,
            start_time_ms: self.clock.epoch_ms(),
            commit_id: None,
            action: opts.workflow,
            target: target_name.clone(),
            inputs_digest,
            dependencies_digest: Some(dependencies_digest),
            result: TaskResultSummary {
                status: result.ready_state,
                success: result.success,
                modified: result.modified,
                messages: result.messages.clone(),
            },
            resource_changes,
        };

        TaskOutcome {
            target_name,
            interface: request.interface.clone(),
            operation: request.operation.clone(),
            configurator: template
                .operation(&request.interface, &request.operation)
                .map(|op| op.implementation.clone())
                .unwrap_or_default(),
            priority: Priority::Required,
            reason: request.reason.clone(),
            status: record.result.status,
            changed: record.result.modified,
            change_record: Some(record),
        }
    }
}

/// Resolve a template's declared operation inputs against the live graph
/// before a configurator sees them: `::node::attr` shorthand strings and
/// `{"get_attribute": [NODE, attr]}` objects are replaced with the
/// referenced attribute's current value, everything else passes through
/// unchanged.
fn render_declared_inputs(
    graph: &TopologyGraph,
    subject: InstanceHandle,
    declared: &HashMap<String, serde_json::Value>,
) -> Result<HashMap<String, serde_json::Value>, RuntimeError> {
    declared
        .iter()
        .map(|(k, v)| Ok((k.clone(), render_value(graph, subject, v)?)))
        .collect()
}

fn render_value(
    graph: &TopologyGraph,
    subject: InstanceHandle,
    value: &serde_json::Value,
) -> Result<serde_json::Value, RuntimeError> {
    match value {
        serde_json::Value::String(s) if s.starts_with("::") => {
            Ok(eval_shorthand(graph, subject, s)?)
        }
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::Array(path)) = map.get("get_attribute") {
                if map.len() == 1 {
                    let path: Vec<String> = path
                        .iter()
                        .map(|v| v.as_str().unwrap_or_default().to_string())
                        .collect();
                    return Ok(eval_get_attribute(graph, subject, &path)?);
                }
            }
            let rendered = map
                .iter()
                .map(|(k, v)| Ok((k.clone(), render_value(graph, subject, v)?)))
                .collect::<Result<_, RuntimeError>>()?;
            Ok(serde_json::Value::Object(rendered))
        }
        serde_json::Value::Array(items) => {
            let rendered = items
                .iter()
                .map(|v| render_value(graph, subject, v))
                .collect::<Result<_, RuntimeError>>()?;
            Ok(serde_json::Value::Array(rendered))
        }
        other => Ok(other.clone()),
    }
}

/// Default `shouldAbort` policy: never aborts on its own;
/// external signals/CLI interrupts call `Runner::abort` instead.
fn should_abort_default() -> bool {
    false
}

/// Bound the time a shell-style configurator's child process wait may
/// take before the runner declares a timeout.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(600);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configurator::Task;
    use async_trait::async_trait;
    use ens_core::{FakeClock, Instance, Template};

    struct AlwaysOk;

    #[async_trait]
    impl crate::configurator::Configurator for AlwaysOk {
        fn can_dry_run(&self, _task: &Task) -> bool {
            true
        }
        fn can_run(&self, _task: &Task) -> Result<(), String> {
            Ok(())
        }
        async fn render(&self, _task: &Task) -> Result<serde_json::Value, RuntimeError> {
            Ok(serde_json::Value::Null)
        }
        async fn run(
            &self,
            _task: &Task,
            _resume: Option<StepResume>,
        ) -> Result<Step, RuntimeError> {
            Ok(Step::Done(ConfiguratorResult {
                success: true,
                modified: true,
                applied: true,
                ready_state: Status::Ok,
                config_changed: Some(true),
                result: None,
                outputs: Default::default(),
                messages: Vec::new(),
            }))
        }
    }

    fn graph_with_one_node() -> (TopologyGraph, ens_core::InstanceHandle) {
        let mut g = TopologyGraph::new();
        let mut t = Template::new("release", "my.Helm");
        t.operations.insert(
            ("Standard".to_string(), "create".to_string()),
            ens_core::InterfaceOperation {
                interface: "Standard".to_string(),
                operation: "create".to_string(),
                implementation: "helm".to_string(),
                inputs: Default::default(),
                timeout: None,
                pre_conditions: Vec::new(),
                post_conditions: Vec::new(),
            },
        );
        let th = g.add_template(t);
        let h = g.add_instance(Instance::new("release", th));
        (g, h)
    }

    #[tokio::test]
    async fn successful_task_marks_instance_ok_and_changed() {
        let (mut g, h) = graph_with_one_node();
        let mut registry = Registry::new();
        registry.register("helm", || std::sync::Arc::new(AlwaysOk));
        let clock = FakeClock::new();
        let mut runner = Runner::new(&registry, clock.clone(), 1);

        let request = TaskRequest::new(h, "Standard", "create", "add").required(true);
        let opts = JobOptions::new(Action::Deploy, 0);
        let summary = runner.run_job(&mut g, vec![request], &opts).await;

        assert_eq!(summary.tasks.len(), 1);
        assert_eq!(summary.tasks[0].status, Status::Ok);
        assert!(summary.tasks[0].changed);
        assert_eq!(g.instance(h).local_status, Status::Ok);
    }

    #[tokio::test]
    async fn unregistered_configurator_is_skipped_not_fatal() {
        let (mut g, h) = graph_with_one_node();
        let registry = Registry::new();
        let clock = FakeClock::new();
        let mut runner = Runner::new(&registry, clock.clone(), 1);

        let request = TaskRequest::new(h, "Standard", "create", "add").required(false);
        let opts = JobOptions::new(Action::Deploy, 0);
        let summary = runner.run_job(&mut g, vec![request], &opts).await;

        assert_eq!(summary.tasks.len(), 1);
        assert_eq!(summary.tasks[0].status, Status::Pending);
        assert!(!summary.tasks[0].changed);
    }

    #[test]
    fn work_done_dedupes_same_target_and_op_within_a_job() {
        let registry = Registry::new();
        let clock = FakeClock::new();
        let mut runner = Runner::new(&registry, clock.clone(), 1);
        let key = ("release".to_string(), "create".to_string());
        assert!(!runner.work_done.contains(&key));
        runner.work_done.insert(key.clone());
        assert!(runner.work_done.contains(&key));
    }

    #[tokio::test]
    async fn change_record_carries_the_jobs_action_and_a_real_inputs_digest() {
        let (mut g, h) = graph_with_one_node();
        let mut registry = Registry::new();
        registry.register("helm", || std::sync::Arc::new(AlwaysOk));
        let clock = FakeClock::new();
        let mut runner = Runner::new(&registry, clock.clone(), 1);

        let request = TaskRequest::new(h, "Standard", "create", "add").required(true);
        let opts = JobOptions::new(Action::Deploy, 0);
        let summary = runner.run_job(&mut g, vec![request], &opts).await;

        let record = summary.tasks[0].change_record.as_ref().expect("change recorded");
        assert_eq!(record.action, Action::Deploy);
        let null_digest = ens_core::inputs_digest(&serde_json::Map::new(), ens_core::DEFAULT_EXCLUDE);
        assert_ne!(record.inputs_digest, null_digest);
        assert!(record.dependencies_digest.is_some());
    }

    struct SubTaskProducer;

    #[async_trait]
    impl crate::configurator::Configurator for SubTaskProducer {
        fn can_dry_run(&self, _task: &Task) -> bool {
            true
        }
        fn can_run(&self, _task: &Task) -> Result<(), String> {
            Ok(())
        }
        async fn render(&self, _task: &Task) -> Result<serde_json::Value, RuntimeError> {
            Ok(serde_json::Value::Null)
        }
        async fn run(
            &self,
            task: &Task,
            resume: Option<StepResume>,
        ) -> Result<Step, RuntimeError> {
            match resume {
                None => {
                    let sub_request = TaskRequest::new(task.target, "Standard", "check", "probe").required(false);
                    Ok(Step::SubTask(sub_request))
                }
                Some(StepResume::Task(sub_result)) => Ok(Step::Done(ConfiguratorResult {
                    success: sub_result.success,
                    modified: true,
                    applied: true,
                    ready_state: sub_result.ready_state,
                    config_changed: Some(true),
                    result: None,
                    outputs: Default::default(),
                    messages: Vec::new(),
                })),
                Some(StepResume::Job(_)) => unreachable!("this configurator never yields SubJob"),
            }
        }
    }

    #[tokio::test]
    async fn sub_task_runs_inline_and_its_genuine_result_resumes_the_producer() {
        let mut g = TopologyGraph::new();
        let mut t = Template::new("release", "my.Helm");
        t.operations.insert(
            ("Standard".to_string(), "create".to_string()),
            ens_core::InterfaceOperation {
                interface: "Standard".to_string(),
                operation: "create".to_string(),
                implementation: "helm".to_string(),
                inputs: Default::default(),
                timeout: None,
                pre_conditions: Vec::new(),
                post_conditions: Vec::new(),
            },
        );
        t.operations.insert(
            ("Standard".to_string(), "check".to_string()),
            ens_core::InterfaceOperation {
                interface: "Standard".to_string(),
                operation: "check".to_string(),
                implementation: "probe".to_string(),
                inputs: Default::default(),
                timeout: None,
                pre_conditions: Vec::new(),
                post_conditions: Vec::new(),
            },
        );
        let th = g.add_template(t);
        let h = g.add_instance(Instance::new("release", th));

        let mut registry = Registry::new();
        registry.register("helm", || std::sync::Arc::new(SubTaskProducer));
        registry.register("probe", || std::sync::Arc::new(AlwaysOk));
        let clock = FakeClock::new();
        let mut runner = Runner::new(&registry, clock.clone(), 1);

        let request = TaskRequest::new(h, "Standard", "create", "add").required(true);
        let opts = JobOptions::new(Action::Deploy, 0);
        let summary = runner.run_job(&mut g, vec![request], &opts).await;

        // The producer task plus the inline sub-task it drove both land in
        // the summary, and the producer's final status is the sub-task's
        // genuine outcome (Ok, from AlwaysOk) rather than a synthesized skip.
        assert_eq!(summary.tasks.len(), 2);
        let sub = summary.tasks.iter().find(|t| t.operation == "check").expect("sub-task recorded");
        let parent = summary.tasks.iter().find(|t| t.operation == "create").expect("parent task recorded");
        assert_eq!(sub.status, Status::Ok);
        assert_eq!(parent.status, Status::Ok);
        let parent_record = parent.change_record.as_ref().expect("parent change recorded");
        let sub_record = sub.change_record.as_ref().expect("sub change recorded");
        assert_eq!(sub_record.parent_id, Some(parent_record.change_id));
    }
}
