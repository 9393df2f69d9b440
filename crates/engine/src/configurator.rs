// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The configurator capability contract and the `Task` the
//! runner builds for each `TaskRequest` it dequeues.

use async_trait::async_trait;
use ens_core::{ChangeId, InstanceHandle, JobRequest, Priority, Status, TaskRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One executing unit: a `TaskRequest` resolved against its target's
/// template, with its inputs evaluated and a fresh `ChangeId` assigned.
#[derive(Debug, Clone)]
pub struct Task {
    pub change_id: ChangeId,
    pub parent_id: Option<ChangeId>,
    pub target: InstanceHandle,
    pub target_name: String,
    pub interface: String,
    pub operation: String,
    pub implementation: String,
    pub inputs: HashMap<String, serde_json::Value>,
    pub timeout: Option<Duration>,
    pub dry_run: bool,
    pub required: bool,
    pub reason: String,
    /// Set by `Configurator::render` before `run` is called; pure
    /// preparation, no side effects.
    pub rendered: Option<serde_json::Value>,
}

impl Task {
    pub fn new(
        change_id: ChangeId,
        target: InstanceHandle,
        target_name: impl Into<String>,
        request: &TaskRequest,
        implementation: impl Into<String>,
    ) -> Self {
        Self {
            change_id,
            parent_id: None,
            target,
            target_name: target_name.into(),
            interface: request.interface.clone(),
            operation: request.operation.clone(),
            implementation: implementation.into(),
            inputs: HashMap::new(),
            timeout: None,
            dry_run: false,
            required: request.required,
            reason: request.reason.clone(),
            rendered: None,
        }
    }
}

/// `ConfiguratorResult{success, modified, applied, readyState, configChanged,
/// result, outputs}`. `config_changed: None` means "unproven
/// either way", which the runner treats as `true` per the default rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfiguratorResult {
    pub success: bool,
    pub modified: bool,
    pub applied: bool,
    pub ready_state: Status,
    #[serde(default)]
    pub config_changed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub outputs: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub messages: Vec<String>,
}

impl ConfiguratorResult {
    /// The runner's pessimistic result for an unhandled panic/error inside
    /// `run`.
    pub fn failed_with_side_effects(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            modified: true,
            applied: true,
            ready_state: Status::Error,
            config_changed: Some(true),
            result: None,
            outputs: HashMap::new(),
            messages: vec![reason.into()],
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            success: true,
            modified: false,
            applied: false,
            ready_state: Status::Pending,
            config_changed: Some(false),
            result: None,
            outputs: HashMap::new(),
            messages: vec![reason.into()],
        }
    }
}

/// Result fed back into a suspended configurator on resume, carrying
/// whichever kind of sub-work it yielded last — tagged-variant step results consumed by a loop).
#[derive(Debug, Clone)]
pub enum StepResume {
    Task(ConfiguratorResult),
    /// The aggregate operational status of the completed child job.
    Job(Status),
}

/// One step of the configurator↔runner handshake.
/// Any value other than these three variants is a protocol error.
pub enum Step {
    SubTask(TaskRequest),
    SubJob(JobRequest),
    Done(ConfiguratorResult),
}

/// The uniform capability contract every configurator exposes. Plugins register under short names at process startup
/// (`ens-engine::registry::Registry`).
#[async_trait]
pub trait Configurator: Send + Sync {
    fn can_dry_run(&self, task: &Task) -> bool;

    /// `Ok(())` if the task may run; `Err(reason)` otherwise.
    fn can_run(&self, task: &Task) -> Result<(), String>;

    /// May downgrade priority to `Priority::Ignore`, turning the task into
    /// a no-op that remains in the change log.
    fn should_run(&self, task: &Task) -> Priority {
        let _ = task;
        Priority::Required
    }

    /// Pure preparation; no side effects. The runner calls this before
    /// `run` and stores the result on `task.rendered`.
    async fn render(&self, task: &Task) -> Result<serde_json::Value, crate::error::RuntimeError>;

    /// Drive one step of execution. `resume` is `None` on the first call
    /// and `Some(result-of-last-yielded-step)` thereafter.
    async fn run(
        &self,
        task: &Task,
        resume: Option<StepResume>,
    ) -> Result<Step, crate::error::RuntimeError>;
}
