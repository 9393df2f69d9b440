// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests the planner emits and the runner consumes: `TaskRequest` for a
//! single operation against a target instance, `JobRequest` for a set of
//! new/affected instances that must be reconciled as a child job.

use crate::instance::InstanceHandle;
use serde::{Deserialize, Serialize};

/// `{configSpec, target, reason, persist, required}`.
///
/// `config_spec` names the `(interface, operation)` pair to run on
/// `target`; the concrete [`crate::template::InterfaceOperation`] is looked
/// up from the target's template at gating time rather than stored here,
/// since the template is immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub target: InstanceHandle,
    pub interface: String,
    pub operation: String,
    pub reason: String,
    /// Whether a successful result should be written back into the
    /// persisted document (discover-only probes typically set this false).
    pub persist: bool,
    pub required: bool,
}

impl TaskRequest {
    pub fn new(
        target: InstanceHandle,
        interface: impl Into<String>,
        operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            target,
            interface: interface.into(),
            operation: operation.into(),
            reason: reason.into(),
            persist: true,
            required: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }
}

/// A set of new instances a running task discovered and wants reconciled
/// as a child job, plus any errors encountered while building the set.
#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    pub instances: Vec<InstanceHandle>,
    pub errors: Vec<String>,
}

impl JobRequest {
    pub fn new(instances: Vec<InstanceHandle>) -> Self {
        Self { instances, errors: Vec::new() }
    }
}
