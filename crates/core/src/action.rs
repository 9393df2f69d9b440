// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow actions and the TOSCA-style node lifecycle state machine.

use serde::{Deserialize, Serialize};

/// A requested workflow. Each maps to a preferred interface operation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Deploy,
    Undeploy,
    Check,
    Discover,
    Stop,
    /// Run an explicit, named interface operation outside the standard set.
    Run,
}

crate::simple_display! {
    Action {
        Deploy => "deploy",
        Undeploy => "undeploy",
        Check => "check",
        Discover => "discover",
        Stop => "stop",
        Run => "run",
    }
}

impl Action {
    /// The preferred interface operation name(s) for this workflow, in
    /// fallback order (first that the template defines wins).
    ///
    /// `deploy` prefers `configure`, then falls back to `create`, then
    /// `start`.
    pub fn preferred_operations(self) -> &'static [&'static str] {
        match self {
            Action::Deploy => &["configure", "create", "start"],
            Action::Undeploy => &["delete", "stop"],
            Action::Check => &["check"],
            Action::Discover => &["discover"],
            Action::Stop => &["stop"],
            Action::Run => &[],
        }
    }
}

/// TOSCA-style node lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Initial,
    Creating,
    Created,
    Configuring,
    Configured,
    Starting,
    Started,
    Stopping,
    Stopped,
    Deleting,
    Deleted,
    Error,
}

crate::simple_display! {
    NodeState {
        Initial => "initial",
        Creating => "creating",
        Created => "created",
        Configuring => "configuring",
        Configured => "configured",
        Starting => "starting",
        Started => "started",
        Stopping => "stopping",
        Stopped => "stopped",
        Deleting => "deleting",
        Deleted => "deleted",
        Error => "error",
    }
}

impl Default for NodeState {
    fn default() -> Self {
        NodeState::Initial
    }
}

impl NodeState {
    /// Invariant 4: `localStatus ∈ {absent, notapplied}` implies
    /// the node state cannot be `started`/`configured`.
    pub fn compatible_with(self, status: crate::Status) -> bool {
        use crate::Status;
        if matches!(status, Status::Absent | Status::NotApplied) {
            !matches!(self, NodeState::Started | NodeState::Configured)
        } else {
            true
        }
    }

    /// State a node should settle into after a successful workflow run,
    /// used by the runner to update `node_state` alongside `local_status`.
    pub fn after_success(action: Action) -> NodeState {
        match action {
            Action::Deploy => NodeState::Started,
            Action::Undeploy => NodeState::Deleted,
            Action::Stop => NodeState::Stopped,
            Action::Check | Action::Discover | Action::Run => NodeState::Created,
        }
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
