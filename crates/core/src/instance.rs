// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The live instance graph: runtime manifestations of templates, linked by
//! parent/child and requirement/capability/relationship edges.

use crate::action::NodeState;
use crate::status::{OperationalDependency, Priority, Status};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Integer handle into the [`crate::graph::TopologyGraph`] instance arena.
/// Relationship edges hold handles, not owning pointers, so the graph can
/// contain back-reference cycles (a capability knows its owner; the owner
/// lists capabilities) without reference counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceHandle(pub u32);

/// Integer handle into the template arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateHandle(pub u32);

/// Who created an instance, for cascade-delete bookkeeping: `Yes` means
/// the instance's own delete operation reverses its own deploy;
/// `Task(id)` means a different instance's task created it and is
/// responsible for deleting it on undeploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Created {
    No,
    Yes,
    Task(String),
}

impl Created {
    pub fn is_created(&self) -> bool {
        !matches!(self, Created::No)
    }
}

impl Default for Created {
    fn default() -> Self {
        Created::No
    }
}

/// A live edge linking a requirement on the source instance to a capability
/// on some target instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub requirement_name: String,
    pub target: InstanceHandle,
    pub target_capability: String,
    #[serde(default)]
    pub relationship_type: Option<String>,
}

/// Runtime manifestation of a template, one per topology node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub template: TemplateHandle,
    pub parent: Option<InstanceHandle>,
    #[serde(default)]
    pub children: Vec<InstanceHandle>,
    #[serde(default)]
    pub requirements: Vec<Relationship>,
    /// Mutable runtime attribute map (outputs written here by tasks).
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub local_status: Status,
    /// Manual override that replaces `local_status` before aggregation,
    /// without suppressing propagation from dependencies unless it is a
    /// terminal error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_override: Option<Status>,
    #[serde(default)]
    pub node_state: NodeState,
    #[serde(default)]
    pub priority: Priority,
    /// Monotonically increasing changeId of the last task that wrote
    /// attributes/config for this instance.
    #[serde(default)]
    pub last_config_change: Option<String>,
    #[serde(default)]
    pub last_state_change: Option<String>,
    #[serde(default)]
    pub created: Created,
    #[serde(default)]
    pub protected: bool,
}

impl Instance {
    pub fn new(name: impl Into<String>, template: TemplateHandle) -> Self {
        Self {
            name: name.into(),
            template,
            parent: None,
            children: Vec::new(),
            requirements: Vec::new(),
            attributes: HashMap::new(),
            local_status: Status::Unknown,
            status_override: None,
            node_state: NodeState::Initial,
            priority: Priority::Optional,
            last_config_change: None,
            last_state_change: None,
            created: Created::No,
            protected: false,
        }
    }

    /// The status used as the basis for aggregation: the override if set,
    /// else `local_status`.
    pub fn effective_status(&self) -> Status {
        self.status_override.unwrap_or(self.local_status)
    }

    /// Invariant 4 check: absent/notapplied status is
    /// incompatible with a started/configured node state.
    pub fn is_consistent(&self) -> bool {
        self.node_state.compatible_with(self.effective_status())
    }
}

/// A view of an instance as a dependency in status aggregation: its
/// effective status paired with the declared priority of the edge that
/// refers to it (not the instance's own default priority, since the same
/// instance may be depended on with different priorities from different
/// subjects).
pub struct InstanceDependency {
    pub priority: Priority,
    pub status: Status,
}

impl OperationalDependency for InstanceDependency {
    fn priority(&self) -> Priority {
        self.priority
    }
    fn status(&self) -> Status {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_status_prefers_override() {
        let mut inst = Instance::new("a", TemplateHandle(0));
        inst.local_status = Status::Ok;
        assert_eq!(inst.effective_status(), Status::Ok);
        inst.status_override = Some(Status::Degraded);
        assert_eq!(inst.effective_status(), Status::Degraded);
    }

    #[test]
    fn consistency_invariant_flags_started_absent() {
        let mut inst = Instance::new("a", TemplateHandle(0));
        inst.local_status = Status::Absent;
        inst.node_state = NodeState::Started;
        assert!(!inst.is_consistent());
        inst.node_state = NodeState::Deleted;
        assert!(inst.is_consistent());
    }

    #[test]
    fn created_task_cascade_marker_round_trips() {
        let c = Created::Task("chg-001".to_string());
        assert!(c.is_created());
        assert!(!Created::No.is_created());
    }
}
