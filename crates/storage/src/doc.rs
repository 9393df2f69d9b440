// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted document model: an `Ensemble`/`Manifest`
//! with a topology source, additive instance templates, a status tree of
//! instance records, the append-only change log, input bindings, and an
//! optional lock file. This is the on-disk shape; `ens_core::Instance`
//! is its in-memory, handle-based counterpart used by the live topology
//! graph — `status.topology.instances` here is keyed by instance name and
//! carries string template names instead of arena handles, so it survives
//! a process restart.

use std::collections::HashMap;

use ens_core::{ChangeRecord, NodeState, Priority, Status};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `readyState` in the persisted document: the instance's own status
/// alongside its lifecycle node state, mirroring `Instance::local_status`
/// / `Instance::node_state` but flattened for serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyState {
    pub local: Status,
    pub state: NodeState,
}

/// One entry of `status.topology.instances`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub template: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default)]
    pub ready_state: ReadyState,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub capabilities: HashMap<String, Value>,
    #[serde(default)]
    pub requirements: HashMap<String, Value>,
    #[serde(default)]
    pub children: HashMap<String, InstanceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_from: Option<String>,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnsembleSpec {
    #[serde(default)]
    pub service_template: Value,
    #[serde(default)]
    pub instances: Value,
    #[serde(default)]
    pub installers: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub instances: HashMap<String, InstanceRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnsembleStatus {
    #[serde(default)]
    pub topology: Topology,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default)]
    pub inputs: Value,
}

/// The top-level persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ensemble {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub spec: EnsembleSpec,
    #[serde(default)]
    pub status: EnsembleStatus,
    #[serde(default)]
    pub changes: Vec<ChangeRecord>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<Value>,
}

impl Ensemble {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            api_version: "unfurl/v1".to_string(),
            kind: kind.into(),
            spec: EnsembleSpec::default(),
            status: EnsembleStatus::default(),
            changes: Vec::new(),
            environment: Environment::default(),
            lock: None,
        }
    }

    pub fn is_manifest(&self) -> bool {
        self.kind == "Ensemble" || self.kind == "Manifest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_topology_has_no_instances() {
        let doc = Ensemble::new("Ensemble");
        assert!(doc.status.topology.instances.is_empty());
        assert!(doc.changes.is_empty());
    }

    #[test]
    fn api_version_and_kind_serialize_with_camel_case_keys() {
        let doc = Ensemble::new("Ensemble");
        let yaml = serde_yaml::to_string(&doc).unwrap();
        assert!(yaml.contains("apiVersion:"));
        assert!(yaml.contains("kind: Ensemble"));
    }

    #[test]
    fn instance_record_children_nest_recursively() {
        let mut child = InstanceRecord { template: "child_type".to_string(), ..Default::default() };
        child.ready_state.local = Status::Ok;
        let mut root = InstanceRecord { template: "root_type".to_string(), ..Default::default() };
        root.children.insert("child1".to_string(), child);
        assert_eq!(root.children["child1"].template, "child_type");
        assert_eq!(root.children["child1"].ready_state.local, Status::Ok);
    }
}
