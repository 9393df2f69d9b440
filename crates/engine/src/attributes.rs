// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The attribute manager: the only mutable view of instance attributes
//! during a task, owning the pre-task snapshot used to revert mutations
//! when a task's result is `applied=false, ready_state=notapplied`.

use ens_core::{InstanceHandle, TopologyGraph};
use std::collections::HashMap;

/// A snapshot of one instance's attribute map taken before a task runs
/// against it, so the runner can restore it verbatim on revert. A
/// sub-task's own snapshot is independent and is never folded into its
/// parent's — reverting the parent does not touch attributes a sub-task
/// wrote, since those belong to the sub-task's own `ChangeRecord`.
pub struct AttributeSnapshot {
    target: InstanceHandle,
    attributes: HashMap<String, serde_json::Value>,
}

impl AttributeSnapshot {
    pub fn capture(graph: &TopologyGraph, target: InstanceHandle) -> Self {
        Self { target, attributes: graph.instance(target).attributes.clone() }
    }

    /// Restore the target's attribute map to this snapshot, discarding any
    /// mutations the task performed directly on it.
    pub fn revert(self, graph: &mut TopologyGraph) {
        graph.instance_mut(self.target).attributes = self.attributes;
    }
}

/// Write a configurator's declared `outputs` into the target's attribute
/// map under the keys it names.
pub fn apply_outputs(
    graph: &mut TopologyGraph,
    target: InstanceHandle,
    outputs: &HashMap<String, serde_json::Value>,
) {
    let attrs = &mut graph.instance_mut(target).attributes;
    for (k, v) in outputs {
        attrs.insert(k.clone(), v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ens_core::{Instance, Template};

    #[test]
    fn revert_restores_pre_task_attributes_only() {
        let mut g = TopologyGraph::new();
        let t = g.add_template(Template::new("t", "my.Type"));
        let h = g.add_instance(Instance::new("a", t));
        g.instance_mut(h).attributes.insert("x".to_string(), serde_json::json!(1));

        let snapshot = AttributeSnapshot::capture(&g, h);
        g.instance_mut(h).attributes.insert("x".to_string(), serde_json::json!(2));
        g.instance_mut(h).attributes.insert("y".to_string(), serde_json::json!(3));

        snapshot.revert(&mut g);
        assert_eq!(g.instance(h).attributes.get("x"), Some(&serde_json::json!(1)));
        assert_eq!(g.instance(h).attributes.get("y"), None);
    }
}
