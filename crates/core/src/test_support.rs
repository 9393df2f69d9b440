// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for building small topology graphs, for use across
//! crates. Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::graph::TopologyGraph;
use crate::instance::{Instance, InstanceHandle};
use crate::status::Status;
use crate::template::Template;

/// Add a template/instance pair named `name` of type `type_name` under
/// `parent` (if any), returning its handle. A convenience for scenario
/// tests that build small trees (helm-release-style ensembles, etc.).
pub fn add_node(
    graph: &mut TopologyGraph,
    name: &str,
    type_name: &str,
    parent: Option<InstanceHandle>,
) -> InstanceHandle {
    let template = graph.add_template(Template::new(name, type_name));
    let instance = graph.add_instance(Instance::new(name, template));
    if let Some(p) = parent {
        graph.attach_child(p, instance);
    }
    instance
}

/// Set an instance's local status directly (bypassing the runner), for
/// tests that assert planner/status-algebra behavior in isolation.
pub fn set_status(graph: &mut TopologyGraph, handle: InstanceHandle, status: Status) {
    graph.instance_mut(handle).local_status = status;
}

#[cfg(feature = "test-support")]
pub mod strategies {
    use crate::status::{Priority, Status};
    use proptest::prelude::*;

    pub fn arb_status() -> impl Strategy<Value = Status> {
        prop_oneof![
            Just(Status::Ok),
            Just(Status::Degraded),
            Just(Status::Error),
            Just(Status::Pending),
            Just(Status::NotApplied),
            Just(Status::Absent),
            Just(Status::Unknown),
        ]
    }

    pub fn arb_priority() -> impl Strategy<Value = Priority> {
        prop_oneof![Just(Priority::Ignore), Just(Priority::Optional), Just(Priority::Required)]
    }
}
