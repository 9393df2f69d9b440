// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build the CLI-facing `ens-wire::JobSummary` from a completed job's
//! `runner::JobSummaryData` plus the instance graph it ran against.

use ens_core::TopologyGraph;
use ens_wire::{JobSummary, TaskSummary};

use crate::runner::JobSummaryData;

pub fn build(job_id: impl Into<String>, graph: &TopologyGraph, data: &JobSummaryData) -> JobSummary {
    let tasks: Vec<TaskSummary> = data
        .tasks
        .iter()
        .map(|outcome| {
            let target = graph.instance_by_name(&outcome.target_name);
            let (template_name, type_name) = target
                .map(|h| {
                    let inst = graph.instance(h);
                    let t = graph.template(inst.template);
                    (t.name.clone(), t.type_name().to_string())
                })
                .unwrap_or_else(|| (outcome.target_name.clone(), String::new()));
            let node_state = target
                .map(|h| graph.instance(h).node_state.to_string())
                .unwrap_or_default();

            TaskSummary {
                target: outcome.target_name.clone(),
                operation: outcome.operation.clone(),
                template: template_name,
                type_name,
                target_status: outcome.status.to_string(),
                target_state: node_state,
                status: outcome.status.to_string(),
                configurator: outcome.configurator.clone(),
                priority: outcome.priority.to_string(),
                reason: outcome.reason.clone(),
                changed: outcome.changed,
            }
        })
        .collect();

    JobSummary::new(job_id, data.status().to_string(), tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::TaskOutcome;
    use ens_core::{Instance, Priority, Status, Template};

    #[test]
    fn builds_summary_with_resolved_template_type() {
        let mut g = TopologyGraph::new();
        let t = g.add_template(Template::new("release", "my.Helm"));
        g.add_instance(Instance::new("release", t));

        let data = JobSummaryData {
            tasks: vec![TaskOutcome {
                target_name: "release".to_string(),
                interface: "Standard".to_string(),
                operation: "create".to_string(),
                configurator: "helm".to_string(),
                priority: Priority::Required,
                reason: "add".to_string(),
                status: Status::Ok,
                changed: true,
                change_record: None,
            }],
            unexpected_abort: false,
        };

        let summary = build("job-1", &g, &data);
        assert_eq!(summary.job.total, 1);
        assert_eq!(summary.job.ok, 1);
        assert_eq!(summary.tasks[0].type_name, "my.Helm");
    }
}
