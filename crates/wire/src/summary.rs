// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job summary output: the JSON shape the CLI prints and the
//! shape other tooling consumes.

use serde::{Deserialize, Serialize};

/// `job{id,status,total,ok,error,unknown,skipped,changed}` plus the task
/// list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job: JobTotals,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTotals {
    pub id: String,
    pub status: String,
    pub total: usize,
    pub ok: usize,
    pub error: usize,
    pub unknown: usize,
    pub skipped: usize,
    pub changed: usize,
}

/// One entry of `tasks[]`: `{target, operation, template, type,
/// targetStatus, targetState, status, configurator, priority, reason,
/// changed}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub target: String,
    pub operation: String,
    pub template: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub target_status: String,
    pub target_state: String,
    pub status: String,
    pub configurator: String,
    pub priority: String,
    pub reason: String,
    pub changed: bool,
}

impl JobSummary {
    /// Fold `tasks` into the `job{}` totals block; `ok`/`error`/`unknown`
    /// count by `TaskSummary::status`, `skipped` counts tasks with
    /// `status == "pending"` and `changed == false`, `changed` counts tasks
    /// whose result was `modified == true`.
    pub fn new(id: impl Into<String>, overall_status: impl Into<String>, tasks: Vec<TaskSummary>) -> Self {
        let total = tasks.len();
        let ok = tasks.iter().filter(|t| t.status == "ok").count();
        let error = tasks.iter().filter(|t| t.status == "error").count();
        let unknown = tasks.iter().filter(|t| t.status == "unknown").count();
        let skipped = tasks.iter().filter(|t| !t.changed && t.status == "pending").count();
        let changed = tasks.iter().filter(|t| t.changed).count();
        Self {
            job: JobTotals { id: id.into(), status: overall_status.into(), total, ok, error, unknown, skipped, changed },
            tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: &str, changed: bool) -> TaskSummary {
        TaskSummary {
            target: "release".to_string(),
            operation: "create".to_string(),
            template: "release".to_string(),
            type_name: "my.Helm".to_string(),
            target_status: status.to_string(),
            target_state: "started".to_string(),
            status: status.to_string(),
            configurator: "helm".to_string(),
            priority: "required".to_string(),
            reason: "add".to_string(),
            changed,
        }
    }

    #[test]
    fn totals_fold_from_task_list() {
        let tasks = vec![task("ok", true), task("ok", true), task("error", false)];
        let summary = JobSummary::new("job-1", "error", tasks);
        assert_eq!(summary.job.total, 3);
        assert_eq!(summary.job.ok, 2);
        assert_eq!(summary.job.error, 1);
        assert_eq!(summary.job.changed, 2);
    }

    #[test]
    fn serializes_with_spec_key_names() {
        let summary = JobSummary::new("job-1", "ok", vec![task("ok", true)]);
        let v = serde_json::to_value(&summary).unwrap();
        assert!(v["tasks"][0].get("type").is_some());
        assert!(v["tasks"][0].get("targetStatus").is_some());
        assert!(v["job"].get("changed").is_some());
    }
}
