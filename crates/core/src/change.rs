// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change identifiers, the append-only change log entry, and live
//! dependency predicates.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::action::Action;
use crate::status::{Priority, Status};

/// A monotonically assigned, lexicographically sortable token carrying the
/// job ordinal and task ordinal. Zero-padded decimal fields so that string comparison
/// agrees with numeric comparison: `a.changeId < b.changeId` lexically iff
/// `a` ran before `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ChangeId {
    pub job_ordinal: u32,
    pub task_ordinal: u32,
}

impl ChangeId {
    pub fn new(job_ordinal: u32, task_ordinal: u32) -> Self {
        Self { job_ordinal, task_ordinal }
    }

    /// The changeId of the first task run by the job that produced this
    /// one — used as a sub-task's `parent_id` when it shares the job.
    pub fn job_start(job_ordinal: u32) -> Self {
        Self { job_ordinal, task_ordinal: 0 }
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}.{:08}", self.job_ordinal, self.task_ordinal)
    }
}

impl PartialOrd for ChangeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChangeId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.job_ordinal, self.task_ordinal).cmp(&(other.job_ordinal, other.task_ordinal))
    }
}

impl From<ChangeId> for String {
    fn from(id: ChangeId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct InvalidChangeId(pub String);

impl fmt::Display for InvalidChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid change id: {:?}", self.0)
    }
}
impl std::error::Error for InvalidChangeId {}

impl TryFrom<String> for ChangeId {
    type Error = InvalidChangeId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let (job, task) = s.split_once('.').ok_or_else(|| InvalidChangeId(s.clone()))?;
        let job_ordinal = job.parse().map_err(|_| InvalidChangeId(s.clone()))?;
        let task_ordinal = task.parse().map_err(|_| InvalidChangeId(s.clone()))?;
        Ok(ChangeId { job_ordinal, task_ordinal })
    }
}

/// A resource-level mutation recorded alongside the task's terminal result,
/// for audit display (`changes[].resourceChanges`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
}

/// The outcome a task's terminal [`crate::status::Status`] settled into,
/// kept alongside free-form messages for postcondition warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultSummary {
    pub status: Status,
    pub success: bool,
    pub modified: bool,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Immutable audit entry for one executed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub change_id: ChangeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChangeId>,
    pub start_time_ms: u64,
    /// Revisioning commit this record was persisted under (git-based
    /// revisioning is an external collaborator; this is just its id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
    pub action: Action,
    pub target: String,
    pub inputs_digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies_digest: Option<String>,
    pub result: TaskResultSummary,
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
}

/// A live predicate attached to a task/instance:
/// a reference expression evaluated against the instance graph, compared
/// to an expected value, participating both in status aggregation and in
/// "changed since" checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    /// Expression over the instance graph (e.g. `::node::attr` or a
    /// structured `get_attribute` reference); opaque to `ens-core`, which
    /// only stores the source text. Evaluated lazily by
    /// `ens-engine::expr`.
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<serde_json::Value>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub want_list: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_observed: Option<serde_json::Value>,
    /// Status this dependency currently contributes to aggregation.
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
}

fn default_required() -> bool {
    true
}

impl crate::status::OperationalDependency for Dependency {
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
    fn change_id_display_is_lexicographically_sortable_like_numeric() {
        let ids = [
            ChangeId::new(1, 9),
            ChangeId::new(1, 10),
            ChangeId::new(2, 0),
        ];
        let mut strings: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
        let sorted_numeric: Vec<ChangeId> = {
            let mut v = ids.to_vec();
            v.sort();
            v
        };
        strings.sort();
        let expected: Vec<String> = sorted_numeric.iter().map(|i| i.to_string()).collect();
        assert_eq!(strings, expected);
    }

    #[test]
    fn change_id_round_trips_through_string() {
        let id = ChangeId::new(42, 7);
        let s = id.to_string();
        let parsed: ChangeId = ChangeId::try_from(s).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn change_id_ordering_compares_job_before_task() {
        assert!(ChangeId::new(1, 999) < ChangeId::new(2, 0));
    }
}
