// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobOptions`: the planner/runner configuration surface, one field per
//! CLI flag. Mirrors `unfurl/job.py`'s `JobOptions`, which also carries a
//! `starttime` used to seed the job's first `ChangeId`.

use ens_core::Action;

/// `--repair {error|degraded|notapplied|none}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairPolicy {
    #[default]
    None,
    Degraded,
    Error,
    NotApplied,
}

impl RepairPolicy {
    /// Whether this policy repairs an instance currently in `status`.
    pub fn repairs(self, status: ens_core::Status) -> bool {
        use ens_core::Status;
        match self {
            RepairPolicy::None => false,
            RepairPolicy::Error => matches!(status, Status::Error),
            RepairPolicy::Degraded => matches!(status, Status::Error | Status::Degraded),
            RepairPolicy::NotApplied => {
                matches!(status, Status::Error | Status::Degraded | Status::NotApplied)
            }
        }
    }
}

/// Job-scoped options threaded through the planner and runner, one field
/// per CLI flag.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub workflow: Action,
    pub add: bool,
    pub update: bool,
    pub upgrade: bool,
    pub repair: RepairPolicy,
    pub all: bool,
    pub revert_obsolete: bool,
    pub readonly: bool,
    pub required_only: bool,
    /// `--resource NAME` / `--instance NAME` (repeatable); empty means
    /// unscoped (every candidate is in scope).
    pub resources: Vec<String>,
    pub plan_only: bool,
    pub dry_run: bool,
    pub verbose: bool,
    /// Wall-clock job start, used to seed `ChangeId::job_start` and stamp
    /// `ChangeRecord::start_time_ms` (`unfurl/job.py`'s `starttime`).
    pub start_time_ms: u64,
}

impl JobOptions {
    pub fn new(workflow: Action, start_time_ms: u64) -> Self {
        Self {
            workflow,
            add: false,
            update: false,
            upgrade: false,
            repair: RepairPolicy::None,
            all: false,
            revert_obsolete: false,
            readonly: false,
            required_only: false,
            resources: Vec::new(),
            plan_only: false,
            dry_run: false,
            verbose: false,
            start_time_ms,
        }
    }

    pub fn add(mut self, v: bool) -> Self {
        self.add = v;
        self
    }
    pub fn update(mut self, v: bool) -> Self {
        self.update = v;
        self
    }
    pub fn upgrade(mut self, v: bool) -> Self {
        self.upgrade = v;
        self
    }
    pub fn repair(mut self, v: RepairPolicy) -> Self {
        self.repair = v;
        self
    }
    pub fn all(mut self, v: bool) -> Self {
        self.all = v;
        self
    }
    pub fn revert_obsolete(mut self, v: bool) -> Self {
        self.revert_obsolete = v;
        self
    }
    pub fn readonly(mut self, v: bool) -> Self {
        self.readonly = v;
        self
    }
    pub fn required_only(mut self, v: bool) -> Self {
        self.required_only = v;
        self
    }
    pub fn resources(mut self, v: Vec<String>) -> Self {
        self.resources = v;
        self
    }
    pub fn plan_only(mut self, v: bool) -> Self {
        self.plan_only = v;
        self
    }
    pub fn dry_run(mut self, v: bool) -> Self {
        self.dry_run = v;
        self
    }
    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }

    /// Whether `name` is within `--resource`/`--instance` scope (unscoped
    /// when the list is empty).
    pub fn in_scope(&self, name: &str) -> bool {
        self.resources.is_empty() || self.resources.iter().any(|r| r == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_policy_thresholds_nest() {
        use ens_core::Status;
        assert!(!RepairPolicy::None.repairs(Status::Error));
        assert!(RepairPolicy::Error.repairs(Status::Error));
        assert!(!RepairPolicy::Error.repairs(Status::Degraded));
        assert!(RepairPolicy::Degraded.repairs(Status::Degraded));
        assert!(RepairPolicy::NotApplied.repairs(Status::NotApplied));
    }

    #[test]
    fn resource_scope_defaults_to_unscoped() {
        let opts = JobOptions::new(Action::Deploy, 0);
        assert!(opts.in_scope("anything"));
        let scoped = opts.resources(vec!["repo".to_string()]);
        assert!(scoped.in_scope("repo"));
        assert!(!scoped.in_scope("release"));
    }
}
