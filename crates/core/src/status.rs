// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operational status, priority, and the dependency aggregation rule.

use serde::{Deserialize, Serialize};

/// Operational status of an instance, task, or dependency.
///
/// Ordered `ok < degraded < error < pending < notapplied < absent < unknown`.
/// `ok` and `degraded` are the only [`Status::is_operational`] states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Degraded,
    Error,
    Pending,
    NotApplied,
    Absent,
    Unknown,
}

crate::simple_display! {
    Status {
        Ok => "ok",
        Degraded => "degraded",
        Error => "error",
        Pending => "pending",
        NotApplied => "notapplied",
        Absent => "absent",
        Unknown => "unknown",
    }
}

impl Status {
    /// `ok` and `degraded` are operational; everything else is not.
    pub fn is_operational(self) -> bool {
        matches!(self, Status::Ok | Status::Degraded)
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Unknown
    }
}

/// Dependency priority: gates whether a non-operational dependency is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Ignore,
    Optional,
    Required,
}

crate::simple_display! {
    Priority {
        Ignore => "ignore",
        Optional => "optional",
        Required => "required",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Optional
    }
}

/// Anything that participates in status aggregation: a dependency edge seen
/// from the subject whose status is being rolled up.
pub trait OperationalDependency {
    fn priority(&self) -> Priority;
    fn status(&self) -> Status;

    fn is_operational(&self) -> bool {
        self.status().is_operational()
    }
}

/// Roll up `default_status` against an ordered list of dependencies per the
/// aggregation rule:
///
/// ```text
/// for each dep d, in declaration order:
///   if d.priority == ignore: skip
///   if d.required:
///     if not d.operational: return error        # short-circuit
///     if d.status == degraded: accumulated = degraded
///   else:
///     if not d.operational: accumulated = degraded
/// return accumulated (else default_status)
/// ```
///
/// Required dependencies gate the subject outright; optional dependencies
/// only ever downgrade to `degraded`. The short-circuit on the first failed
/// required dependency keeps this O(deps) and makes the result independent
/// of how many further dependencies would also have failed.
pub fn aggregate_status<'a, D: OperationalDependency + 'a>(
    default_status: Status,
    deps: impl IntoIterator<Item = &'a D>,
) -> Status {
    let mut accumulated = default_status;
    for dep in deps {
        if dep.priority() == Priority::Ignore {
            continue;
        }
        if dep.priority() == Priority::Required {
            if !dep.is_operational() {
                return Status::Error;
            }
            if dep.status() == Status::Degraded {
                accumulated = Status::Degraded;
            }
        } else if !dep.is_operational() {
            accumulated = Status::Degraded;
        }
    }
    accumulated
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
