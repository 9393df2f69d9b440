// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the reconciliation engine: one `thiserror` enum per
//! failure kind, each variant a distinct failure mode.

use std::time::Duration;
use thiserror::Error;

/// Kind 1: topology or inputs fail schema validation. Raised before any
/// task runs; the job aborts with `unexpectedAbort` set.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("required input {0:?} has no binding")]
    MissingInput(String),
    #[error("input {name:?} failed schema validation: {reason}")]
    SchemaViolation { name: String, reason: String },
}

/// Kind 2: unresolvable requirement or missing template. Recorded as a
/// task with `status=error, reason=plan`; does not halt the job unless the
/// unresolvable entity is required.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("requirement {requirement:?} on {target:?} could not be resolved")]
    UnresolvedRequirement { target: String, requirement: String },
    #[error("template {0:?} not found")]
    MissingTemplate(String),
    #[error("operation {interface}.{operation} not declared on template {target:?}")]
    MissingOperation { target: String, interface: String, operation: String },
}

/// Kind 3: `canRun` refusal, failed precondition, missing dependency. Task
/// is finished `skipped` with the textual reason; not fatal.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("required dependency {0:?} is not operational")]
    DependencyNotOperational(String),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("configurator refused to run: {0}")]
    CanRunRefused(String),
    #[error("dry-run requested but configurator does not support it")]
    DryRunUnsupported,
    #[error("input {0:?} failed schema validation: {1}")]
    InputSchema(String, String),
}

/// Kind 4: exception inside a configurator's `run`. The task finishes
/// pessimistically as `ConfiguratorResult { success: false, modified: true,
/// ready_state: Status::Error }`.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("configurator {configurator:?} failed running {interface}.{operation} on {target:?}: {source}")]
    ConfiguratorFailed {
        configurator: String,
        interface: String,
        operation: String,
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("configurator yielded a value other than a sub-task, sub-job, or terminal result")]
    ProtocolError,
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("expression evaluation failed: {0}")]
    Expr(#[from] crate::expr::ExprError),
}

/// Kind 5: success claimed but declared outputs missing or contracts
/// unmet. The task is demoted to `degraded`, not `error`.
#[derive(Debug, Error, Clone)]
#[error("postcondition unmet for {target:?}: {reason}")]
pub struct PostconditionWarning {
    pub target: String,
    pub reason: String,
}

/// Kind 6: exception from the runner itself or a persistence failure on
/// commit. The job is aborted and `unexpectedAbort` is set.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("runner failed: {message}")]
    Runner { message: String, backtrace: Option<String> },
    #[error("persistence commit failed: {0}")]
    Commit(String),
}

impl FatalError {
    /// Attach a formatted cause chain when `--verbose` is set, instead of
    /// relying on nightly `std::backtrace`.
    pub fn runner(message: impl Into<String>, verbose: bool, cause: &dyn std::error::Error) -> Self {
        let backtrace = verbose.then(|| format_cause_chain(cause));
        FatalError::Runner { message: message.into(), backtrace }
    }
}

fn format_cause_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}
