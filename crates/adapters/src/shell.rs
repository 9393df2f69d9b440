// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell command configurator: runs `inputs.command` via [`ens_shell`]
//! against a resolved `cwd`, with `inputs.dryrun` gating dry-run support
//! and `inputs.timeout` bounding the wait.

use async_trait::async_trait;
use ens_engine::{Configurator, ConfiguratorResult, RuntimeError, Step, StepResume, Task};
use ens_shell::ShellExecutor;
use std::time::Duration;
use tracing::{info, warn};

use crate::inputs::{opt_str, require_str};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Registry short name `"shell"`.
pub struct ShellConfigurator;

impl ShellConfigurator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Configurator for ShellConfigurator {
    fn can_dry_run(&self, task: &Task) -> bool {
        task.inputs.get("dryrun").and_then(|v| v.as_bool()).unwrap_or(false)
    }

    fn can_run(&self, task: &Task) -> Result<(), String> {
        if opt_str(&task.inputs, "command").is_none() {
            return Err("missing command to execute".to_string());
        }
        Ok(())
    }

    async fn render(&self, task: &Task) -> Result<serde_json::Value, RuntimeError> {
        let command = require_str(&task.inputs, "command", "shell", &task.interface, &task.operation, &task.target_name)?;
        let cwd = opt_str(&task.inputs, "cwd").map(str::to_string);
        Ok(serde_json::json!({ "command": command, "cwd": cwd }))
    }

    async fn run(&self, task: &Task, _resume: Option<StepResume>) -> Result<Step, RuntimeError> {
        let rendered = task.rendered.as_ref().expect("render runs before run");
        let command = rendered["command"].as_str().unwrap_or_default();
        let cwd = rendered["cwd"].as_str();

        let mut executor = ShellExecutor::new();
        if let Some(cwd) = cwd {
            executor = executor.cwd(cwd);
        }

        let timeout = task.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let outcome = tokio::time::timeout(timeout, executor.execute_str(command)).await;

        let result = match outcome {
            Err(_) => {
                warn!(target = %task.target_name, op = %task.operation, timeout_s = timeout.as_secs(), "shell task timed out");
                return Err(RuntimeError::Timeout(timeout));
            }
            Ok(Ok(output)) => {
                info!(target = %task.target_name, op = %task.operation, exit_code = output.exit_code, "shell task run success");
                ConfiguratorResult {
                    success: true,
                    modified: true,
                    applied: true,
                    ready_state: ens_core::Status::Ok,
                    config_changed: Some(true),
                    result: Some(serde_json::json!({
                        "exitCode": output.exit_code,
                        "traces": output.traces.iter().map(|t| serde_json::json!({
                            "command": t.command,
                            "exitCode": t.exit_code,
                        })).collect::<Vec<_>>(),
                    })),
                    outputs: Default::default(),
                    messages: vec![],
                }
            }
            Ok(Err(err)) => {
                warn!(target = %task.target_name, op = %task.operation, error = %err, "shell task run failure");
                ConfiguratorResult {
                    success: false,
                    modified: false,
                    applied: false,
                    ready_state: ens_core::Status::Error,
                    config_changed: Some(false),
                    result: None,
                    outputs: Default::default(),
                    messages: vec![err.to_string()],
                }
            }
        };

        Ok(Step::Done(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ens_core::{ChangeId, Instance, Template, TopologyGraph};
    use ens_core::TaskRequest;

    fn test_task(command: &str) -> Task {
        let mut graph = TopologyGraph::new();
        let t = graph.add_template(Template::new("n", "my.Type"));
        let h = graph.add_instance(Instance::new("n", t));
        let request = TaskRequest::new(h, "Standard", "configure", "test").required(true);
        let mut task = Task::new(ChangeId::new(1, 1), h, "n".to_string(), &request, "shell");
        task.inputs.insert("command".to_string(), serde_json::json!(command));
        task
    }

    #[tokio::test]
    async fn can_run_rejects_missing_command() {
        let configurator = ShellConfigurator::new();
        let mut task = test_task("echo hi");
        task.inputs.remove("command");
        assert!(configurator.can_run(&task).is_err());
    }

    #[tokio::test]
    async fn run_executes_command_and_reports_success() {
        let configurator = ShellConfigurator::new();
        let mut task = test_task("echo hello");
        task.rendered = Some(configurator.render(&task).await.unwrap());
        let step = configurator.run(&task, None).await.unwrap();
        match step {
            Step::Done(result) => assert!(result.success),
            _ => panic!("expected Done"),
        }
    }

    #[tokio::test]
    async fn can_dry_run_follows_input_flag() {
        let configurator = ShellConfigurator::new();
        let mut task = test_task("echo hi");
        assert!(!configurator.can_dry_run(&task));
        task.inputs.insert("dryrun".to_string(), serde_json::json!(true));
        assert!(configurator.can_dry_run(&task));
    }
}
