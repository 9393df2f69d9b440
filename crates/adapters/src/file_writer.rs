// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Templated file writer configurator: renders `inputs.template` through
//! `handlebars` against `inputs.variables` and writes the result to
//! `inputs.path`, creating parent directories as needed.

use std::path::Path;

use async_trait::async_trait;
use ens_core::Status;
use ens_engine::{Configurator, ConfiguratorResult, RuntimeError, Step, StepResume, Task};
use handlebars::Handlebars;
use tracing::info;

use crate::inputs::require_str;

/// Registry short name `"file"`.
pub struct FileWriterConfigurator;

impl FileWriterConfigurator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileWriterConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

fn fail(task: &Task, message: impl Into<String>) -> RuntimeError {
    RuntimeError::ConfiguratorFailed {
        configurator: "file".to_string(),
        interface: task.interface.clone(),
        operation: task.operation.clone(),
        target: task.target_name.clone(),
        source: Box::new(std::io::Error::new(std::io::ErrorKind::Other, message.into())),
    }
}

#[async_trait]
impl Configurator for FileWriterConfigurator {
    fn can_dry_run(&self, _task: &Task) -> bool {
        true
    }

    fn can_run(&self, task: &Task) -> Result<(), String> {
        if task.inputs.get("path").and_then(|v| v.as_str()).is_none() {
            return Err("missing destination path".to_string());
        }
        Ok(())
    }

    async fn render(&self, task: &Task) -> Result<serde_json::Value, RuntimeError> {
        let path = require_str(&task.inputs, "path", "file", &task.interface, &task.operation, &task.target_name)?;
        let template = task.inputs.get("template").and_then(|v| v.as_str()).unwrap_or("");
        let variables = task.inputs.get("variables").cloned().unwrap_or(serde_json::json!({}));

        let registry = Handlebars::new();
        let rendered = registry
            .render_template(template, &variables)
            .map_err(|e| fail(task, format!("template render failed: {e}")))?;

        Ok(serde_json::json!({ "path": path, "content": rendered }))
    }

    async fn run(&self, task: &Task, _resume: Option<StepResume>) -> Result<Step, RuntimeError> {
        let rendered = task.rendered.as_ref().expect("render runs before run");
        let path = rendered["path"].as_str().unwrap_or_default();
        let content = rendered["content"].as_str().unwrap_or_default();

        if task.dry_run {
            return Ok(Step::Done(ConfiguratorResult::skipped("dry-run: file not written")));
        }

        let existing = tokio::fs::read_to_string(path).await.ok();
        let changed = existing.as_deref() != Some(content);

        if changed {
            if let Some(parent) = Path::new(path).parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| fail(task, format!("failed to create {}: {e}", parent.display())))?;
            }
            tokio::fs::write(path, content)
                .await
                .map_err(|e| fail(task, format!("failed to write {path}: {e}")))?;
            info!(target = %task.target_name, path, "wrote file");
        }

        Ok(Step::Done(ConfiguratorResult {
            success: true,
            modified: changed,
            applied: true,
            ready_state: Status::Ok,
            config_changed: Some(changed),
            result: Some(serde_json::json!({ "path": path })),
            outputs: Default::default(),
            messages: vec![],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ens_core::{ChangeId, Instance, Template, TopologyGraph};
    use ens_core::TaskRequest;

    fn test_task(path: &str, template: &str) -> Task {
        let mut graph = TopologyGraph::new();
        let t = graph.add_template(Template::new("n", "my.Type"));
        let h = graph.add_instance(Instance::new("n", t));
        let request = TaskRequest::new(h, "Standard", "configure", "test").required(true);
        let mut task = Task::new(ChangeId::new(1, 1), h, "n".to_string(), &request, "file");
        task.inputs.insert("path".to_string(), serde_json::json!(path));
        task.inputs.insert("template".to_string(), serde_json::json!(template));
        task
    }

    #[tokio::test]
    async fn writes_rendered_content_and_reports_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.conf");
        let configurator = FileWriterConfigurator::new();
        let mut task = test_task(path.to_str().unwrap(), "host={{host}}");
        task.inputs.insert("variables".to_string(), serde_json::json!({"host": "db1"}));
        task.rendered = Some(configurator.render(&task).await.unwrap());

        let step = configurator.run(&task, None).await.unwrap();
        match step {
            Step::Done(result) => assert!(result.modified),
            _ => panic!("expected Done"),
        }
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "host=db1");
    }

    #[tokio::test]
    async fn unchanged_content_reports_no_modification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.conf");
        tokio::fs::write(&path, "host=db1").await.unwrap();

        let configurator = FileWriterConfigurator::new();
        let mut task = test_task(path.to_str().unwrap(), "host={{host}}");
        task.inputs.insert("variables".to_string(), serde_json::json!({"host": "db1"}));
        task.rendered = Some(configurator.render(&task).await.unwrap());

        let step = configurator.run(&task, None).await.unwrap();
        match step {
            Step::Done(result) => assert!(!result.modified),
            _ => panic!("expected Done"),
        }
    }
}
