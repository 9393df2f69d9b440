// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster/package-manager configurator: applies or deletes one Kubernetes
//! resource described by `inputs.manifest` via server-side apply, talking
//! to the API server through `kube::Client::try_default` against an
//! arbitrary `DynamicObject` rather than one fixed pod spec.

use async_trait::async_trait;
use ens_core::Status;
use ens_engine::{Configurator, ConfiguratorResult, RuntimeError, Step, StepResume, Task};
use kube::api::{Api, DynamicObject, GroupVersionKind, Patch, PatchParams};
use kube::discovery::{self, Scope};
use kube::{Client, ResourceExt};
use tracing::{info, warn};

const FIELD_MANAGER: &str = "ens-adapters";

fn fail(task: &Task, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> RuntimeError {
    RuntimeError::ConfiguratorFailed {
        configurator: "cluster".to_string(),
        interface: task.interface.clone(),
        operation: task.operation.clone(),
        target: task.target_name.clone(),
        source: source.into(),
    }
}

/// Registry short name `"cluster"`.
pub struct ClusterConfigurator;

impl ClusterConfigurator {
    pub fn new() -> Self {
        Self
    }

    async fn api_for(
        &self,
        client: &Client,
        obj: &DynamicObject,
    ) -> Result<Api<DynamicObject>, kube::Error> {
        let gvk = if let Some(tm) = &obj.types {
            GroupVersionKind::try_from(tm).map_err(|e| kube::Error::Discovery(e.into()))?
        } else {
            return Err(kube::Error::Discovery(
                "manifest has no apiVersion/kind".into(),
            ));
        };
        let (resource, caps) = discovery::pinned_kind(client, &gvk).await?;
        let namespace = obj.namespace();
        Ok(match (caps.scope, namespace) {
            (Scope::Namespaced, Some(ns)) => Api::namespaced_with(client.clone(), &ns, &resource),
            _ => Api::all_with(client.clone(), &resource),
        })
    }
}

impl Default for ClusterConfigurator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Configurator for ClusterConfigurator {
    fn can_dry_run(&self, _task: &Task) -> bool {
        // kube's server-side apply supports a dry-run PatchParams flag, so
        // the real round trip can itself be a dry run.
        true
    }

    fn can_run(&self, task: &Task) -> Result<(), String> {
        if task.inputs.get("manifest").is_none() {
            return Err("missing resource manifest".to_string());
        }
        Ok(())
    }

    async fn render(&self, task: &Task) -> Result<serde_json::Value, RuntimeError> {
        let manifest = task
            .inputs
            .get("manifest")
            .cloned()
            .ok_or_else(|| fail(task, std::io::Error::new(std::io::ErrorKind::Other, "missing manifest")))?;
        Ok(manifest)
    }

    async fn run(&self, task: &Task, _resume: Option<StepResume>) -> Result<Step, RuntimeError> {
        let rendered = task.rendered.clone().expect("render runs before run");
        let obj: DynamicObject = serde_json::from_value(rendered).map_err(|e| fail(task, e))?;

        let client = Client::try_default().await.map_err(|e| fail(task, e))?;
        let api = self.api_for(&client, &obj).await.map_err(|e| fail(task, e))?;
        let name = obj.name_any();

        if task.operation == "delete" {
            match api.delete(&name, &Default::default()).await {
                Ok(_) => {
                    info!(target = %task.target_name, resource = %name, "cluster resource deleted");
                }
                Err(kube::Error::Api(e)) if e.code == 404 => {
                    info!(target = %task.target_name, resource = %name, "cluster resource already absent");
                }
                Err(e) => return Err(fail(task, e)),
            }
            return Ok(Step::Done(ConfiguratorResult {
                success: true,
                modified: true,
                applied: true,
                ready_state: Status::Ok,
                config_changed: Some(true),
                result: Some(serde_json::json!({"name": name})),
                outputs: Default::default(),
                messages: vec![],
            }));
        }

        let params = PatchParams::apply(FIELD_MANAGER).force();
        match api.patch(&name, &params, &Patch::Apply(&obj)).await {
            Ok(applied) => {
                info!(target = %task.target_name, resource = %name, "cluster resource applied");
                Ok(Step::Done(ConfiguratorResult {
                    success: true,
                    modified: true,
                    applied: true,
                    ready_state: Status::Ok,
                    config_changed: Some(true),
                    result: Some(serde_json::json!({"name": applied.name_any()})),
                    outputs: Default::default(),
                    messages: vec![],
                }))
            }
            Err(e) => {
                warn!(target = %task.target_name, resource = %name, error = %e, "cluster apply failed");
                Err(fail(task, e))
            }
        }
    }
}
