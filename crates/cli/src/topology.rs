// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the live `ens_core::TopologyGraph` a job runs against from a
//! persisted `Ensemble`: node templates come from
//! `spec.service_template`, instances are seeded from
//! `status.topology.instances`. Full TOSCA topology parsing (type
//! inheritance, node_filter matching, imports) is out of scope — this
//! loader only resolves what the planner and runner actually consult: a
//! template's operations, requirements, capabilities, and directives.

use std::collections::HashMap;

use ens_core::{
    Capability, Created, Directive, Directives, Instance, InterfaceOperation, Requirement, Template,
    TopologyGraph,
};
#[cfg(test)]
use ens_core::Status;
use ens_storage::{Ensemble, InstanceRecord};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("spec.service_template is not valid: {0}")]
    BadServiceTemplate(serde_json::Error),
    #[error("unknown directive {0:?} on node template {1:?}")]
    UnknownDirective(String, String),
}

#[derive(Debug, Default, Deserialize)]
struct ServiceTemplate {
    #[serde(default)]
    node_templates: HashMap<String, NodeTemplateSpec>,
    #[serde(default)]
    inputs: HashMap<String, InputSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct InputSpec {
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    default: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeTemplateSpec {
    #[serde(rename = "type", default)]
    type_name: String,
    #[serde(default)]
    properties: HashMap<String, serde_json::Value>,
    #[serde(default)]
    requirements: Vec<Requirement>,
    #[serde(default)]
    capabilities: Vec<Capability>,
    #[serde(default)]
    directives: Vec<String>,
    /// `{interface: {operation: InterfaceOperation-shaped}}`.
    #[serde(default)]
    interfaces: HashMap<String, HashMap<String, InterfaceOperationSpec>>,
}

#[derive(Debug, Deserialize)]
struct InterfaceOperationSpec {
    implementation: String,
    #[serde(default)]
    inputs: HashMap<String, serde_json::Value>,
    #[serde(default)]
    timeout: Option<u64>,
}

fn parse_directive(raw: &str, template_name: &str) -> Result<Directive, TopologyError> {
    match raw {
        "select" => Ok(Directive::Select),
        "default" => Ok(Directive::Default),
        "dependent" => Ok(Directive::Dependent),
        "discover" => Ok(Directive::Discover),
        "protected" => Ok(Directive::Protected),
        other => Err(TopologyError::UnknownDirective(other.to_string(), template_name.to_string())),
    }
}

fn build_template(name: &str, spec: &NodeTemplateSpec) -> Result<Template, TopologyError> {
    let mut template = Template::new(name, if spec.type_name.is_empty() { "tosca.nodes.Root" } else { &spec.type_name });
    template.properties = spec.properties.clone();
    template.requirements = spec.requirements.clone();
    template.capabilities = spec.capabilities.clone();
    let mut directives = Vec::with_capacity(spec.directives.len());
    for raw in &spec.directives {
        directives.push(parse_directive(raw, name)?);
    }
    template.directives = Directives(directives);
    for (interface, ops) in &spec.interfaces {
        for (operation, op_spec) in ops {
            template.operations.insert(
                (interface.clone(), operation.clone()),
                InterfaceOperation {
                    interface: interface.clone(),
                    operation: operation.clone(),
                    implementation: op_spec.implementation.clone(),
                    inputs: op_spec.inputs.clone(),
                    timeout: op_spec.timeout.map(std::time::Duration::from_secs),
                    pre_conditions: Vec::new(),
                    post_conditions: Vec::new(),
                },
            );
        }
    }
    Ok(template)
}

/// Build a `TopologyGraph` from `doc`, returning every top-level root (an
/// instance with no parent) in declaration order — the CLI plans each root
/// independently and concatenates the resulting task streams.
pub fn build_graph(doc: &Ensemble) -> Result<(TopologyGraph, Vec<ens_core::InstanceHandle>), TopologyError> {
    let service_template: ServiceTemplate = if doc.spec.service_template.is_null() {
        ServiceTemplate::default()
    } else {
        serde_json::from_value(doc.spec.service_template.clone()).map_err(TopologyError::BadServiceTemplate)?
    };

    let mut graph = TopologyGraph::new();
    for (name, spec) in &service_template.node_templates {
        graph.add_template(build_template(name, spec)?);
    }

    let mut roots = Vec::new();
    for (name, record) in &doc.status.topology.instances {
        let handle = seed_instance(&mut graph, name, record, &service_template)?;
        roots.push(handle);
    }

    // Node templates with no persisted instance yet (freshly added to the
    // spec) still need an instance so `--add` can plan them.
    let mut declared: Vec<&String> = service_template.node_templates.keys().collect();
    declared.sort();
    for name in declared {
        if graph.instance_by_name(name).is_none() {
            let template = graph.template_by_name(name).expect("just inserted above");
            let handle = graph.add_instance(Instance::new(name.clone(), template));
            roots.push(handle);
        }
    }

    Ok((graph, roots))
}

fn seed_instance(
    graph: &mut TopologyGraph,
    name: &str,
    record: &InstanceRecord,
    service_template: &ServiceTemplate,
) -> Result<ens_core::InstanceHandle, TopologyError> {
    let template_handle = match graph.template_by_name(&record.template) {
        Some(h) => h,
        None => {
            let spec = service_template.node_templates.get(&record.template).cloned().unwrap_or_default();
            graph.add_template(build_template(&record.template, &spec)?)
        }
    };

    let mut instance = Instance::new(name, template_handle);
    instance.attributes = record.attributes.clone();
    instance.local_status = record.ready_state.local;
    instance.node_state = record.ready_state.state;
    instance.priority = record.priority;
    instance.protected = record.protected;
    instance.created = if record.created_from.is_some() { Created::Yes } else { Created::No };
    let handle = graph.add_instance(instance);

    for (child_name, child_record) in &record.children {
        let child_handle = seed_instance(graph, child_name, child_record, service_template)?;
        graph.attach_child(handle, child_handle);
    }

    Ok(handle)
}

/// Declared top-level inputs from `spec.service_template.inputs`, for
/// validation before planning. An input counts as
/// required unless it carries a default or is explicitly marked optional.
pub fn declared_inputs(doc: &Ensemble) -> Result<Vec<ens_engine::validate::InputDeclaration>, TopologyError> {
    if doc.spec.service_template.is_null() {
        return Ok(Vec::new());
    }
    let service_template: ServiceTemplate =
        serde_json::from_value(doc.spec.service_template.clone()).map_err(TopologyError::BadServiceTemplate)?;
    let mut names: Vec<&String> = service_template.inputs.keys().collect();
    names.sort();
    Ok(names
        .into_iter()
        .map(|name| {
            let spec = &service_template.inputs[name];
            let required = spec.required.unwrap_or(spec.default.is_none());
            ens_engine::validate::InputDeclaration { name: name.clone(), required }
        })
        .collect())
}

/// Produce `status.topology.instances` from a graph after a job has run,
/// so the runner's writes to `Instance` fields survive persistence.
pub fn graph_to_instance_records(
    graph: &TopologyGraph,
    roots: &[ens_core::InstanceHandle],
) -> HashMap<String, InstanceRecord> {
    let mut out = HashMap::new();
    for &root in roots {
        let instance = graph.instance(root);
        out.insert(instance.name.clone(), instance_to_record(graph, root));
    }
    out
}

fn instance_to_record(graph: &TopologyGraph, handle: ens_core::InstanceHandle) -> InstanceRecord {
    let instance = graph.instance(handle);
    let template = graph.template(instance.template);
    let mut children = HashMap::new();
    for &child in &instance.children {
        let child_instance = graph.instance(child);
        children.insert(child_instance.name.clone(), instance_to_record(graph, child));
    }
    InstanceRecord {
        template: template.name.clone(),
        attributes: instance.attributes.clone(),
        ready_state: ens_storage::ReadyState { local: instance.effective_status(), state: instance.node_state },
        priority: instance.priority,
        capabilities: template.capabilities.iter().map(|c| (c.name.clone(), serde_json::json!(c.type_name))).collect(),
        requirements: template.requirements.iter().map(|r| (r.name.clone(), serde_json::json!(r.node))).collect(),
        children,
        created_on: instance.last_state_change.clone(),
        created_from: match &instance.created {
            Created::Task(id) => Some(id.clone()),
            Created::Yes => Some("self".to_string()),
            Created::No => None,
        },
        protected: instance.protected,
    }
}

impl Clone for NodeTemplateSpec {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name.clone(),
            properties: self.properties.clone(),
            requirements: self.requirements.clone(),
            capabilities: self.capabilities.clone(),
            directives: self.directives.clone(),
            interfaces: self.interfaces.clone(),
        }
    }
}

impl Clone for InterfaceOperationSpec {
    fn clone(&self) -> Self {
        Self { implementation: self.implementation.clone(), inputs: self.inputs.clone(), timeout: self.timeout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Ensemble {
        let raw = r#"
apiVersion: unfurl/v1
kind: Ensemble
spec:
  service_template:
    node_templates:
      db:
        type: my.Database
        interfaces:
          Standard:
            configure:
              implementation: shell
              inputs:
                cmd: "true"
status:
  topology:
    instances:
      db:
        template: db
        readyState:
          local: ok
          state: started
"#;
        let (doc, _) = ens_storage::load(raw).unwrap();
        doc
    }

    #[test]
    fn build_graph_seeds_instances_from_status_topology() {
        let doc = sample_doc();
        let (graph, roots) = build_graph(&doc).unwrap();
        assert_eq!(roots.len(), 1);
        let instance = graph.instance(roots[0]);
        assert_eq!(instance.name, "db");
        assert_eq!(instance.local_status, Status::Ok);
        let template = graph.template(instance.template);
        assert!(template.operation("Standard", "configure").is_some());
    }

    #[test]
    fn declared_templates_without_an_instance_still_get_one() {
        let raw = r#"
apiVersion: unfurl/v1
kind: Ensemble
spec:
  service_template:
    node_templates:
      web:
        type: my.Web
"#;
        let (doc, _) = ens_storage::load(raw).unwrap();
        let (graph, roots) = build_graph(&doc).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(graph.instance(roots[0]).name, "web");
    }

    #[test]
    fn graph_to_instance_records_round_trips_status() {
        let doc = sample_doc();
        let (graph, roots) = build_graph(&doc).unwrap();
        let records = graph_to_instance_records(&graph, &roots);
        assert_eq!(records["db"].ready_state.local, Status::Ok);
    }
}
