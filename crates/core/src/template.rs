// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static topology descriptions: templates, requirements, capabilities, and
//! the interface operations a configurator can be asked to run.

use crate::directive::Directives;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A named slot a template exposes that another template's requirement can
/// bind to (e.g. a `host` capability of type `Container`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// An edge a template declares that must be satisfied by some other
/// template's capability before the instance is considered complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    /// Name of the target node template, when declared directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Type of node/capability this requirement can bind to, when the
    /// target is resolved by type rather than by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Additional match predicate over candidate targets (name/property
    /// equality checks); kept opaque here since the topology parser is an
    /// external collaborator — the planner only needs to know whether a
    /// candidate instance satisfies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_filter: Option<String>,
}

/// `{implementation, inputs, timeout, preConditions, postConditions}`
/// declared for one `(interface, operation)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceOperation {
    pub interface: String,
    pub operation: String,
    /// Registry short name, fully-qualified configurator id, or the name
    /// of a node template that *is* the configurator.
    pub implementation: String,
    #[serde(default)]
    pub inputs: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration_secs_opt")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub pre_conditions: Vec<String>,
    #[serde(default)]
    pub post_conditions: Vec<String>,
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<u64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs))
    }
}

/// A static description of a node (or relationship/capability) in the
/// topology: the "desired state" half of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// Linear is-a chain, most-derived first (e.g. `["my.Release",
    /// "tosca.nodes.SoftwareComponent", "tosca.nodes.Root"]`).
    pub type_chain: Vec<String>,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    /// Declared attribute schema keys (values live on the instance).
    #[serde(default)]
    pub attribute_names: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Keyed by `(interface, operation)`.
    #[serde(default)]
    pub operations: HashMap<(String, String), InterfaceOperation>,
    #[serde(default)]
    pub directives: Directives,
}

impl Template {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_chain: vec![type_name.into()],
            properties: HashMap::new(),
            attribute_names: Vec::new(),
            requirements: Vec::new(),
            capabilities: Vec::new(),
            operations: HashMap::new(),
            directives: Directives::default(),
        }
    }

    pub fn type_name(&self) -> &str {
        self.type_chain.first().map(String::as_str).unwrap_or("")
    }

    pub fn is_a(&self, type_name: &str) -> bool {
        self.type_chain.iter().any(|t| t == type_name)
    }

    /// Find the first operation matching any of `names` under `interface`,
    /// in the order given (used for the preferred-operation fallback chain
    /// in [`crate::Action::preferred_operations`]).
    pub fn find_operation(&self, interface: &str, names: &[&str]) -> Option<&InterfaceOperation> {
        names
            .iter()
            .find_map(|op| self.operations.get(&(interface.to_string(), op.to_string())))
    }

    pub fn operation(&self, interface: &str, operation: &str) -> Option<&InterfaceOperation> {
        self.operations.get(&(interface.to_string(), operation.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_a_walks_the_type_chain() {
        let mut t = Template::new("repo", "my.Helm");
        t.type_chain.push("tosca.nodes.Root".to_string());
        assert!(t.is_a("my.Helm"));
        assert!(t.is_a("tosca.nodes.Root"));
        assert!(!t.is_a("my.Other"));
    }

    #[test]
    fn find_operation_respects_fallback_order() {
        let mut t = Template::new("release", "my.Helm");
        t.operations.insert(
            ("Standard".to_string(), "create".to_string()),
            InterfaceOperation {
                interface: "Standard".to_string(),
                operation: "create".to_string(),
                implementation: "helm".to_string(),
                inputs: HashMap::new(),
                timeout: None,
                pre_conditions: Vec::new(),
                post_conditions: Vec::new(),
            },
        );
        let found = t.find_operation("Standard", &["configure", "create", "start"]);
        assert_eq!(found.unwrap().operation, "create");
        assert!(t.find_operation("Standard", &["configure"]).is_none());
    }
}
