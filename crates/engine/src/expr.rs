// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A small lazy expression evaluator over the instance graph:
//! `::node::attr` shorthand and structured `get_attribute: [HOST, os]`
//! references. Resolution is deferred behind [`Results`] so templated
//! inputs can be rendered without materializing sensitive values until
//! they're actually read. [`Tainted`] marks values that must stay
//! vault-encoded on serialization, mirroring `unfurl/support.py`'s
//! `sensitive` string subclass.

use ens_core::{InstanceHandle, TopologyGraph};
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("unresolvable reference {0:?}")]
    UnknownTarget(String),
    #[error("attribute {1:?} not found on {0:?}")]
    MissingAttribute(String, String),
    #[error("malformed reference expression {0:?}")]
    Malformed(String),
}

/// A value that must never be printed or serialized in the clear. It still
/// renders through `Display` (callers who hold a `Tainted<T>` already have
/// authorization to see it) but forces vault-encoded serialization so it
/// never round-trips through the persisted document as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tainted<T>(pub T);

impl<T> Tainted<T> {
    pub fn new(value: T) -> Self {
        Tainted(value)
    }

    pub fn reveal(&self) -> &T {
        &self.0
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tainted<U> {
        Tainted(f(self.0))
    }
}

impl<T: fmt::Display> fmt::Display for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// String concatenation via `format!("{}{}", tainted, other)` still taints
// the result once the caller rewraps it — the type system does not chase
// that automatically, so adapters that build secrets must rewrap explicitly.
impl std::ops::Add<&str> for Tainted<String> {
    type Output = Tainted<String>;
    fn add(self, rhs: &str) -> Tainted<String> {
        Tainted(self.0 + rhs)
    }
}

impl<T: Serialize> Serialize for Tainted<T> {
    /// Vault-encoded wrapper form; `ens-storage::vault` recognizes the
    /// `__ENC__` key and substitutes the actual ciphertext when a vault is
    /// configured (or a redaction placeholder when it is not).
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("__ENC__", &self.0)?;
        map.end()
    }
}

/// A deferred resolution over the instance graph: `.value()` performs the
/// actual lookup, so a map of rendered inputs can be built without forcing
/// every reference to resolve eagerly.
pub struct Results<T> {
    resolver: Box<dyn Fn(&TopologyGraph) -> Result<T, ExprError> + Send + Sync>,
}

impl<T> Results<T> {
    pub fn new(resolver: impl Fn(&TopologyGraph) -> Result<T, ExprError> + Send + Sync + 'static) -> Self {
        Self { resolver: Box::new(resolver) }
    }

    pub fn value(&self, graph: &TopologyGraph) -> Result<T, ExprError> {
        (self.resolver)(graph)
    }
}

/// Resolve a `::node::attr` shorthand reference relative to `subject`
/// (`::SELF::attr` or a bare `::attr` both mean "this instance").
pub fn eval_shorthand(
    graph: &TopologyGraph,
    subject: InstanceHandle,
    reference: &str,
) -> Result<serde_json::Value, ExprError> {
    let rest = reference
        .strip_prefix("::")
        .ok_or_else(|| ExprError::Malformed(reference.to_string()))?;
    let (node, attr) = match rest.split_once("::") {
        Some((node, attr)) => (node, attr),
        None => ("SELF", rest),
    };
    let handle = if node.is_empty() || node == "SELF" {
        subject
    } else {
        graph.instance_by_name(node).ok_or_else(|| ExprError::UnknownTarget(node.to_string()))?
    };
    graph
        .instance(handle)
        .attributes
        .get(attr)
        .cloned()
        .ok_or_else(|| ExprError::MissingAttribute(node.to_string(), attr.to_string()))
}

/// Resolve a structured `get_attribute: [NODE, attr]` reference. `NODE` may
/// be `SELF` or `HOST`; `HOST` resolves to "nearest ancestor", since this
/// graph doesn't model the TOSCA HostedOn normative type — it walks up
/// `parent` links instead.
pub fn eval_get_attribute(
    graph: &TopologyGraph,
    subject: InstanceHandle,
    path: &[String],
) -> Result<serde_json::Value, ExprError> {
    let node = path.first().ok_or_else(|| ExprError::Malformed("get_attribute: []".to_string()))?;
    let attr = path.get(1).ok_or_else(|| ExprError::Malformed("get_attribute: [NODE]".to_string()))?;
    let handle = match node.as_str() {
        "SELF" => subject,
        "HOST" => nearest_ancestor(graph, subject).ok_or_else(|| ExprError::UnknownTarget("HOST".to_string()))?,
        name => graph.instance_by_name(name).ok_or_else(|| ExprError::UnknownTarget(name.to_string()))?,
    };
    graph
        .instance(handle)
        .attributes
        .get(attr)
        .cloned()
        .ok_or_else(|| ExprError::MissingAttribute(node.clone(), attr.clone()))
}

fn nearest_ancestor(graph: &TopologyGraph, subject: InstanceHandle) -> Option<InstanceHandle> {
    graph.instance(subject).parent
}

#[cfg(test)]
mod tests {
    use super::*;
    use ens_core::{Instance, Template};

    fn small_graph() -> (TopologyGraph, InstanceHandle, InstanceHandle) {
        let mut g = TopologyGraph::new();
        let t = g.add_template(Template::new("t", "my.Type"));
        let host = g.add_instance(Instance::new("host", t));
        let child = g.add_instance(Instance::new("child", t));
        g.attach_child(host, child);
        g.instance_mut(host).attributes.insert("os".to_string(), serde_json::json!("linux"));
        (g, host, child)
    }

    #[test]
    fn shorthand_resolves_named_node() {
        let (g, host, _child) = small_graph();
        let _ = host;
        let v = eval_shorthand(&g, _child, "::host::os").unwrap();
        assert_eq!(v, serde_json::json!("linux"));
    }

    #[test]
    fn shorthand_self_means_subject() {
        let (mut g, host, _) = small_graph();
        g.instance_mut(host).attributes.insert("x".to_string(), serde_json::json!(1));
        let v = eval_shorthand(&g, host, "::x").unwrap();
        assert_eq!(v, serde_json::json!(1));
    }

    #[test]
    fn get_attribute_host_walks_up_parent() {
        let (g, _host, child) = small_graph();
        let v = eval_get_attribute(&g, child, &["HOST".to_string(), "os".to_string()]).unwrap();
        assert_eq!(v, serde_json::json!("linux"));
    }

    #[test]
    fn tainted_serializes_as_enc_wrapper() {
        let t = Tainted::new("s3cr3t".to_string());
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v, serde_json::json!({"__ENC__": "s3cr3t"}));
        assert_eq!(t.to_string(), "s3cr3t");
    }
}
