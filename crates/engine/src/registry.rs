// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configurator implementation reference resolution:
//! short-name → factory map, populated at process startup, plus the
//! node-template-is-a-configurator path.

use crate::configurator::Configurator;
use ens_core::TopologyGraph;
use std::collections::HashMap;
use std::sync::Arc;

/// An `implementation` value resolved to one of three forms: a short
/// registry name, a fully-qualified plugin path, or a node template name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Implementation {
    ShortName(String),
    FullyQualified(String),
    /// The name of a node template whose instance *is* the configurator;
    /// the runner executes operations through that instance rather than a
    /// registry-resolved plugin.
    NodeTemplate(String),
}

impl Implementation {
    /// A fully-qualified identifier is namespaced (`pkg.Configurator`); a
    /// bare name matching a template in the current topology binds to that
    /// template; anything else is a registry short name.
    pub fn resolve(raw: &str, graph: &TopologyGraph) -> Self {
        if graph.template_by_name(raw).is_some() {
            Implementation::NodeTemplate(raw.to_string())
        } else if raw.contains('.') {
            Implementation::FullyQualified(raw.to_string())
        } else {
            Implementation::ShortName(raw.to_string())
        }
    }
}

type Factory = Arc<dyn Fn() -> Arc<dyn Configurator> + Send + Sync>;

/// Short-name → factory map for configurator plugins, populated at process
/// startup by registering each adapter module under its short name
/// (`ens-adapters::registry_defaults`).
#[derive(Default, Clone)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        short_name: impl Into<String>,
        factory: impl Fn() -> Arc<dyn Configurator> + Send + Sync + 'static,
    ) {
        self.factories.insert(short_name.into(), Arc::new(factory));
    }

    /// Resolve an `Implementation` to a live configurator instance.
    /// `NodeTemplate` implementations are not served from this registry —
    /// the runner dispatches those through the node's own operations.
    pub fn resolve(&self, implementation: &Implementation) -> Option<Arc<dyn Configurator>> {
        let name = match implementation {
            Implementation::ShortName(n) => n,
            Implementation::FullyQualified(n) => n,
            Implementation::NodeTemplate(_) => return None,
        };
        self.factories.get(name).map(|f| f())
    }

    pub fn is_registered(&self, short_name: &str) -> bool {
        self.factories.contains_key(short_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configurator::{ConfiguratorResult, Step, StepResume, Task};
    use async_trait::async_trait;
    use ens_core::Priority;

    struct Noop;

    #[async_trait]
    impl Configurator for Noop {
        fn can_dry_run(&self, _task: &Task) -> bool {
            true
        }
        fn can_run(&self, _task: &Task) -> Result<(), String> {
            Ok(())
        }
        fn should_run(&self, _task: &Task) -> Priority {
            Priority::Required
        }
        async fn render(&self, _task: &Task) -> Result<serde_json::Value, crate::error::RuntimeError> {
            Ok(serde_json::Value::Null)
        }
        async fn run(
            &self,
            _task: &Task,
            _resume: Option<StepResume>,
        ) -> Result<Step, crate::error::RuntimeError> {
            Ok(Step::Done(ConfiguratorResult::default()))
        }
    }

    #[test]
    fn short_name_round_trips_through_registry() {
        let mut reg = Registry::new();
        reg.register("noop", || Arc::new(Noop));
        assert!(reg.is_registered("noop"));
        let found = reg.resolve(&Implementation::ShortName("noop".to_string()));
        assert!(found.is_some());
        assert!(reg.resolve(&Implementation::ShortName("missing".to_string())).is_none());
    }

    #[test]
    fn template_named_implementation_resolves_to_node_template() {
        use ens_core::Template;
        let mut g = TopologyGraph::new();
        g.add_template(Template::new("installer", "my.Installer"));
        let resolved = Implementation::resolve("installer", &g);
        assert_eq!(resolved, Implementation::NodeTemplate("installer".to_string()));
        assert_eq!(
            Implementation::resolve("pkg.shell.Shell", &g),
            Implementation::FullyQualified("pkg.shell.Shell".to_string())
        );
        assert_eq!(Implementation::resolve("shell", &g), Implementation::ShortName("shell".to_string()));
    }
}
