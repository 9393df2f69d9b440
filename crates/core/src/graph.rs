// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The topology graph: `Vec`-backed arenas for templates and instances,
//! indexed by integer handles.

use crate::instance::{Instance, InstanceHandle, TemplateHandle};
use crate::template::Template;
use std::collections::HashMap;

/// Owns every template and instance for one topology/ensemble. Handles are
/// stable for the lifetime of the graph; nothing is ever removed from the
/// arenas (a deleted instance stays, with `local_status = absent`).
#[derive(Debug, Default, Clone)]
pub struct TopologyGraph {
    templates: Vec<Template>,
    instances: Vec<Instance>,
    instance_by_name: HashMap<String, InstanceHandle>,
    template_by_name: HashMap<String, TemplateHandle>,
    pub root: Option<InstanceHandle>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_template(&mut self, template: Template) -> TemplateHandle {
        let handle = TemplateHandle(self.templates.len() as u32);
        self.template_by_name.insert(template.name.clone(), handle);
        self.templates.push(template);
        handle
    }

    pub fn template(&self, handle: TemplateHandle) -> &Template {
        &self.templates[handle.0 as usize]
    }

    pub fn template_by_name(&self, name: &str) -> Option<TemplateHandle> {
        self.template_by_name.get(name).copied()
    }

    pub fn templates(&self) -> impl Iterator<Item = (TemplateHandle, &Template)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, t)| (TemplateHandle(i as u32), t))
    }

    /// Invariant 1: instance names are unique within a
    /// topology. Returns the existing handle if `instance.name` is already
    /// registered rather than silently shadowing it.
    pub fn add_instance(&mut self, instance: Instance) -> InstanceHandle {
        if let Some(existing) = self.instance_by_name.get(&instance.name) {
            return *existing;
        }
        let handle = InstanceHandle(self.instances.len() as u32);
        self.instance_by_name.insert(instance.name.clone(), handle);
        self.instances.push(instance);
        handle
    }

    pub fn instance(&self, handle: InstanceHandle) -> &Instance {
        &self.instances[handle.0 as usize]
    }

    pub fn instance_mut(&mut self, handle: InstanceHandle) -> &mut Instance {
        &mut self.instances[handle.0 as usize]
    }

    pub fn instance_by_name(&self, name: &str) -> Option<InstanceHandle> {
        self.instance_by_name.get(name).copied()
    }

    pub fn instances(&self) -> impl Iterator<Item = (InstanceHandle, &Instance)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(i, inst)| (InstanceHandle(i as u32), inst))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Link `child` under `parent`, recording both directions.
    pub fn attach_child(&mut self, parent: InstanceHandle, child: InstanceHandle) {
        self.instance_mut(child).parent = Some(parent);
        let kids = &mut self.instance_mut(parent).children;
        if !kids.contains(&child) {
            kids.push(child);
        }
    }

    /// Depth-first preorder over the instance tree from `root`, visiting
    /// children in declaration order. Used by the planner to produce a
    /// topologically-ordered traversal over requirement edges.
    pub fn dfs_preorder(&self, root: InstanceHandle) -> Vec<InstanceHandle> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        let mut visited = vec![false; self.instances.len()];
        while let Some(h) = stack.pop() {
            if visited[h.0 as usize] {
                continue;
            }
            visited[h.0 as usize] = true;
            out.push(h);
            let children = &self.instance(h).children;
            for child in children.iter().rev() {
                if !visited[child.0 as usize] {
                    stack.push(*child);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;

    #[test]
    fn instance_names_are_deduplicated_per_invariant_1() {
        let mut g = TopologyGraph::new();
        let t = g.add_template(Template::new("t", "my.Type"));
        let a1 = g.add_instance(Instance::new("a", t));
        let a2 = g.add_instance(Instance::new("a", t));
        assert_eq!(a1, a2);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn dfs_preorder_visits_children_in_declaration_order() {
        let mut g = TopologyGraph::new();
        let t = g.add_template(Template::new("t", "my.Type"));
        let root = g.add_instance(Instance::new("root", t));
        let a = g.add_instance(Instance::new("a", t));
        let b = g.add_instance(Instance::new("b", t));
        g.attach_child(root, a);
        g.attach_child(root, b);
        assert_eq!(g.dfs_preorder(root), vec![root, a, b]);
    }
}
