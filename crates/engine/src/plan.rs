// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The planner: diffs desired topology against last-known state to
//! produce an ordered stream of `TaskRequest`s.

use ens_core::{
    Action, ChangeRecord, Directive, Instance, InstanceHandle, Priority, Status, TaskRequest,
    Template, TopologyGraph,
};

use crate::error::PlanError;
use crate::job_options::JobOptions;

/// Looks up the last successful `ChangeRecord` for a `(target, action)`
/// pair, so the planner can compare digests without owning the change log
/// itself (`ens-storage::changelog` implements this).
pub trait ChangeLookup {
    fn last_change(&self, target: &str, action: Action) -> Option<&ChangeRecord>;
}

/// A changelog with nothing recorded yet — every candidate looks novel.
/// Used by callers (and tests) that plan against a brand-new ensemble.
#[derive(Debug, Default)]
pub struct EmptyChangeLookup;

impl ChangeLookup for EmptyChangeLookup {
    fn last_change(&self, _target: &str, _action: Action) -> Option<&ChangeRecord> {
        None
    }
}

/// The four change-detection booleans: the only inputs to
/// planning decisions. The planner never consults raw equality of nested
/// YAML structures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeDetection {
    pub spec_changed: bool,
    pub major_version_bump: bool,
    pub inputs_changed: bool,
    pub dependencies_changed: bool,
    pub status_drift: bool,
}

impl ChangeDetection {
    /// Compute change detection for `target` against `action`'s preferred
    /// operation, by comparing the current inputs/dependencies digests to
    /// the digests recorded on the last `ChangeRecord` for this `(target,
    /// action)` pair.
    pub fn detect(
        template: &Template,
        instance: &Instance,
        action: Action,
        evaluated_inputs: &serde_json::Map<String, serde_json::Value>,
        exclude: &[&str],
        current_dependencies_digest: &str,
        lookup: &dyn ChangeLookup,
    ) -> Self {
        let current_digest = ens_core::inputs_digest(evaluated_inputs, exclude);
        match lookup.last_change(&instance.name, action) {
            None => ChangeDetection {
                spec_changed: true,
                major_version_bump: false,
                inputs_changed: true,
                dependencies_changed: false,
                status_drift: instance.effective_status() != Status::Ok,
            },
            Some(last) => {
                let inputs_changed = last.inputs_digest != current_digest;
                let dependencies_changed =
                    last.dependencies_digest.as_deref() != Some(current_dependencies_digest);
                let spec_changed = inputs_changed
                    || last.action != action
                    || last.result.status != Status::Ok;
                ChangeDetection {
                    spec_changed,
                    major_version_bump: false,
                    inputs_changed,
                    dependencies_changed,
                    status_drift: instance.effective_status() != expected_status_for(action),
                }
            }
        }
        .with_template(template)
    }

    fn with_template(self, _template: &Template) -> Self {
        self
    }
}

/// Live digest of `template`'s requirement targets, recomputed on every
/// plan/apply pass: each by-name-resolved requirement's current
/// `effective_status`, keyed by requirement name. Requirements bound by
/// type or `node_filter` rather than by name don't resolve to a concrete
/// instance here and are left out, matching the topology loader's own
/// name-resolution-only scope. The runner records this same digest on the
/// `ChangeRecord` it writes, so the next plan pass can detect drift in a
/// dependency's status since the last time this target ran.
pub fn dependencies_digest(graph: &TopologyGraph, template: &Template) -> String {
    let live: std::collections::BTreeMap<&str, serde_json::Value> = template
        .requirements
        .iter()
        .filter_map(|r| {
            let node = r.node.as_deref()?;
            let target = graph.instance_by_name(node)?;
            let status = graph.instance(target).effective_status();
            Some((r.name.as_str(), serde_json::to_value(status).unwrap_or(serde_json::Value::Null)))
        })
        .collect();
    ens_core::digest_value(&live)
}

fn expected_status_for(action: Action) -> Status {
    match action {
        Action::Undeploy => Status::Absent,
        Action::Stop => Status::Pending,
        _ => Status::Ok,
    }
}

/// The decision the planner reached for one candidate `(template,
/// existing instance)` pair, or `None` for
/// "emit nothing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub interface: String,
    pub operation: String,
    pub reason: String,
    pub required: bool,
}

/// Evaluate the decision table for one candidate. `template_exists`
/// distinguishes "no template" (an instance whose template was removed
/// from the topology, a candidate for `--revert-obsolete`) from a normal
/// candidate.
#[allow(clippy::too_many_arguments)]
pub fn decide(
    template_exists: bool,
    instance_exists: bool,
    template: Option<&Template>,
    opts: &JobOptions,
    changes: ChangeDetection,
    local_status: Status,
) -> Option<Decision> {
    let workflow = opts.workflow;
    let preferred = template.map(|t| t.type_chain.first().cloned().unwrap_or_default());
    let _ = preferred;

    if !instance_exists && template_exists && opts.add {
        let interface = template
            .and_then(|t| t.find_operation("Standard", &["create", "configure", "start"]))
            .map(|op| op.interface.clone())
            .unwrap_or_else(|| "Standard".to_string());
        return Some(Decision { interface, operation: "create".to_string(), reason: "add".to_string(), required: true });
    }
    if !template_exists && instance_exists && opts.revert_obsolete {
        return Some(Decision {
            interface: "Standard".to_string(),
            operation: "delete".to_string(),
            reason: "revertObsolete".to_string(),
            required: true,
        });
    }
    if !template_exists || !instance_exists {
        return None;
    }

    if opts.all {
        let (interface, operation) = first_operation(template, workflow);
        return Some(Decision { interface, operation, reason: "all".to_string(), required: false });
    }
    if changes.spec_changed && changes.major_version_bump && opts.upgrade {
        let (interface, operation) = first_operation(template, workflow);
        return Some(Decision { interface, operation, reason: "upgrade".to_string(), required: false });
    }
    if changes.spec_changed && !changes.major_version_bump && opts.update {
        let (interface, operation) = first_operation(template, workflow);
        return Some(Decision { interface, operation, reason: "update".to_string(), required: false });
    }
    if changes.inputs_changed && opts.update {
        return Some(Decision {
            interface: "Standard".to_string(),
            operation: "configure".to_string(),
            reason: "inputsChanged".to_string(),
            required: false,
        });
    }
    if changes.dependencies_changed {
        return Some(Decision {
            interface: "Standard".to_string(),
            operation: "configure".to_string(),
            reason: "dependenciesChanged".to_string(),
            required: false,
        });
    }
    if local_status == Status::Error && opts.repair.repairs(Status::Error) {
        let (interface, operation) = first_operation(template, workflow);
        return Some(Decision { interface, operation, reason: "repair".to_string(), required: false });
    }
    if local_status == Status::Degraded && opts.repair.repairs(Status::Degraded) {
        let (interface, operation) = first_operation(template, workflow);
        return Some(Decision { interface, operation, reason: "repair".to_string(), required: false });
    }
    None
}

fn first_operation(template: Option<&Template>, action: Action) -> (String, String) {
    let names = action.preferred_operations();
    if let Some(t) = template {
        if let Some(op) = t.find_operation("Standard", names) {
            return (op.interface.clone(), op.operation.clone());
        }
    }
    (
        "Standard".to_string(),
        names.first().copied().unwrap_or("run").to_string(),
    )
}

/// Filters applied after selection: `required_only` drops
/// non-required decisions; `readonly` keeps only non-mutating operations;
/// `resources` scopes to named targets.
fn passes_filters(decision: &Decision, target_name: &str, opts: &JobOptions) -> bool {
    if opts.required_only && !decision.required {
        return false;
    }
    if opts.readonly && !matches!(decision.operation.as_str(), "check" | "discover") {
        return false;
    }
    if !opts.in_scope(target_name) {
        return false;
    }
    true
}

/// Produce the ordered `TaskRequest` stream for the whole instance tree
/// rooted at `root`. Traversal order is a depth-first
/// preorder over the instance tree (dependencies first for deploy; this
/// function reverses it for `undeploy`). Cycles cannot occur here since
/// `TopologyGraph::dfs_preorder` is visited-guarded.
pub fn plan(
    graph: &TopologyGraph,
    root: InstanceHandle,
    opts: &JobOptions,
    lookup: &dyn ChangeLookup,
) -> Result<Vec<TaskRequest>, PlanError> {
    let mut order = graph.dfs_preorder(root);
    if opts.workflow == Action::Undeploy {
        order.reverse();
    }

    let mut requests = Vec::new();
    for handle in order {
        let instance = graph.instance(handle);
        if instance.template.0 as usize >= graph.templates().count() {
            return Err(PlanError::MissingTemplate(instance.name.clone()));
        }
        let template = graph.template(instance.template);

        if template.directives.is_dependent() {
            // attributes live on the parent, no independent task.
            continue;
        }

        if template.directives.is_select() {
            // Bind only — but still read outputs off the bound instance
            // with a single check task, so they flow into this topology.
            requests.push(
                TaskRequest::new(handle, "Standard", "check", "select").required(false),
            );
            continue;
        }

        let evaluated_inputs = evaluated_inputs_for(template);
        let current_dependencies_digest = dependencies_digest(graph, template);
        let changes = ChangeDetection::detect(
            template,
            instance,
            opts.workflow,
            &evaluated_inputs,
            ens_core::DEFAULT_EXCLUDE,
            &current_dependencies_digest,
            lookup,
        );

        if template.directives.has(Directive::Discover)
            && instance.effective_status() == Status::Unknown
        {
            requests.push(
                TaskRequest::new(handle, "Standard", "check", "discoverBeforeDeploy")
                    .required(false)
                    .persist(false),
            );
        }

        // An instance that was never recorded with a concrete status (no
        // prior job touched it, no persisted readyState) doesn't exist yet
        // from the planner's point of view — only `--add` may schedule it.
        let instance_exists = instance.effective_status() != Status::Unknown;
        let decision = decide(
            true,
            instance_exists,
            Some(template),
            opts,
            changes,
            instance.effective_status(),
        );
        let Some(decision) = decision else { continue };
        if !passes_filters(&decision, &instance.name, opts) {
            continue;
        }
        requests.push(
            TaskRequest::new(handle, decision.interface, decision.operation, decision.reason)
                .required(decision.required || instance.priority == Priority::Required),
        );
    }

    // TODO(ens-engine::plan): orphan detection (instances added only as a
    // dependency that later lose all dependents) is left unenforced.
    Ok(requests)
}

fn evaluated_inputs_for(template: &Template) -> serde_json::Map<String, serde_json::Value> {
    template.properties.clone().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ens_core::{Action, Instance, Status, Template};
    use yare::parameterized;

    #[parameterized(
        add = { false, true, true, false, false, false, Status::Unknown, Some("create") },
        revert_obsolete = { true, false, false, false, false, true, Status::Ok, Some("delete") },
        all_wins = { true, true, true, false, false, false, Status::Ok, Some("configure") },
        repair_error = { true, true, false, false, false, false, Status::Error, Some("configure") },
        no_decision = { true, true, false, false, false, false, Status::Ok, None },
    )]
    fn decision_table_cases(
        instance_exists: bool,
        template_exists: bool,
        add: bool,
        all: bool,
        upgrade: bool,
        revert_obsolete: bool,
        local_status: Status,
        expected_op: Option<&str>,
    ) {
        let mut opts = JobOptions::new(Action::Deploy, 0);
        opts.add = add;
        opts.all = all;
        opts.upgrade = upgrade;
        opts.revert_obsolete = revert_obsolete;
        if matches!(local_status, Status::Error | Status::Degraded) {
            opts.repair = crate::job_options::RepairPolicy::Degraded;
        }

        let template = Template::new("release", "my.Helm");
        let changes = ChangeDetection::default();
        let decision = decide(
            template_exists,
            instance_exists,
            if template_exists { Some(&template) } else { None },
            &opts,
            changes,
            local_status,
        );
        assert_eq!(decision.map(|d| d.operation), expected_op.map(str::to_string));
    }

    #[test]
    fn plan_emits_a_check_task_for_select_templates() {
        let mut g = TopologyGraph::new();
        let mut sel = Template::new("external", "my.External");
        sel.directives = ens_core::Directives(vec![Directive::Select]);
        let t = g.add_template(sel);
        let root = g.add_instance(Instance::new("external", t));
        g.root = Some(root);

        let opts = JobOptions::new(Action::Deploy, 0).add(true);
        let reqs = plan(&g, root, &opts, &EmptyChangeLookup).unwrap();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].operation, "check");
        assert!(!reqs[0].required);
    }

    #[test]
    fn plan_skips_dependent_templates() {
        let mut g = TopologyGraph::new();
        let mut dep = Template::new("volume", "my.Volume");
        dep.directives = ens_core::Directives(vec![Directive::Dependent]);
        let t = g.add_template(dep);
        let root = g.add_instance(Instance::new("volume", t));
        g.root = Some(root);

        let opts = JobOptions::new(Action::Deploy, 0).add(true);
        let reqs = plan(&g, root, &opts, &EmptyChangeLookup).unwrap();
        assert!(reqs.is_empty());
    }

    #[test]
    fn plan_reverses_order_for_undeploy() {
        let mut g = TopologyGraph::new();
        let t = g.add_template(Template::new("t", "my.Type"));
        let root = g.add_instance(Instance::new("root", t));
        let child = g.add_instance(Instance::new("child", t));
        g.attach_child(root, child);
        g.instance_mut(root).local_status = Status::Ok;
        g.instance_mut(child).local_status = Status::Ok;

        let opts = JobOptions::new(Action::Undeploy, 0).all(true);
        let reqs = plan(&g, root, &opts, &EmptyChangeLookup).unwrap();
        let targets: Vec<_> = reqs.iter().map(|r| r.target).collect();
        assert_eq!(targets, vec![child, root]);
    }
}
