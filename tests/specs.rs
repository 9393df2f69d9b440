// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box CLI scenarios: each test writes a fresh ensemble
//! document to a temp directory and drives the `ens` binary against it
//! with `assert_cmd`, then reads the document back to check what the
//! engine actually persisted.

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

use support::{shell_ensemble, two_node_ensemble, Project};

#[test]
fn deploy_runs_the_create_operation_and_persists_status() {
    let project = Project::new(shell_ensemble("db", "true"));

    let outcome = project.run(&["--workflow", "deploy", "--add"]);
    outcome.assert_success();

    let doc = project.read_doc();
    let record = &doc.status.topology.instances["db"];
    assert_eq!(record.ready_state.local, ens_core::Status::Ok);
    assert!(record.created_from.is_some(), "deploy should mark the instance created");
}

#[test]
fn undeploy_after_deploy_reverses_creation() {
    let project = Project::new(shell_ensemble("db", "true"));

    project.run(&["--workflow", "deploy", "--add"]).assert_success();
    let after_deploy = project.read_doc();
    assert!(after_deploy.status.topology.instances["db"].created_from.is_some());

    project.run(&["--workflow", "undeploy", "--all"]).assert_success();
    let after_undeploy = project.read_doc();
    let record = &after_undeploy.status.topology.instances["db"];
    assert_eq!(record.created_from, None, "undeploy should clear the created marker");
}

#[test]
fn stop_then_deploy_restarts_without_recreating() {
    let project = Project::new(shell_ensemble("db", "true"));

    project.run(&["--workflow", "deploy", "--add"]).assert_success();
    let created_on_first_deploy = project.read_doc().status.topology.instances["db"].created_from.clone();
    assert!(created_on_first_deploy.is_some());

    project.run(&["--workflow", "stop", "--all"]).assert_success();
    project.run(&["--workflow", "deploy", "--all"]).assert_success();

    let doc = project.read_doc();
    let record = &doc.status.topology.instances["db"];
    assert_eq!(record.ready_state.local, ens_core::Status::Ok);
    assert_eq!(record.created_from, created_on_first_deploy, "restart should not re-create the instance");
}

#[test]
fn missing_required_input_fails_validation_before_planning() {
    let mut doc = shell_ensemble("db", "true");
    doc = doc.replace(
        "service_template:\n    node_templates:",
        "service_template:\n    inputs:\n      region:\n        required: true\n    node_templates:",
    );
    let project = Project::new(doc);

    let outcome = project.run(&["--workflow", "deploy", "--add"]);
    outcome.assert_exit_code(1);
    assert!(outcome.stderr.contains("region"), "error should name the missing input: {}", outcome.stderr);

    let after = project.read_doc();
    assert!(
        after.status.topology.instances.is_empty(),
        "a failed validation must not run or persist any task"
    );
}

#[test]
fn discover_reports_status_without_mutating_creation_state() {
    let project = Project::new(shell_ensemble("db", "true"));

    let outcome = project.run(&["--workflow", "discover", "--readonly", "--all"]);
    outcome.assert_success();

    let doc = project.read_doc();
    assert_eq!(doc.status.topology.instances["db"].created_from, None);
}

#[test]
fn cross_ensemble_resource_scope_only_touches_the_named_instance() {
    let project = Project::new(two_node_ensemble());

    project.run(&["--workflow", "deploy", "--add", "--resource", "web"]).assert_success();

    let doc = project.read_doc();
    assert!(doc.status.topology.instances["web"].created_from.is_some());
    assert!(
        doc.status.topology.instances.get("db").map(|r| r.created_from.is_none()).unwrap_or(true),
        "scoping to --resource web must leave db untouched"
    );
}

mod support {
    use super::*;

    pub fn shell_ensemble(name: &str, command: &str) -> String {
        format!(
            r#"apiVersion: unfurl/v1
kind: Ensemble
spec:
  service_template:
    node_templates:
      {name}:
        type: my.Database
        interfaces:
          Standard:
            create:
              implementation: shell
              inputs:
                command: "{command}"
            delete:
              implementation: shell
              inputs:
                command: "{command}"
            stop:
              implementation: shell
              inputs:
                command: "{command}"
            discover:
              implementation: shell
              inputs:
                command: "{command}"
status:
  topology:
    instances: {{}}
"#
        )
    }

    pub fn two_node_ensemble() -> String {
        r#"apiVersion: unfurl/v1
kind: Ensemble
spec:
  service_template:
    node_templates:
      db:
        type: my.Database
        interfaces:
          Standard:
            create:
              implementation: shell
              inputs:
                command: "true"
      web:
        type: my.Web
        interfaces:
          Standard:
            create:
              implementation: shell
              inputs:
                command: "true"
status:
  topology:
    instances: {}
"#
        .to_string()
    }

    pub struct Project {
        _dir: TempDir,
        ensemble_path: PathBuf,
    }

    pub struct Outcome {
        pub status: i32,
        pub stdout: String,
        pub stderr: String,
    }

    impl Outcome {
        pub fn assert_success(&self) -> &Self {
            assert_eq!(self.status, 0, "expected success, stderr:\n{}\nstdout:\n{}", self.stderr, self.stdout);
            self
        }

        pub fn assert_exit_code(&self, code: i32) -> &Self {
            assert_eq!(
                self.status, code,
                "expected exit code {code}, stderr:\n{}\nstdout:\n{}",
                self.stderr, self.stdout
            );
            self
        }
    }

    impl Project {
        pub fn new(ensemble_yaml: String) -> Self {
            let dir = TempDir::new().expect("create temp dir");
            let ensemble_path = dir.path().join("ensemble.yaml");
            std::fs::write(&ensemble_path, ensemble_yaml).expect("write ensemble fixture");
            Self { _dir: dir, ensemble_path }
        }

        pub fn run(&self, args: &[&str]) -> Outcome {
            let mut cmd = Command::cargo_bin("ens").expect("locate ens binary");
            cmd.arg(self.ensemble_path.to_str().expect("utf8 path"));
            cmd.args(args);
            let output = cmd.output().expect("run ens");
            Outcome {
                status: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
        }

        pub fn read_doc(&self) -> ens_storage::Ensemble {
            let raw = std::fs::read_to_string(&self.ensemble_path).expect("read back ensemble");
            let (doc, _) = ens_storage::load(&raw).expect("parse ensemble");
            doc
        }
    }
}
