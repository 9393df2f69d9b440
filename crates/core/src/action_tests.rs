// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::Status;

#[test]
fn deploy_prefers_configure_then_create_then_start() {
    assert_eq!(Action::Deploy.preferred_operations(), &["configure", "create", "start"]);
}

#[test]
fn undeploy_prefers_delete_then_stop() {
    assert_eq!(Action::Undeploy.preferred_operations(), &["delete", "stop"]);
}

#[test]
fn node_state_incompatible_with_absent_when_started() {
    assert!(!NodeState::Started.compatible_with(Status::Absent));
    assert!(!NodeState::Configured.compatible_with(Status::NotApplied));
    assert!(NodeState::Stopped.compatible_with(Status::Absent));
    assert!(NodeState::Started.compatible_with(Status::Ok));
}

#[test]
fn after_success_maps_each_action() {
    assert_eq!(NodeState::after_success(Action::Deploy), NodeState::Started);
    assert_eq!(NodeState::after_success(Action::Undeploy), NodeState::Deleted);
    assert_eq!(NodeState::after_success(Action::Stop), NodeState::Stopped);
    assert_eq!(NodeState::after_success(Action::Check), NodeState::Created);
}
