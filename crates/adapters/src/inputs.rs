// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small helpers shared by every configurator for pulling typed values out
//! of `Task.inputs`.

use ens_engine::RuntimeError;
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub(crate) struct MissingInput(pub &'static str);

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required input {:?}", self.0)
    }
}

impl StdError for MissingInput {}

pub(crate) fn require_str<'a>(
    inputs: &'a std::collections::HashMap<String, serde_json::Value>,
    key: &'static str,
    configurator: &str,
    interface: &str,
    operation: &str,
    target: &str,
) -> Result<&'a str, RuntimeError> {
    inputs
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RuntimeError::ConfiguratorFailed {
            configurator: configurator.to_string(),
            interface: interface.to_string(),
            operation: operation.to_string(),
            target: target.to_string(),
            source: Box::new(MissingInput(key)),
        })
}

pub(crate) fn opt_str<'a>(
    inputs: &'a std::collections::HashMap<String, serde_json::Value>,
    key: &str,
) -> Option<&'a str> {
    inputs.get(key).and_then(|v| v.as_str())
}
