// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topology/input validation, run before the planner is constructed.
//! Grounded on `unfurl/init.py`'s environment-input validation: required
//! inputs with no binding raise before any task runs.

use crate::error::ValidationError;
use std::collections::HashMap;

/// A declared topology input: name, whether it's required, and (if bound)
/// its evaluated value.
#[derive(Debug, Clone)]
pub struct InputDeclaration {
    pub name: String,
    pub required: bool,
}

/// Validate that every required input has a binding in `environment_inputs`
/// (`spec.service_template`'s declared inputs against `environment.inputs`).
/// Raised before any task is scheduled; no `ChangeRecord`s are written if
/// this fails.
pub fn validate_inputs(
    declarations: &[InputDeclaration],
    environment_inputs: &HashMap<String, serde_json::Value>,
) -> Result<(), ValidationError> {
    for decl in declarations {
        if decl.required && !environment_inputs.contains_key(&decl.name) {
            return Err(ValidationError::MissingInput(decl.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_input_is_rejected() {
        let decls = vec![InputDeclaration { name: "cpus".to_string(), required: true }];
        let bound = HashMap::new();
        let err = validate_inputs(&decls, &bound).unwrap_err();
        assert!(matches!(err, ValidationError::MissingInput(name) if name == "cpus"));
    }

    #[test]
    fn bound_required_input_passes() {
        let decls = vec![InputDeclaration { name: "cpus".to_string(), required: true }];
        let mut bound = HashMap::new();
        bound.insert("cpus".to_string(), serde_json::json!(2));
        assert!(validate_inputs(&decls, &bound).is_ok());
    }

    #[test]
    fn unbound_optional_input_passes() {
        let decls = vec![InputDeclaration { name: "region".to_string(), required: false }];
        let bound = HashMap::new();
        assert!(validate_inputs(&decls, &bound).is_ok());
    }
}
