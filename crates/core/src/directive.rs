// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-template directives that alter planner behavior.

use serde::{Deserialize, Serialize};

/// A per-template modifier altering how the planner creates or binds
/// instances for this template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directive {
    /// Do not create an instance; bind to a pre-existing one found by name
    /// (possibly in an imported topology).
    Select,
    /// Used only when no other candidate satisfies a requirement.
    Default,
    /// No independent instance is created; attributes live on the parent.
    Dependent,
    /// Run `Install.check` before deciding whether to deploy.
    Discover,
    /// Exempt this instance from delete during undeploy.
    Protected,
}

crate::simple_display! {
    Directive {
        Select => "select",
        Default => "default",
        Dependent => "dependent",
        Discover => "discover",
        Protected => "protected",
    }
}

/// The directive set declared on a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives(pub Vec<Directive>);

impl Directives {
    pub fn has(&self, d: Directive) -> bool {
        self.0.contains(&d)
    }

    pub fn is_select(&self) -> bool {
        self.has(Directive::Select)
    }

    pub fn is_default(&self) -> bool {
        self.has(Directive::Default)
    }

    pub fn is_dependent(&self) -> bool {
        self.has(Directive::Dependent)
    }

    pub fn is_protected(&self) -> bool {
        self.has(Directive::Protected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_query_membership() {
        let d = Directives(vec![Directive::Select, Directive::Protected]);
        assert!(d.is_select());
        assert!(d.is_protected());
        assert!(!d.is_default());
        assert!(!d.is_dependent());
    }
}
