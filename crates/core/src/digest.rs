// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable digests over evaluated input maps, used for change detection.
//! Nested structures are never compared by raw equality; only their
//! digest is — the planner treats two input maps that hash the same as
//! unchanged, independent of key order.

use serde::Serialize;
use sha2::{Digest as _, Sha256};
use std::collections::BTreeMap;

/// Default keys excluded from the inputs digest — `cwd`, `dryrun`, and
/// `resultTemplate` never drive change detection. A configurator can
/// extend this list with its own exclusions.
pub const DEFAULT_EXCLUDE: &[&str] = &["cwd", "dryrun", "resultTemplate"];

/// Compute a stable digest over `inputs`, skipping any key present in
/// `exclude`. Keys are sorted (via `BTreeMap`) before hashing so digest
/// equality is independent of the map's iteration order.
pub fn inputs_digest(
    inputs: &serde_json::Map<String, serde_json::Value>,
    exclude: &[&str],
) -> String {
    let filtered: BTreeMap<&str, &serde_json::Value> = inputs
        .iter()
        .filter(|(k, _)| !exclude.contains(&k.as_str()))
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    digest_value(&filtered)
}

/// Digest an arbitrary serializable value via its canonical JSON form.
/// `serde_json::to_vec` on a `BTreeMap`-backed structure is stable because
/// `BTreeMap`'s `Serialize` impl always emits keys in sorted order.
pub fn digest_value<T: Serialize>(value: &T) -> String {
    let canonical = serde_json::to_vec(value).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, serde_json::Value)]) -> serde_json::Map<String, serde_json::Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn digest_is_independent_of_key_order() {
        let a = map(&[("x", json!(1)), ("y", json!(2))]);
        let b = map(&[("y", json!(2)), ("x", json!(1))]);
        assert_eq!(inputs_digest(&a, &[]), inputs_digest(&b, &[]));
    }

    #[test]
    fn excluded_keys_do_not_affect_digest() {
        let a = map(&[("x", json!(1)), ("cwd", json!("/tmp/a"))]);
        let b = map(&[("x", json!(1)), ("cwd", json!("/tmp/b"))]);
        assert_eq!(inputs_digest(&a, DEFAULT_EXCLUDE), inputs_digest(&b, DEFAULT_EXCLUDE));
    }

    #[test]
    fn changed_value_changes_digest() {
        let a = map(&[("x", json!(1))]);
        let b = map(&[("x", json!(2))]);
        assert_ne!(inputs_digest(&a, &[]), inputs_digest(&b, &[]));
    }
}
