// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Include/merge directive handling for the persisted document: a map key
//! beginning with `+` names a merge directive whose value is a
//! slash-separated path into the same document; `q+` escapes a literal
//! leading `+`. `+%` on a map carries the merge strategy. Unlike a
//! fixed-schema entity merge, the tree here is an arbitrary YAML value,
//! so merging works over `serde_yaml::Value` directly.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::Value;

const STRATEGY_KEY: &str = "+%";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    Merge,
    Replace,
    Delete,
    Error,
}

impl MergeStrategy {
    fn parse(raw: &str) -> Result<Self, IncludeError> {
        match raw {
            "merge" => Ok(Self::Merge),
            "replace" => Ok(Self::Replace),
            "delete" => Ok(Self::Delete),
            "error" => Ok(Self::Error),
            other => Err(IncludeError::UnknownStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IncludeError {
    #[error("include path {0:?} does not resolve to a value in this document")]
    UnresolvedPath(String),
    #[error("unknown merge strategy {0:?}")]
    UnknownStrategy(String),
    #[error("include directive {0:?} applied to a non-map value")]
    NotAMap(String),
}

/// Where an include directive was found, so `collapse` can restore it
/// before re-serializing.
#[derive(Debug, Clone)]
pub struct IncludeSite {
    /// Path (map keys, root-to-parent) of the map the directive lived in.
    pub at: Vec<String>,
    /// The directive key, e.g. `"+base"`.
    pub key: String,
    /// The path value the directive pointed at.
    pub target: String,
    pub strategy: MergeStrategy,
    /// The map exactly as written, before the directive was resolved —
    /// what `collapse` restores at `at` so re-serialization writes the
    /// include rather than the expanded form.
    pub original: Value,
}

/// Expand every include directive in `doc`, returning the merged tree plus
/// the list of sites visited (for round-trip `collapse`).
pub fn expand(doc: Value) -> Result<(Value, Vec<IncludeSite>), IncludeError> {
    let root = doc.clone();
    let mut sites = Vec::new();
    let expanded = expand_node(&root, doc, &mut Vec::new(), &mut sites)?;
    Ok((expanded, sites))
}

fn expand_node(root: &Value, node: Value, path: &mut Vec<String>, sites: &mut Vec<IncludeSite>) -> Result<Value, IncludeError> {
    let original = node.clone();
    match node {
        Value::Mapping(map) => {
            let mut directives: Vec<(String, String)> = Vec::new();
            let mut strategy = MergeStrategy::Merge;
            let mut literal = BTreeMap::new();

            for (k, v) in map {
                let Value::String(key) = &k else {
                    if let Value::String(s) = &v {
                        literal.insert(key_string(&k), Value::String(s.clone()));
                    } else {
                        literal.insert(key_string(&k), v);
                    }
                    continue;
                };
                if key == STRATEGY_KEY {
                    let Value::String(raw) = &v else {
                        return Err(IncludeError::UnknownStrategy(format!("{v:?}")));
                    };
                    strategy = MergeStrategy::parse(raw)?;
                    continue;
                }
                if let Some(rest) = key.strip_prefix("q+") {
                    literal.insert(format!("+{rest}"), v);
                    continue;
                }
                if let Some(_rest) = key.strip_prefix('+') {
                    let Value::String(target) = &v else {
                        return Err(IncludeError::UnresolvedPath(format!("{v:?}")));
                    };
                    directives.push((key.clone(), target.clone()));
                    continue;
                }
                let mut child_path = path.clone();
                child_path.push(key.clone());
                literal.insert(key.clone(), expand_node(root, v, &mut child_path, sites)?);
            }

            let mut result: Value = Value::Mapping(
                literal.into_iter().map(|(k, v)| (Value::String(k), v)).collect(),
            );

            for (directive_key, target) in directives {
                let resolved = resolve_path(root, &target).ok_or_else(|| IncludeError::UnresolvedPath(target.clone()))?;
                sites.push(IncludeSite {
                    at: path.clone(),
                    key: directive_key,
                    target: target.clone(),
                    strategy,
                    original: original.clone(),
                });
                result = apply_strategy(result, resolved, strategy)?;
            }

            Ok(result)
        }
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(i.to_string());
                out.push(expand_node(root, item, &mut child_path, sites)?);
            }
            Ok(Value::Sequence(out))
        }
        other => Ok(other),
    }
}

fn key_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    }
}

fn apply_strategy(literal: Value, included: Value, strategy: MergeStrategy) -> Result<Value, IncludeError> {
    match strategy {
        MergeStrategy::Replace => Ok(included),
        MergeStrategy::Delete => Ok(Value::Null),
        MergeStrategy::Error => {
            if matches!(literal, Value::Mapping(ref m) if m.is_empty()) {
                Ok(included)
            } else {
                Err(IncludeError::NotAMap("conflicting keys under an error-strategy include".to_string()))
            }
        }
        MergeStrategy::Merge => {
            let (Value::Mapping(mut base), Value::Mapping(overlay)) = (included, literal) else {
                return Err(IncludeError::NotAMap("merge strategy requires two maps".to_string()));
            };
            for (k, v) in overlay {
                base.insert(k, v);
            }
            Ok(Value::Mapping(base))
        }
    }
}

/// Resolve a slash-separated path (e.g. `"spec/service_template"`) against
/// `root`, indexing only through mappings.
fn resolve_path(root: &Value, path: &str) -> Option<Value> {
    let mut current = root.clone();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Mapping(m) => m.get(&Value::String(segment.to_string()))?.clone(),
            _ => return None,
        };
    }
    Some(current)
}

/// Undo `expand`: restore every recorded site to the map exactly as it
/// was written, so re-serializing writes the include directive instead
/// of the expanded content. Only correct for a tree that has not been
/// mutated since `expand` produced it (sites recorded elsewhere no
/// longer apply once the document has been edited under them).
pub fn collapse(expanded: Value, sites: &[IncludeSite]) -> Value {
    let mut by_path: BTreeMap<Vec<String>, Value> = BTreeMap::new();
    for site in sites {
        by_path.entry(site.at.clone()).or_insert_with(|| site.original.clone());
    }
    collapse_node(expanded, &mut Vec::new(), &by_path)
}

fn collapse_node(node: Value, path: &mut Vec<String>, by_path: &BTreeMap<Vec<String>, Value>) -> Value {
    if let Some(original) = by_path.get(path) {
        return original.clone();
    }
    match node {
        Value::Mapping(map) => {
            let mut out = serde_yaml::Mapping::new();
            for (k, v) in map {
                if let Value::String(key) = &k {
                    let mut child_path = path.clone();
                    child_path.push(key.clone());
                    out.insert(k, collapse_node(v, &mut child_path, by_path));
                } else {
                    out.insert(k, v);
                }
            }
            Value::Mapping(out)
        }
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(i.to_string());
                out.push(collapse_node(item, &mut child_path, by_path));
            }
            Value::Sequence(out)
        }
        other => other,
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Merge => "merge",
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn merge_strategy_overlays_literal_keys_onto_included_map() {
        let doc = yaml(
            r#"
base:
  a: 1
  b: 2
top:
  "+base": base
  b: 99
"#,
        );
        let (expanded, sites) = expand(doc).unwrap();
        let top = expanded.get("top").unwrap();
        assert_eq!(top.get("a").unwrap().as_i64(), Some(1));
        assert_eq!(top.get("b").unwrap().as_i64(), Some(99));
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].target, "base");
    }

    #[test]
    fn replace_strategy_discards_literal_siblings() {
        let doc = yaml(
            r#"
base:
  a: 1
top:
  "+%": replace
  "+base": base
  a: 99
"#,
        );
        let (expanded, _) = expand(doc).unwrap();
        let top = expanded.get("top").unwrap();
        assert_eq!(top.get("a").unwrap().as_i64(), Some(1));
    }

    #[test]
    fn q_plus_prefix_escapes_to_a_literal_plus_key() {
        let doc = yaml(
            r#"
top:
  "q+weird": "kept literally"
"#,
        );
        let (expanded, sites) = expand(doc).unwrap();
        assert!(sites.is_empty());
        assert_eq!(
            expanded.get("top").unwrap().get("+weird").unwrap().as_str(),
            Some("kept literally")
        );
    }

    #[test]
    fn collapse_restores_the_include_directive_after_expand() {
        let doc = yaml(
            r#"
base:
  a: 1
  b: 2
top:
  "+base": base
  b: 99
"#,
        );
        let (expanded, sites) = expand(doc.clone()).unwrap();
        assert_eq!(expanded.get("top").unwrap().get("a").unwrap().as_i64(), Some(1));
        let collapsed = collapse(expanded, &sites);
        assert_eq!(collapsed, doc);
    }

    #[test]
    fn unresolved_path_is_an_error() {
        let doc = yaml(
            r#"
top:
  "+missing": nope
"#,
        );
        assert!(expand(doc).is_err());
    }
}
