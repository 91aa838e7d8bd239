//! Dotted attribute paths and their resolution against a schema tree.
//!
//! A path is a `.`-separated list of segments. Map nodes consume a segment as
//! a child name; list nodes consume it as an opaque index token (`0`, `[0]`
//! and `[n]` all select the element node).

use std::fmt;

use crate::error::{Error, Result};
use crate::schema::{NodeKind, SchemaNode};

/// Resolve `path` from `root`, or `None` when any segment does not resolve.
#[must_use]
pub fn resolve<'a>(root: &'a SchemaNode, path: &str) -> Option<&'a SchemaNode> {
    path.split('.').try_fold(root, step)
}

/// Like [`resolve`], treating a missing path as an error.
pub fn require<'a>(root: &'a SchemaNode, path: &str) -> Result<&'a SchemaNode> {
    resolve(root, path).ok_or_else(|| Error::path_not_found(path))
}

fn step<'a>(node: &'a SchemaNode, segment: &str) -> Option<&'a SchemaNode> {
    match node.kind() {
        NodeKind::List(element) => Some(element),
        NodeKind::Map(children) => children.get(segment),
        NodeKind::Scalar(_)
        | NodeKind::Set(_)
        | NodeKind::PartitionKey(_)
        | NodeKind::SortKey(_) => None,
    }
}

/// Keep only `[A-Za-z0-9_]`, the characters allowed in placeholder tokens.
#[must_use]
pub fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// A dotted path such as `address.street` or `tags.[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath(String);

impl AttributePath {
    /// Wrap a dotted path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The raw dotted path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// First segment: the top-level attribute the path starts from.
    #[must_use]
    pub fn root_attribute(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }

    /// Whether the path names a top-level attribute.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        !self.0.contains('.')
    }

    /// Path flattened into a value-placeholder token: `a.[0].b` -> `a_0_b`.
    #[must_use]
    pub fn value_token(&self) -> String {
        self.segments().map(sanitize).collect::<Vec<_>>().join("_")
    }

    /// Resolve against `root`.
    pub fn resolve<'a>(&self, root: &'a SchemaNode) -> Result<&'a SchemaNode> {
        require(root, &self.0)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttributePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for AttributePath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

#[cfg(test)]
mod tests {
    use dynaql_model::ScalarKind;

    use super::*;
    use crate::schema::{list, map, number, partition_key, schema, string};

    fn root() -> SchemaNode {
        schema()
            .field("id", partition_key(string()))
            .field("name", string())
            .field(
                "building",
                map(schema().field("street", string()).field("number", number())),
            )
            .field(
                "rooms",
                list(map(schema().field("size", number()).field("tags", list(string())))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_should_resolve_top_level_and_nested_paths() {
        let root = root();
        assert_eq!(
            resolve(&root, "name"),
            Some(&SchemaNode::scalar(ScalarKind::String))
        );
        assert_eq!(
            resolve(&root, "building.number"),
            Some(&SchemaNode::scalar(ScalarKind::Number))
        );
        assert!(resolve(&root, "building.floor").is_none());
        assert!(resolve(&root, "missing").is_none());
    }

    #[test]
    fn test_should_treat_list_segments_as_opaque_indexes() {
        let root = root();
        let a = resolve(&root, "rooms.0.size");
        assert!(a.is_some());
        assert_eq!(a, resolve(&root, "rooms.7.size"));
        assert_eq!(a, resolve(&root, "rooms.[3].size"));
        assert_eq!(a, resolve(&root, "rooms.[n].size"));
        assert_eq!(
            resolve(&root, "rooms.[0].tags.[1]"),
            Some(&SchemaNode::scalar(ScalarKind::String))
        );
    }

    #[test]
    fn test_should_resolve_associatively() {
        let root = root();
        for path in ["building.street", "rooms.0.size", "rooms.1.tags.2"] {
            let (head, tail) = path.split_once('.').unwrap();
            let stepwise = resolve(&root, head).and_then(|n| resolve(n, tail));
            assert_eq!(resolve(&root, path), stepwise);
        }
    }

    #[test]
    fn test_should_stop_at_leaves_and_keys() {
        let root = root();
        assert!(resolve(&root, "name.first").is_none());
        assert!(resolve(&root, "id.inner").is_none());
        assert!(resolve(&root, "id").unwrap().is_key());
    }

    #[test]
    fn test_should_fail_require_for_unknown_path() {
        let root = root();
        let err = require(&root, "building.floor").unwrap_err();
        assert!(matches!(err, Error::PathNotFound { path } if path == "building.floor"));
    }

    #[test]
    fn test_should_flatten_value_token() {
        let path = AttributePath::new("attribute.[0].nested.[1].[2]");
        assert_eq!(path.value_token(), "attribute_0_nested_1_2");
        assert!(!path.is_top_level());
        assert_eq!(path.root_attribute(), "attribute");
        assert!(AttributePath::from("name").is_top_level());
        assert_eq!(sanitize("first-name!"), "firstname");
    }
}
