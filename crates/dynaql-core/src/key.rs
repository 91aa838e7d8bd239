//! Primary key compiler.

use dynaql_model::{Item, Value};
use tracing::debug;

use crate::codec;
use crate::error::{Error, Result};
use crate::schema::SchemaNode;

/// Names of an entity's key attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttributes<'a> {
    /// Partition key attribute.
    pub partition: &'a str,
    /// Sort key attribute, if declared.
    pub sort: Option<&'a str>,
}

impl<'a> KeyAttributes<'a> {
    /// Key attributes declared by `entity`.
    pub fn of(entity: &'a SchemaNode) -> Result<Self> {
        let (partition, _) = entity.partition_key().ok_or_else(|| Error::InvalidKey {
            message: "entity declares no partition key".to_owned(),
        })?;
        Ok(Self {
            partition,
            sort: entity.sort_key().map(|(name, _)| name),
        })
    }

    /// Whether `name` is one of the key attributes.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.partition == name || self.sort == Some(name)
    }

    /// Key attributes in partition, sort order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> {
        std::iter::once(self.partition).chain(self.sort)
    }
}

/// Encode the primary key of one item of `entity` from `key`, a map holding
/// exactly the key attributes.
pub fn compile_key(entity: &SchemaNode, key: &Value) -> Result<Item> {
    let Value::Map(entries) = key else {
        return Err(Error::InvalidKey {
            message: format!("expected a map, found {}", key.kind_name()),
        });
    };
    let attributes = KeyAttributes::of(entity)?;

    if let Some(extra) = entries.keys().find(|k| !attributes.contains(k)) {
        return Err(Error::InvalidKey {
            message: format!("'{extra}' is not a key attribute"),
        });
    }

    let mut item = Item::with_capacity(2);
    for name in attributes.names() {
        let value = entries.get(name).ok_or_else(|| Error::MissingPrimaryKey {
            name: name.to_owned(),
        })?;
        let node = entity
            .child(name)
            .ok_or_else(|| Error::path_not_found(name))?;
        item.insert(name.to_owned(), codec::encode(node, value)?);
    }

    debug!(attributes = item.len(), "compiled key");
    Ok(item)
}
