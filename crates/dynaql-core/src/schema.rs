//! Schema tree.
//!
//! Schemas are declared with the attribute constructors ([`string`],
//! [`number`], [`map`], [`partition_key`], ...) and a [`SchemaBuilder`], then
//! built into an immutable tree of [`SchemaNode`]s. A [`TableSchema`] groups
//! the entity schemas stored in one physical table.

use std::fmt;
use std::sync::Arc;

use dynaql_model::{ScalarKind, SetKind};
use indexmap::IndexMap;

use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// An attribute declaration, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    kind: AttributeKind,
    nullable: bool,
    optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum AttributeKind {
    Scalar(ScalarKind),
    Set(SetKind),
    Map(Vec<(String, Attribute)>),
    List(Box<Attribute>),
    PartitionKey(Box<Attribute>),
    SortKey(Box<Attribute>),
}

impl Attribute {
    fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            nullable: false,
            optional: false,
        }
    }

    /// Allow an explicit null.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Allow the attribute to be absent from its parent map.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Validate the declaration and build its node.
    pub fn build(self) -> Result<SchemaNode, SchemaError> {
        build(self)
    }
}

/// String attribute.
#[must_use]
pub fn string() -> Attribute {
    Attribute::new(AttributeKind::Scalar(ScalarKind::String))
}

/// Number attribute.
#[must_use]
pub fn number() -> Attribute {
    Attribute::new(AttributeKind::Scalar(ScalarKind::Number))
}

/// Boolean attribute.
#[must_use]
pub fn boolean() -> Attribute {
    Attribute::new(AttributeKind::Scalar(ScalarKind::Boolean))
}

/// Date attribute, stored as an ISO-8601 string.
#[must_use]
pub fn date() -> Attribute {
    Attribute::new(AttributeKind::Scalar(ScalarKind::Date))
}

/// Binary attribute.
#[must_use]
pub fn binary() -> Attribute {
    Attribute::new(AttributeKind::Scalar(ScalarKind::Binary))
}

/// String set attribute.
#[must_use]
pub fn string_set() -> Attribute {
    Attribute::new(AttributeKind::Set(SetKind::String))
}

/// Number set attribute.
#[must_use]
pub fn number_set() -> Attribute {
    Attribute::new(AttributeKind::Set(SetKind::Number))
}

/// Binary set attribute.
#[must_use]
pub fn binary_set() -> Attribute {
    Attribute::new(AttributeKind::Set(SetKind::Binary))
}

/// List whose elements all follow `element`.
#[must_use]
pub fn list(element: Attribute) -> Attribute {
    Attribute::new(AttributeKind::List(Box::new(element)))
}

/// Nested map with the fields declared by `fields`.
#[must_use]
pub fn map(fields: SchemaBuilder) -> Attribute {
    Attribute::new(AttributeKind::Map(fields.fields))
}

/// Mark an attribute as the table's partition key.
#[must_use]
pub fn partition_key(inner: Attribute) -> Attribute {
    Attribute::new(AttributeKind::PartitionKey(Box::new(inner)))
}

/// Mark an attribute as the table's sort key.
#[must_use]
pub fn sort_key(inner: Attribute) -> Attribute {
    Attribute::new(AttributeKind::SortKey(Box::new(inner)))
}

/// Start declaring the fields of a map.
#[must_use]
pub fn schema() -> SchemaBuilder {
    SchemaBuilder::default()
}

/// Ordered field declarations of one map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaBuilder {
    fields: Vec<(String, Attribute)>,
}

impl SchemaBuilder {
    /// Declare a field. Declaration order is kept.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.fields.push((name.into(), attribute));
        self
    }

    /// Build the root map node.
    pub fn build(self) -> Result<SchemaNode, SchemaError> {
        build(map(self))
    }
}

/// Build a node tree from a declaration, rejecting duplicate sibling names.
pub fn build(declaration: Attribute) -> Result<SchemaNode, SchemaError> {
    let kind = match declaration.kind {
        AttributeKind::Scalar(kind) => NodeKind::Scalar(kind),
        AttributeKind::Set(kind) => NodeKind::Set(kind),
        AttributeKind::Map(fields) => {
            let mut children = IndexMap::with_capacity(fields.len());
            for (name, attribute) in fields {
                if children.contains_key(&name) {
                    return Err(SchemaError::DuplicateFieldName { name });
                }
                let node = build(attribute)?;
                children.insert(name, node);
            }
            NodeKind::Map(children)
        }
        AttributeKind::List(element) => NodeKind::List(Box::new(build(*element)?)),
        AttributeKind::PartitionKey(inner) => NodeKind::PartitionKey(Box::new(build(*inner)?)),
        AttributeKind::SortKey(inner) => NodeKind::SortKey(Box::new(build(*inner)?)),
    };

    Ok(SchemaNode {
        kind,
        nullable: declaration.nullable,
        optional: declaration.optional,
    })
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Scalar leaf.
    Scalar(ScalarKind),
    /// Set leaf.
    Set(SetKind),
    /// Record with unique, ordered children.
    Map(IndexMap<String, SchemaNode>),
    /// Homogeneous list.
    List(Box<SchemaNode>),
    /// Partition key wrapper.
    PartitionKey(Box<SchemaNode>),
    /// Sort key wrapper.
    SortKey(Box<SchemaNode>),
}

/// One immutable node of a built schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    kind: NodeKind,
    nullable: bool,
    optional: bool,
}

impl SchemaNode {
    /// A bare, required scalar node.
    #[must_use]
    pub fn scalar(kind: ScalarKind) -> Self {
        Self {
            kind: NodeKind::Scalar(kind),
            nullable: false,
            optional: false,
        }
    }

    /// The node's shape.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Whether an explicit null is accepted.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the node may be absent from its parent map.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether this is a partition or sort key wrapper.
    #[must_use]
    pub fn is_key(&self) -> bool {
        matches!(self.kind, NodeKind::PartitionKey(_) | NodeKind::SortKey(_))
    }

    /// The wrapped node for key wrappers, `self` otherwise.
    #[must_use]
    pub fn unwrap_key(&self) -> &SchemaNode {
        match &self.kind {
            NodeKind::PartitionKey(inner) | NodeKind::SortKey(inner) => inner,
            _ => self,
        }
    }

    /// Children of a map node.
    #[must_use]
    pub fn children(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match &self.kind {
            NodeKind::Map(children) => Some(children),
            _ => None,
        }
    }

    /// Child of a map node by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children().and_then(|c| c.get(name))
    }

    /// Element node of a list.
    #[must_use]
    pub fn element(&self) -> Option<&SchemaNode> {
        match &self.kind {
            NodeKind::List(element) => Some(element),
            _ => None,
        }
    }

    /// The child declared as partition key, with its name.
    #[must_use]
    pub fn partition_key(&self) -> Option<(&str, &SchemaNode)> {
        self.children()?
            .iter()
            .find(|(_, n)| matches!(n.kind, NodeKind::PartitionKey(_)))
            .map(|(k, n)| (k.as_str(), n))
    }

    /// The child declared as sort key, with its name.
    #[must_use]
    pub fn sort_key(&self) -> Option<(&str, &SchemaNode)> {
        self.children()?
            .iter()
            .find(|(_, n)| matches!(n.kind, NodeKind::SortKey(_)))
            .map(|(k, n)| (k.as_str(), n))
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Scalar(kind) => write!(f, "{kind}"),
            NodeKind::Set(kind) => write!(f, "{kind}"),
            NodeKind::Map(_) => f.write_str("map"),
            NodeKind::List(_) => f.write_str("list"),
            NodeKind::PartitionKey(inner) => write!(f, "partition key ({inner})"),
            NodeKind::SortKey(inner) => write!(f, "sort key ({inner})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Entity and index schemas of one physical table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    entities: IndexMap<String, Arc<SchemaNode>>,
    indexes: IndexMap<String, Arc<TableSchema>>,
    combined: Arc<SchemaNode>,
}

impl TableSchema {
    /// Start declaring a table.
    #[must_use]
    pub fn builder() -> TableSchemaBuilder {
        TableSchemaBuilder::default()
    }

    /// Root map node of one entity.
    pub fn entity(&self, name: &str) -> Result<&Arc<SchemaNode>, SchemaError> {
        self.entities
            .get(name)
            .ok_or_else(|| SchemaError::UnknownEntity {
                name: name.to_owned(),
            })
    }

    /// Entities in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = (&str, &Arc<SchemaNode>)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Schema of one secondary index.
    pub fn index(&self, name: &str) -> Result<&TableSchema, SchemaError> {
        self.indexes
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| SchemaError::UnknownIndex {
                name: name.to_owned(),
            })
    }

    /// A single map holding the fields of every entity, for table-wide
    /// operations such as query and scan.
    #[must_use]
    pub fn combined(&self) -> &Arc<SchemaNode> {
        &self.combined
    }
}

/// Declarations of a table's entities and indexes.
#[derive(Debug, Clone, Default)]
pub struct TableSchemaBuilder {
    entities: Vec<(String, SchemaBuilder)>,
    indexes: Vec<(String, TableSchemaBuilder)>,
}

impl TableSchemaBuilder {
    /// Declare an entity stored in the table.
    #[must_use]
    pub fn entity(mut self, name: impl Into<String>, fields: SchemaBuilder) -> Self {
        self.entities.push((name.into(), fields));
        self
    }

    /// Declare a secondary index with its own entity projections.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>, index: TableSchemaBuilder) -> Self {
        self.indexes.push((name.into(), index));
        self
    }

    /// Build every entity and index, then the combined field map.
    pub fn build(self) -> Result<TableSchema, SchemaError> {
        let mut entities = IndexMap::with_capacity(self.entities.len());
        for (name, fields) in self.entities {
            if entities.contains_key(&name) {
                return Err(SchemaError::DuplicateFieldName { name });
            }
            let node = fields.build()?;
            entities.insert(name, Arc::new(node));
        }

        let mut indexes = IndexMap::with_capacity(self.indexes.len());
        for (name, index) in self.indexes {
            if indexes.contains_key(&name) {
                return Err(SchemaError::DuplicateFieldName { name });
            }
            let table = index.build()?;
            indexes.insert(name, Arc::new(table));
        }

        let combined = Arc::new(combine(entities.values())?);
        Ok(TableSchema {
            entities,
            indexes,
            combined,
        })
    }
}

/// Merge entity fields into one map. Entities may share a field only when
/// they declare it identically (typically the key attributes).
fn combine<'a>(
    entities: impl Iterator<Item = &'a Arc<SchemaNode>>,
) -> Result<SchemaNode, SchemaError> {
    let mut fields: IndexMap<String, SchemaNode> = IndexMap::new();
    for entity in entities {
        let Some(children) = entity.children() else {
            continue;
        };
        for (name, node) in children {
            match fields.get(name) {
                Some(existing) if existing == node => {}
                Some(_) => {
                    return Err(SchemaError::DuplicateFieldName { name: name.clone() });
                }
                None => {
                    fields.insert(name.clone(), node.clone());
                }
            }
        }
    }

    Ok(SchemaNode {
        kind: NodeKind::Map(fields),
        nullable: false,
        optional: false,
    })
}
