//! Update compiler.
//!
//! Compiles a list of [`UpdateAction`]s into a `SET ... REMOVE ...`
//! expression. Names use one stable token per segment; each value-carrying
//! action `k` binds `:<path>_u<k>`.

use std::collections::HashSet;

use dynaql_model::{ScalarKind, Value};
use tracing::debug;

use crate::codec;
use crate::error::{Error, Result};
use crate::path::{self, AttributePath};
use crate::placeholder::{Placeholders, value_placeholder};
use crate::schema::{NodeKind, SchemaNode};

/// One change applied by an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// `path = value`.
    Set {
        /// Target attribute.
        path: AttributePath,
        /// New value.
        value: Value,
    },
    /// `path = path + by`.
    Increment {
        /// Target number attribute.
        path: AttributePath,
        /// Amount.
        by: Value,
    },
    /// `path = path - by`.
    Decrement {
        /// Target number attribute.
        path: AttributePath,
        /// Amount.
        by: Value,
    },
    /// `path = list_append(path, values)`.
    AppendList {
        /// Target list attribute.
        path: AttributePath,
        /// Elements to append.
        values: Vec<Value>,
    },
    /// `REMOVE path`.
    Remove {
        /// Target attribute.
        path: AttributePath,
    },
}

impl UpdateAction {
    /// Assign a value.
    pub fn set(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::Set {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Add to a number.
    pub fn increment(path: impl Into<AttributePath>, by: impl Into<Value>) -> Self {
        Self::Increment {
            path: path.into(),
            by: by.into(),
        }
    }

    /// Subtract from a number.
    pub fn decrement(path: impl Into<AttributePath>, by: impl Into<Value>) -> Self {
        Self::Decrement {
            path: path.into(),
            by: by.into(),
        }
    }

    /// Append elements to a list.
    pub fn append_list<V: Into<Value>>(
        path: impl Into<AttributePath>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::AppendList {
            path: path.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Remove an attribute or list element.
    pub fn remove(path: impl Into<AttributePath>) -> Self {
        Self::Remove { path: path.into() }
    }

    /// The attribute this action targets.
    #[must_use]
    pub fn path(&self) -> &AttributePath {
        match self {
            Self::Set { path, .. }
            | Self::Increment { path, .. }
            | Self::Decrement { path, .. }
            | Self::AppendList { path, .. }
            | Self::Remove { path } => path,
        }
    }
}

/// Result of compiling an update.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledUpdate {
    /// `SET ... REMOVE ...` text.
    pub expression: String,
    /// Name and value tables the expression refers to.
    pub placeholders: Placeholders,
}

/// Compile `actions` against an entity schema.
pub fn compile(actions: &[UpdateAction], entity: &SchemaNode) -> Result<CompiledUpdate> {
    if actions.is_empty() {
        return Err(Error::update("no update actions"));
    }

    let mut placeholders = Placeholders::new();
    let mut seen = HashSet::with_capacity(actions.len());
    let mut sets = Vec::new();
    let mut removes = Vec::new();

    for (k, action) in actions.iter().enumerate() {
        let path = action.path();
        if !seen.insert(path.as_str()) {
            return Err(Error::update(format!("'{path}' is updated more than once")));
        }
        let node = path.resolve(entity)?;
        if entity.child(path.root_attribute()).is_some_and(SchemaNode::is_key) {
            return Err(Error::update(format!(
                "key attribute '{}' cannot be updated",
                path.root_attribute()
            )));
        }

        let name = placeholders.bind_path(path, "")?;
        let token = value_placeholder(path, &format!("u{k}"));

        match action {
            UpdateAction::Set { value, .. } => {
                placeholders.bind_value(token.clone(), codec::encode(node, value)?)?;
                sets.push(format!("{name} = {token}"));
            }
            UpdateAction::Increment { by, .. } | UpdateAction::Decrement { by, .. } => {
                if !matches!(node.kind(), NodeKind::Scalar(ScalarKind::Number)) {
                    return Err(Error::update(format!("'{path}' is not a number")));
                }
                let amount = codec::encode(&SchemaNode::scalar(ScalarKind::Number), by)?;
                placeholders.bind_value(token.clone(), amount)?;
                let sign = if matches!(action, UpdateAction::Increment { .. }) {
                    '+'
                } else {
                    '-'
                };
                sets.push(format!("{name} = {name} {sign} {token}"));
            }
            UpdateAction::AppendList { values, .. } => {
                if node.element().is_none() {
                    return Err(Error::update(format!("'{path}' is not a list")));
                }
                let appended = codec::encode(node, &Value::List(values.clone()))?;
                placeholders.bind_value(token.clone(), appended)?;
                sets.push(format!("{name} = list_append({name}, {token})"));
            }
            UpdateAction::Remove { .. } => {
                check_removable(entity, path, node)?;
                removes.push(name);
            }
        }
    }

    let mut clauses = Vec::with_capacity(2);
    if !sets.is_empty() {
        clauses.push(format!("SET {}", sets.join(", ")));
    }
    if !removes.is_empty() {
        clauses.push(format!("REMOVE {}", removes.join(", ")));
    }
    let expression = clauses.join(" ");

    debug!(
        expression = %expression,
        names = placeholders.names().len(),
        values = placeholders.values().len(),
        "compiled update"
    );
    Ok(CompiledUpdate {
        expression,
        placeholders,
    })
}

/// Map children may only be removed when declared optional; list elements
/// can always be removed.
fn check_removable(entity: &SchemaNode, path: &AttributePath, node: &SchemaNode) -> Result<()> {
    let parent = match path.as_str().rsplit_once('.') {
        Some((parent, _)) => path::require(entity, parent)?,
        None => entity,
    };
    if parent.children().is_some() && !node.is_optional() {
        return Err(Error::update(format!(
            "'{path}' is required and cannot be removed"
        )));
    }
    Ok(())
}
