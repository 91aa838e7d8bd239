//! Projection compiler.
//!
//! Each path becomes `#seg1.#seg2...` with one stable token per segment, the
//! same naming the condition compiler uses for nested paths. Paths are joined
//! with `, `.

use dynaql_model::NamePlaceholders;
use tracing::debug;

use crate::error::Result;
use crate::path::AttributePath;
use crate::placeholder::Placeholders;
use crate::schema::SchemaNode;

/// Result of compiling a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProjection {
    /// Expression text.
    pub expression: String,
    /// Name table (values are never bound).
    pub placeholders: Placeholders,
}

impl CompiledProjection {
    /// Name table.
    #[must_use]
    pub fn names(&self) -> &NamePlaceholders {
        self.placeholders.names()
    }
}

/// Compile `paths` against `schema`. Every path must resolve; repeated paths
/// are emitted once.
pub fn compile<P: AsRef<str>>(paths: &[P], schema: &SchemaNode) -> Result<CompiledProjection> {
    let mut placeholders = Placeholders::new();
    let expression = compile_into(paths, schema, &mut placeholders)?;
    Ok(CompiledProjection {
        expression,
        placeholders,
    })
}

/// Compile `paths` into an existing table. On failure `placeholders` is
/// unchanged.
pub fn compile_into<P: AsRef<str>>(
    paths: &[P],
    schema: &SchemaNode,
    placeholders: &mut Placeholders,
) -> Result<String> {
    let mut table = placeholders.clone();
    let mut parts: Vec<String> = Vec::with_capacity(paths.len());

    for raw in paths {
        let path = AttributePath::new(raw.as_ref());
        path.resolve(schema)?;
        let part = table.bind_path(&path, "")?;
        if !parts.contains(&part) {
            parts.push(part);
        }
    }
    *placeholders = table;

    let expression = parts.join(", ");
    debug!(expression = %expression, names = placeholders.names().len(), "compiled projection");
    Ok(expression)
}
