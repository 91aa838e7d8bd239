//! Operation assembler.
//!
//! A [`Table`] hands out one builder per operation. Every builder setter
//! consumes the builder and returns the updated value; builders are `Clone`,
//! so a base builder can be branched into independent variants. `build()`
//! compiles the accumulated state into an [`OperationDef`] without any I/O.

mod delete;
mod get;
mod put;
mod query;
mod scan;
mod update;

use std::sync::Arc;

use dynaql_model::{Item, OperationDef, RawResponse, Value};
use tracing::debug;

pub use self::delete::DeleteItemBuilder;
pub use self::get::GetItemBuilder;
pub use self::put::PutItemBuilder;
pub use self::query::QueryBuilder;
pub use self::scan::ScanBuilder;
pub use self::update::UpdateItemBuilder;
use crate::codec;
use crate::condition::{self, CompileContext, Condition};
use crate::config::{DecodeMode, DynaqlConfig};
use crate::error::Result;
use crate::placeholder::Placeholders;
use crate::projection;
use crate::runner::Runner;
use crate::schema::{SchemaNode, TableSchema};

/// A physical table: its name, schema and configuration.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Arc<TableSchema>,
    config: DynaqlConfig,
}

impl Table {
    /// Table using the default configuration.
    pub fn new(schema: impl Into<Arc<TableSchema>>) -> Self {
        Self::with_config(schema, DynaqlConfig::default())
    }

    /// Table using `config`.
    pub fn with_config(schema: impl Into<Arc<TableSchema>>, config: DynaqlConfig) -> Self {
        Self {
            schema: schema.into(),
            config,
        }
    }

    /// Table configured from environment variables.
    pub fn from_env(schema: impl Into<Arc<TableSchema>>) -> Self {
        Self::with_config(schema, DynaqlConfig::from_env())
    }

    /// Physical table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.table_name
    }

    /// Shared schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &DynaqlConfig {
        &self.config
    }

    /// Put one item of `entity`.
    #[must_use]
    pub fn put(&self, entity: impl Into<String>) -> PutItemBuilder {
        PutItemBuilder::new(self.clone(), entity.into())
    }

    /// Get one item of `entity` by key.
    #[must_use]
    pub fn get(&self, entity: impl Into<String>) -> GetItemBuilder {
        GetItemBuilder::new(self.clone(), entity.into())
    }

    /// Delete one item of `entity` by key.
    #[must_use]
    pub fn delete(&self, entity: impl Into<String>) -> DeleteItemBuilder {
        DeleteItemBuilder::new(self.clone(), entity.into())
    }

    /// Update one item of `entity` by key.
    #[must_use]
    pub fn update(&self, entity: impl Into<String>) -> UpdateItemBuilder {
        UpdateItemBuilder::new(self.clone(), entity.into())
    }

    /// Query the table (or one of its indexes).
    #[must_use]
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.clone())
    }

    /// Scan the table (or one of its indexes).
    #[must_use]
    pub fn scan(&self) -> ScanBuilder {
        ScanBuilder::new(self.clone())
    }

    fn entity(&self, name: &str) -> Result<&SchemaNode> {
        Ok(self.schema.entity(name)?.as_ref())
    }

    /// Combined schema of the table, or of `index` when given.
    fn combined(&self, index: Option<&str>) -> Result<&SchemaNode> {
        let combined = match index {
            Some(name) => self.schema.index(name)?.combined(),
            None => self.schema.combined(),
        };
        Ok(combined.as_ref())
    }

    fn decode_mode(&self) -> DecodeMode {
        self.config.decode_mode
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Compile an optional condition into `placeholders`.
fn compile_condition(
    condition: Option<&Condition>,
    schema: &SchemaNode,
    ctx: &mut CompileContext,
    placeholders: &mut Placeholders,
) -> Result<Option<String>> {
    let Some(condition) = condition else {
        return Ok(None);
    };
    condition::compile_into(condition, schema, ctx, placeholders).map(Some)
}

/// Compile a projection into `placeholders`; no paths means no projection.
fn compile_projection(
    paths: &[String],
    schema: &SchemaNode,
    placeholders: &mut Placeholders,
) -> Result<Option<String>> {
    if paths.is_empty() {
        return Ok(None);
    }
    projection::compile_into(paths, schema, placeholders).map(Some)
}

async fn run<R: Runner + ?Sized>(runner: &R, operation: &OperationDef) -> Result<RawResponse> {
    debug!(
        operation = %operation.kind(),
        table = operation.table_name(),
        write = operation.kind().is_write(),
        "running operation"
    );
    Ok(runner.run(operation).await?)
}

fn decode_one(node: &SchemaNode, item: Option<&Item>, mode: DecodeMode) -> Result<Option<Value>> {
    item.map(|item| codec::decode_item(node, item, mode))
        .transpose()
}

fn decode_all(node: &SchemaNode, items: &[Item], mode: DecodeMode) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| codec::decode_item(node, item, mode))
        .collect()
}

fn log_built(operation: &OperationDef) {
    debug!(
        operation = %operation.kind(),
        table = operation.table_name(),
        write = operation.kind().is_write(),
        "built operation"
    );
}

fn collect_paths<P: Into<String>>(paths: impl IntoIterator<Item = P>) -> Vec<String> {
    paths.into_iter().map(Into::into).collect()
}
