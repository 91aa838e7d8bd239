//! `GetItem` builder.

use dynaql_model::input::GetItemInput;
use dynaql_model::{OperationDef, RawResponse, ReturnConsumedCapacity, Value};

use super::{Table, collect_paths, compile_projection, decode_one, log_built, run};
use crate::error::{Error, Result};
use crate::key::compile_key;
use crate::placeholder::Placeholders;
use crate::runner::Runner;

/// Builds a `GetItem` operation.
#[derive(Debug, Clone)]
pub struct GetItemBuilder {
    table: Table,
    entity: String,
    key: Option<Value>,
    projection: Vec<String>,
    consistent_read: Option<bool>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

impl GetItemBuilder {
    pub(super) fn new(table: Table, entity: String) -> Self {
        Self {
            table,
            entity,
            key: None,
            projection: Vec::new(),
            consistent_read: None,
            return_consumed_capacity: None,
        }
    }

    /// Primary key of the item.
    #[must_use]
    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attributes to retrieve; replaces any earlier projection.
    #[must_use]
    pub fn projection<P: Into<String>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.projection = collect_paths(paths);
        self
    }

    /// Strongly consistent read.
    #[must_use]
    pub fn consistent_read(mut self, value: bool) -> Self {
        self.consistent_read = Some(value);
        self
    }

    /// Consumed capacity reporting.
    #[must_use]
    pub fn return_consumed_capacity(mut self, value: ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(value);
        self
    }

    /// Compile into an operation definition.
    pub fn build(&self) -> Result<OperationDef> {
        let entity = self.table.entity(&self.entity)?;
        let key = self.key.as_ref().ok_or(Error::MissingKeyCondition)?;
        let key = compile_key(entity, key)?;

        let mut placeholders = Placeholders::new();
        let projection_expression =
            compile_projection(&self.projection, entity, &mut placeholders)?;
        let (names, _) = placeholders.into_parts();

        let operation = OperationDef::GetItem(GetItemInput {
            table_name: self.table.name().to_owned(),
            key,
            projection_expression,
            expression_attribute_names: names,
            consistent_read: self.consistent_read,
            return_consumed_capacity: self.return_consumed_capacity,
        });
        log_built(&operation);
        Ok(operation)
    }

    /// Build and run.
    pub async fn execute<R: Runner + ?Sized>(&self, runner: &R) -> Result<RawResponse> {
        run(runner, &self.build()?).await
    }

    /// Build, run and decode the item; `None` when no item matched.
    pub async fn execute_and_decode<R: Runner + ?Sized>(&self, runner: &R) -> Result<Option<Value>> {
        let response = self.execute(runner).await?;
        let entity = self.table.entity(&self.entity)?;
        decode_one(entity, response.item.as_ref(), self.table.decode_mode())
    }
}
