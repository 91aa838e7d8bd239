//! `Query` builder.

use dynaql_model::input::QueryInput;
use dynaql_model::{OperationDef, RawResponse, ReturnConsumedCapacity, Value};

use super::{Table, collect_paths, compile_condition, compile_projection, decode_all, log_built, run};
use crate::condition::{CompileContext, Condition};
use crate::error::{Error, Result};
use crate::key::KeyAttributes;
use crate::placeholder::Placeholders;
use crate::runner::Runner;
use crate::schema::SchemaNode;

/// Builds a `Query` operation against the combined schema of the table or
/// one of its indexes.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: Table,
    index: Option<String>,
    key_condition: Option<Condition>,
    filter: Option<Condition>,
    projection: Vec<String>,
    limit: Option<u32>,
    scan_index_forward: Option<bool>,
    consistent_read: Option<bool>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

impl QueryBuilder {
    pub(super) fn new(table: Table) -> Self {
        Self {
            table,
            index: None,
            key_condition: None,
            filter: None,
            projection: Vec::new(),
            limit: None,
            scan_index_forward: None,
            consistent_read: None,
            return_consumed_capacity: None,
        }
    }

    /// Query a secondary index instead of the base table.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// Condition on the key attributes. Required.
    #[must_use]
    pub fn key_condition(mut self, condition: Condition) -> Self {
        self.key_condition = Some(condition);
        self
    }

    /// Filter on non-key attributes.
    #[must_use]
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filter = Some(condition);
        self
    }

    /// Attributes to retrieve; replaces any earlier projection.
    #[must_use]
    pub fn projection<P: Into<String>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.projection = collect_paths(paths);
        self
    }

    /// Maximum number of items to evaluate.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Ascending (`true`) or descending sort key order.
    #[must_use]
    pub fn scan_index_forward(mut self, forward: bool) -> Self {
        self.scan_index_forward = Some(forward);
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
        let schema = self.table.combined(self.index.as_deref())?;
        let key_condition = self
            .key_condition
            .as_ref()
            .ok_or(Error::MissingKeyCondition)?;
        check_key_paths(schema, key_condition, self.filter.as_ref())?;

        // Key condition and filter share one numbering so their tokens never collide.
        let mut ctx = CompileContext::new();
        let mut placeholders = Placeholders::new();
        let key_condition_expression =
            compile_condition(Some(key_condition), schema, &mut ctx, &mut placeholders)?
                .unwrap_or_default();
        let filter_expression =
            compile_condition(self.filter.as_ref(), schema, &mut ctx, &mut placeholders)?;
        let projection_expression =
            compile_projection(&self.projection, schema, &mut placeholders)?;
        let (names, values) = placeholders.into_parts();

        let operation = OperationDef::Query(QueryInput {
            table_name: self.table.name().to_owned(),
            index_name: self.index.clone(),
            key_condition_expression,
            filter_expression,
            projection_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            limit: self.limit,
            scan_index_forward: self.scan_index_forward,
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

    /// Build, run and decode every returned item.
    pub async fn execute_and_decode<R: Runner + ?Sized>(&self, runner: &R) -> Result<Vec<Value>> {
        let response = self.execute(runner).await?;
        let schema = self.table.combined(self.index.as_deref())?;
        decode_all(schema, &response.items, self.table.decode_mode())
    }
}

/// The key condition may only name key attributes; the filter may not.
fn check_key_paths(
    schema: &SchemaNode,
    key_condition: &Condition,
    filter: Option<&Condition>,
) -> Result<()> {
    let keys = KeyAttributes::of(schema)?;

    if let Some(path) = key_condition
        .paths()
        .into_iter()
        .find(|p| !p.is_top_level() || !keys.contains(p.root_attribute()))
    {
        return Err(Error::condition(format!(
            "'{path}' is not a key attribute and cannot be used in a key condition"
        )));
    }

    if let Some(path) = filter
        .map(Condition::paths)
        .unwrap_or_default()
        .into_iter()
        .find(|p| keys.contains(p.root_attribute()))
    {
        return Err(Error::condition(format!(
            "key attribute '{path}' cannot be used in a filter"
        )));
    }
    Ok(())
}
