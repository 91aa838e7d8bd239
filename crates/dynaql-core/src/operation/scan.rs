//! `Scan` builder.

use dynaql_model::input::ScanInput;
use dynaql_model::{OperationDef, RawResponse, ReturnConsumedCapacity, Value};

use super::{Table, collect_paths, compile_condition, compile_projection, decode_all, log_built, run};
use crate::condition::{CompileContext, Condition};
use crate::error::Result;
use crate::placeholder::Placeholders;
use crate::runner::Runner;

/// Builds a `Scan` operation.
#[derive(Debug, Clone)]
pub struct ScanBuilder {
    table: Table,
    index: Option<String>,
    filter: Option<Condition>,
    projection: Vec<String>,
    limit: Option<u32>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

impl ScanBuilder {
    pub(super) fn new(table: Table) -> Self {
        Self {
            table,
            index: None,
            filter: None,
            projection: Vec::new(),
            limit: None,
            return_consumed_capacity: None,
        }
    }

    /// Scan a secondary index instead of the base table.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// Filter applied to every evaluated item.
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

    /// Consumed capacity reporting.
    #[must_use]
    pub fn return_consumed_capacity(mut self, value: ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(value);
        self
    }

    /// Compile into an operation definition.
    pub fn build(&self) -> Result<OperationDef> {
        let schema = self.table.combined(self.index.as_deref())?;

        let mut placeholders = Placeholders::new();
        let filter_expression = compile_condition(
            self.filter.as_ref(),
            schema,
            &mut CompileContext::new(),
            &mut placeholders,
        )?;
        let projection_expression =
            compile_projection(&self.projection, schema, &mut placeholders)?;
        let (names, values) = placeholders.into_parts();

        let operation = OperationDef::Scan(ScanInput {
            table_name: self.table.name().to_owned(),
            index_name: self.index.clone(),
            filter_expression,
            projection_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            limit: self.limit,
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
