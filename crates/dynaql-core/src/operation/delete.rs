//! `DeleteItem` builder.

use dynaql_model::input::DeleteItemInput;
use dynaql_model::{
    OperationDef, RawResponse, ReturnConsumedCapacity, ReturnItemCollectionMetrics,
    ReturnValues, Value,
};

use super::{Table, compile_condition, decode_one, log_built, run};
use crate::condition::{CompileContext, Condition};
use crate::error::{Error, Result};
use crate::key::compile_key;
use crate::placeholder::Placeholders;
use crate::runner::Runner;

/// Builds a `DeleteItem` operation.
#[derive(Debug, Clone)]
pub struct DeleteItemBuilder {
    table: Table,
    entity: String,
    key: Option<Value>,
    condition: Option<Condition>,
    return_values: Option<ReturnValues>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
}

impl DeleteItemBuilder {
    pub(super) fn new(table: Table, entity: String) -> Self {
        Self {
            table,
            entity,
            key: None,
            condition: None,
            return_values: None,
            return_consumed_capacity: None,
            return_item_collection_metrics: None,
        }
    }

    /// Primary key of the item.
    #[must_use]
    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Condition that must hold for the delete to succeed.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Attributes to return.
    #[must_use]
    pub fn return_values(mut self, value: ReturnValues) -> Self {
        self.return_values = Some(value);
        self
    }

    /// Consumed capacity reporting.
    #[must_use]
    pub fn return_consumed_capacity(mut self, value: ReturnConsumedCapacity) -> Self {
        self.return_consumed_capacity = Some(value);
        self
    }

    /// Item collection metrics reporting.
    #[must_use]
    pub fn return_item_collection_metrics(mut self, value: ReturnItemCollectionMetrics) -> Self {
        self.return_item_collection_metrics = Some(value);
        self
    }

    /// Compile into an operation definition.
    pub fn build(&self) -> Result<OperationDef> {
        let entity = self.table.entity(&self.entity)?;
        let key = self.key.as_ref().ok_or(Error::MissingKeyCondition)?;
        let key = compile_key(entity, key)?;

        let mut placeholders = Placeholders::new();
        let condition_expression = compile_condition(
            self.condition.as_ref(),
            entity,
            &mut CompileContext::new(),
            &mut placeholders,
        )?;
        let (names, values) = placeholders.into_parts();

        let operation = OperationDef::DeleteItem(DeleteItemInput {
            table_name: self.table.name().to_owned(),
            key,
            condition_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
            return_values: self.return_values,
            return_consumed_capacity: self.return_consumed_capacity,
            return_item_collection_metrics: self.return_item_collection_metrics,
        });
        log_built(&operation);
        Ok(operation)
    }

    /// Build and run.
    pub async fn execute<R: Runner + ?Sized>(&self, runner: &R) -> Result<RawResponse> {
        run(runner, &self.build()?).await
    }

    /// Build, run and decode the returned attributes, if any.
    pub async fn execute_and_decode<R: Runner + ?Sized>(&self, runner: &R) -> Result<Option<Value>> {
        let response = self.execute(runner).await?;
        let entity = self.table.entity(&self.entity)?;
        decode_one(entity, response.attributes.as_ref(), self.table.decode_mode())
    }
}
