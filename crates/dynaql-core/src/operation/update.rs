//! `UpdateItem` builder.

use dynaql_model::input::UpdateItemInput;
use dynaql_model::{
    OperationDef, RawResponse, ReturnConsumedCapacity, ReturnItemCollectionMetrics,
    ReturnValues, Value,
};

use super::{Table, compile_condition, decode_one, log_built, run};
use crate::condition::{CompileContext, Condition};
use crate::error::{Error, Result};
use crate::key::compile_key;
use crate::path::AttributePath;
use crate::runner::Runner;
use crate::update::{self, UpdateAction};

/// Builds an `UpdateItem` operation.
#[derive(Debug, Clone)]
pub struct UpdateItemBuilder {
    table: Table,
    entity: String,
    key: Option<Value>,
    actions: Vec<UpdateAction>,
    condition: Option<Condition>,
    return_values: Option<ReturnValues>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
}

impl UpdateItemBuilder {
    pub(super) fn new(table: Table, entity: String) -> Self {
        Self {
            table,
            entity,
            key: None,
            actions: Vec::new(),
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

    /// Append an arbitrary action.
    #[must_use]
    pub fn action(mut self, action: UpdateAction) -> Self {
        self.actions.push(action);
        self
    }

    /// `SET path = value`.
    #[must_use]
    pub fn set(self, path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        self.action(UpdateAction::set(path, value))
    }

    /// `SET path = path + by`.
    #[must_use]
    pub fn increment(self, path: impl Into<AttributePath>, by: impl Into<Value>) -> Self {
        self.action(UpdateAction::increment(path, by))
    }

    /// `SET path = path - by`.
    #[must_use]
    pub fn decrement(self, path: impl Into<AttributePath>, by: impl Into<Value>) -> Self {
        self.action(UpdateAction::decrement(path, by))
    }

    /// `SET path = list_append(path, values)`.
    #[must_use]
    pub fn append_list<V: Into<Value>>(
        self,
        path: impl Into<AttributePath>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.action(UpdateAction::append_list(path, values))
    }

    /// `REMOVE path`.
    #[must_use]
    pub fn remove(self, path: impl Into<AttributePath>) -> Self {
        self.action(UpdateAction::remove(path))
    }

    /// Condition that must hold for the update to succeed.
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

        let compiled = update::compile(&self.actions, entity)?;
        let mut placeholders = compiled.placeholders;
        let condition_expression = compile_condition(
            self.condition.as_ref(),
            entity,
            &mut CompileContext::new(),
            &mut placeholders,
        )?;
        let (names, values) = placeholders.into_parts();

        let operation = OperationDef::UpdateItem(UpdateItemInput {
            table_name: self.table.name().to_owned(),
            key,
            update_expression: compiled.expression,
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
