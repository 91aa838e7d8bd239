//! `PutItem` builder.

use dynaql_model::input::PutItemInput;
use dynaql_model::{
    OperationDef, RawResponse, ReturnConsumedCapacity, ReturnItemCollectionMetrics,
    ReturnValues, Value,
};
use indexmap::IndexMap;

use super::{Table, compile_condition, decode_one, log_built, run};
use crate::codec;
use crate::condition::{CompileContext, Condition};
use crate::error::{Error, Result};
use crate::key::KeyAttributes;
use crate::placeholder::Placeholders;
use crate::runner::Runner;
use crate::schema::SchemaNode;

/// Builds a `PutItem` operation.
#[derive(Debug, Clone)]
pub struct PutItemBuilder {
    table: Table,
    entity: String,
    item: Option<Value>,
    condition: Option<Condition>,
    throw_if_exists: bool,
    return_values: Option<ReturnValues>,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
}

impl PutItemBuilder {
    pub(super) fn new(table: Table, entity: String) -> Self {
        Self {
            table,
            entity,
            item: None,
            condition: None,
            throw_if_exists: false,
            return_values: None,
            return_consumed_capacity: None,
            return_item_collection_metrics: None,
        }
    }

    /// The item to write.
    #[must_use]
    pub fn item(mut self, item: impl Into<Value>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Condition that must hold for the put to succeed.
    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Fail when an item with the same key already exists.
    #[must_use]
    pub fn throw_if_exists(mut self) -> Self {
        self.throw_if_exists = true;
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
        let empty = Value::Map(IndexMap::new());
        let value = self.item.as_ref().unwrap_or(&empty);
        let item = codec::encode_item(entity, value)?;

        let key_guard;
        let condition = match (&self.condition, self.throw_if_exists) {
            (Some(_), true) => return Err(Error::ConditionAlreadySet),
            (Some(condition), false) => Some(condition),
            (None, true) => {
                key_guard = key_differs(entity, value)?;
                Some(&key_guard)
            }
            (None, false) => None,
        };

        let mut placeholders = Placeholders::new();
        let condition_expression = compile_condition(
            condition,
            entity,
            &mut CompileContext::new(),
            &mut placeholders,
        )?;
        let (names, values) = placeholders.into_parts();

        let operation = OperationDef::PutItem(PutItemInput {
            table_name: self.table.name().to_owned(),
            item,
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

/// `pk <> :pk [AND sk <> :sk]` built from the item's own key values.
fn key_differs(entity: &SchemaNode, item: &Value) -> Result<Condition> {
    let attributes = KeyAttributes::of(entity)?;
    let mut leaves = attributes
        .names()
        .map(|name| {
            item.get(name)
                .map(|value| Condition::ne(name, value.clone()))
                .ok_or_else(|| Error::MissingPrimaryKey {
                    name: name.to_owned(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(if leaves.len() == 1 {
        leaves.remove(0)
    } else {
        Condition::and(leaves)
    })
}
