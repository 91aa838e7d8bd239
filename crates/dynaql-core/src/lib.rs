//! Schema-driven expression and operation compiler for dynaql.
//!
//! Entities are declared once with the [`schema`] builders. Conditions,
//! projections and updates are validated against those declarations and
//! compiled into expression text plus placeholder tables; [`Table`] assembles
//! them into complete [`OperationDef`]s that a [`Runner`] sends to the store.
//!
//! [`OperationDef`]: dynaql_model::OperationDef
#![allow(missing_docs, clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod codec;
pub mod condition;
pub mod config;
pub mod error;
pub mod key;
pub mod operation;
pub mod path;
pub mod placeholder;
pub mod projection;
pub mod runner;
pub mod schema;
pub mod update;

pub use condition::{CompileContext, CompiledCondition, Condition, LogicalOperator, Operator};
pub use config::{DecodeMode, DynaqlConfig};
pub use error::{Error, Result, SchemaError};
pub use operation::{
    DeleteItemBuilder, GetItemBuilder, PutItemBuilder, QueryBuilder, ScanBuilder, Table,
    UpdateItemBuilder,
};
pub use path::AttributePath;
pub use placeholder::Placeholders;
pub use runner::Runner;
pub use schema::{SchemaNode, TableSchema};
pub use update::UpdateAction;
