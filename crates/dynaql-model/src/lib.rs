//! Wire model types for dynaql.
//!
//! This crate holds the store's JSON wire representation ([`TypeDescriptor`]),
//! the application-level [`Value`] the codec converts to and from, and the
//! compiled operation records handed to a runner.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

pub mod input;
pub mod operations;
pub mod output;
pub mod type_descriptor;
pub mod types;
pub mod value;

pub use input::{NamePlaceholders, ValuePlaceholders};
pub use operations::{OperationDef, OperationKind};
pub use output::RawResponse;
pub use type_descriptor::{Item, TypeDescriptor};
pub use types::{
    ReturnConsumedCapacity, ReturnItemCollectionMetrics, ReturnValues, ScalarKind, SetKind,
};
pub use value::Value;
