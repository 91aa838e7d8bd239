//! Operation kinds and the compiled operation envelope.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::input::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, ScanInput, UpdateItemInput,
};

/// All operations the assembler can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Put (insert or replace) an item.
    PutItem,
    /// Get an item by primary key.
    GetItem,
    /// Delete an item by primary key.
    DeleteItem,
    /// Update an item.
    UpdateItem,
    /// Query items by key condition.
    Query,
    /// Scan all items in a table.
    Scan,
}

impl OperationKind {
    /// Returns the store's operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PutItem => "PutItem",
            Self::GetItem => "GetItem",
            Self::DeleteItem => "DeleteItem",
            Self::UpdateItem => "UpdateItem",
            Self::Query => "Query",
            Self::Scan => "Scan",
        }
    }

    /// Whether the operation mutates stored data.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::PutItem | Self::DeleteItem | Self::UpdateItem)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully compiled operation, ready to hand to a runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OperationDef {
    /// `PutItem` request.
    PutItem(PutItemInput),
    /// `GetItem` request.
    GetItem(GetItemInput),
    /// `DeleteItem` request.
    DeleteItem(DeleteItemInput),
    /// `UpdateItem` request.
    UpdateItem(UpdateItemInput),
    /// `Query` request.
    Query(QueryInput),
    /// `Scan` request.
    Scan(ScanInput),
}

impl OperationDef {
    /// The kind of this operation.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::PutItem(_) => OperationKind::PutItem,
            Self::GetItem(_) => OperationKind::GetItem,
            Self::DeleteItem(_) => OperationKind::DeleteItem,
            Self::UpdateItem(_) => OperationKind::UpdateItem,
            Self::Query(_) => OperationKind::Query,
            Self::Scan(_) => OperationKind::Scan,
        }
    }

    /// Target table of this operation.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::PutItem(i) => &i.table_name,
            Self::GetItem(i) => &i.table_name,
            Self::DeleteItem(i) => &i.table_name,
            Self::UpdateItem(i) => &i.table_name,
            Self::Query(i) => &i.table_name,
            Self::Scan(i) => &i.table_name,
        }
    }
}

impl From<PutItemInput> for OperationDef {
    fn from(input: PutItemInput) -> Self {
        Self::PutItem(input)
    }
}

impl From<GetItemInput> for OperationDef {
    fn from(input: GetItemInput) -> Self {
        Self::GetItem(input)
    }
}

impl From<DeleteItemInput> for OperationDef {
    fn from(input: DeleteItemInput) -> Self {
        Self::DeleteItem(input)
    }
}

impl From<UpdateItemInput> for OperationDef {
    fn from(input: UpdateItemInput) -> Self {
        Self::UpdateItem(input)
    }
}

impl From<QueryInput> for OperationDef {
    fn from(input: QueryInput) -> Self {
        Self::Query(input)
    }
}

impl From<ScanInput> for OperationDef {
    fn from(input: ScanInput) -> Self {
        Self::Scan(input)
    }
}
