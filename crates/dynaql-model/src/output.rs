//! Raw responses handed back by a runner.

use serde::{Deserialize, Serialize};

use crate::type_descriptor::Item;

/// Undecoded response of any operation.
///
/// Only the members the codec consumes are modelled; everything else the
/// store returns is left to the runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawResponse {
    /// Single item (`GetItem`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,

    /// Matching items (`Query`, `Scan`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,

    /// Returned attributes (`PutItem`, `UpdateItem`, `DeleteItem`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,

    /// Number of matching items (`Query`, `Scan`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Key to resume a paginated `Query` or `Scan` from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Item>,
}
