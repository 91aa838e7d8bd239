//! Shared enums for schema kinds and operation options.
//!
//! Option enums use idiomatic Rust `PascalCase` variants with `#[serde(rename)]`
//! attributes mapping to the `SCREAMING_SNAKE_CASE` wire format.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Schema kinds
// ---------------------------------------------------------------------------

/// Kind of a scalar attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// UTF-8 string, stored as `S`.
    String,
    /// Number, stored as `N`.
    Number,
    /// Boolean, stored as `BOOL`.
    Boolean,
    /// Timestamp, stored as an ISO-8601 `S`.
    Date,
    /// Raw bytes, stored as `B`.
    Binary,
}

impl ScalarKind {
    /// Human-readable name used in error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Binary => "binary",
        }
    }

    /// The descriptor tag values of this kind are encoded under.
    #[must_use]
    pub fn descriptor_tag(&self) -> &'static str {
        match self {
            Self::String | Self::Date => "S",
            Self::Number => "N",
            Self::Boolean => "BOOL",
            Self::Binary => "B",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member kind of a set attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKind {
    /// String set, stored as `SS`.
    String,
    /// Number set, stored as `NS`.
    Number,
    /// Binary set, stored as `BS`.
    Binary,
}

impl SetKind {
    /// The scalar kind of one set member.
    #[must_use]
    pub fn member_kind(&self) -> ScalarKind {
        match self {
            Self::String => ScalarKind::String,
            Self::Number => ScalarKind::Number,
            Self::Binary => ScalarKind::Binary,
        }
    }

    /// The descriptor tag of the whole set.
    #[must_use]
    pub fn descriptor_tag(&self) -> &'static str {
        match self {
            Self::String => "SS",
            Self::Number => "NS",
            Self::Binary => "BS",
        }
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} set", self.member_kind())
    }
}

// ---------------------------------------------------------------------------
// Operation options
// ---------------------------------------------------------------------------

/// Which item attributes a write operation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnValues {
    /// Nothing is returned.
    #[default]
    #[serde(rename = "NONE")]
    None,
    /// All attributes as they were before the operation.
    #[serde(rename = "ALL_OLD")]
    AllOld,
    /// Only the updated attributes as they were before the operation.
    #[serde(rename = "UPDATED_OLD")]
    UpdatedOld,
    /// All attributes as they are after the operation.
    #[serde(rename = "ALL_NEW")]
    AllNew,
    /// Only the updated attributes as they are after the operation.
    #[serde(rename = "UPDATED_NEW")]
    UpdatedNew,
}

impl ReturnValues {
    /// Returns the wire-format string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::AllOld => "ALL_OLD",
            Self::UpdatedOld => "UPDATED_OLD",
            Self::AllNew => "ALL_NEW",
            Self::UpdatedNew => "UPDATED_NEW",
        }
    }
}

impl fmt::Display for ReturnValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controls whether consumed capacity information is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnConsumedCapacity {
    /// Capacity for the table and every index involved.
    #[serde(rename = "INDEXES")]
    Indexes,
    /// Only the total.
    #[serde(rename = "TOTAL")]
    Total,
    /// Nothing (default).
    #[default]
    #[serde(rename = "NONE")]
    None,
}

impl ReturnConsumedCapacity {
    /// Returns the wire-format string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indexes => "INDEXES",
            Self::Total => "TOTAL",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for ReturnConsumedCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controls whether item collection metrics are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReturnItemCollectionMetrics {
    /// Item collection size estimates.
    #[serde(rename = "SIZE")]
    Size,
    /// Nothing (default).
    #[default]
    #[serde(rename = "NONE")]
    None,
}

impl ReturnItemCollectionMetrics {
    /// Returns the wire-format string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "SIZE",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for ReturnItemCollectionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
