//! Error types for schema construction and compilation.
//!
//! Every error is raised synchronously before any runner call; none of them
//! is retryable.

/// Errors raised while building or looking up schemas.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Two siblings (or two entities of one table) declare the same field.
    #[error("Duplicate field name: {name}")]
    DuplicateFieldName {
        /// The repeated field name.
        name: String,
    },
    /// The table declares no entity with this name.
    #[error("Unknown entity: {name}")]
    UnknownEntity {
        /// The requested entity.
        name: String,
    },
    /// The table declares no secondary index with this name.
    #[error("Unknown index: {name}")]
    UnknownIndex {
        /// The requested index.
        name: String,
    },
}

/// Errors raised while encoding, decoding or compiling against a schema.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Schema construction or lookup failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A dotted path does not resolve in the schema.
    #[error("Path not found in schema: {path}")]
    PathNotFound {
        /// The offending path.
        path: String,
    },

    /// A required attribute is missing.
    #[error("Value at '{path}' is required but missing")]
    ValueNotOptional {
        /// Dotted path of the attribute.
        path: String,
    },

    /// A null was supplied for a non-nullable attribute.
    #[error("Value at '{path}' is not nullable")]
    ValueNotNullable {
        /// Dotted path of the attribute.
        path: String,
    },

    /// A value (or descriptor) does not have the shape the schema declares.
    #[error("Shape mismatch at '{path}': expected {expected}, found {found}")]
    ShapeMismatch {
        /// Dotted path of the attribute.
        path: String,
        /// What the schema declares.
        expected: String,
        /// What was supplied.
        found: String,
    },

    /// An `N` descriptor is not a base-10 number.
    #[error("Invalid number at '{path}': {value}")]
    InvalidNumber {
        /// Dotted path of the attribute.
        path: String,
        /// The raw text.
        value: String,
    },

    /// A date string is not ISO-8601.
    #[error("Invalid date at '{path}': {value}")]
    InvalidDate {
        /// Dotted path of the attribute.
        path: String,
        /// The raw text.
        value: String,
    },

    /// A condition tree is malformed.
    #[error("Invalid condition: {message}")]
    InvalidCondition {
        /// Explanation.
        message: String,
    },

    /// One placeholder token would be bound to two different targets.
    #[error("Placeholder {token} is already bound to a different target")]
    PlaceholderConflict {
        /// The contested token.
        token: String,
    },

    /// A key-addressed operation was built without a key.
    #[error("Key condition is required")]
    MissingKeyCondition,

    /// A primary key attribute is absent from a key value.
    #[error("Missing primary key attribute: {name}")]
    MissingPrimaryKey {
        /// The key attribute.
        name: String,
    },

    /// A key value is malformed.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Explanation.
        message: String,
    },

    /// An update is empty or touches attributes it may not.
    #[error("Invalid update: {message}")]
    InvalidUpdate {
        /// Explanation.
        message: String,
    },

    /// `throw_if_exists` was combined with an explicit condition.
    #[error("A condition is already set for this operation")]
    ConditionAlreadySet,

    /// The runner failed.
    #[error("Transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Result alias for compilation.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(path: &str, expected: impl ToString, found: impl ToString) -> Self {
        Self::ShapeMismatch {
            path: path.to_owned(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition {
            message: message.into(),
        }
    }

    pub(crate) fn update(message: impl Into<String>) -> Self {
        Self::InvalidUpdate {
            message: message.into(),
        }
    }

    pub(crate) fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }
}
