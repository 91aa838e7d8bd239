//! Condition compiler.
//!
//! A [`Condition`] tree is compiled against a schema into an expression string
//! plus name and value placeholder tables. Every leaf takes the next
//! occurrence index from a [`CompileContext`]; top-level attribute names are
//! suffixed with it (`#age_1`), nested paths use one stable token per segment
//! (`#address.#street`). Value tokens always carry the index (`:age_1`).

use std::fmt;
use std::str::FromStr;

use dynaql_model::type_descriptor::DESCRIPTOR_TAGS;
use dynaql_model::{NamePlaceholders, ScalarKind, TypeDescriptor, Value, ValuePlaceholders};
use tracing::debug;

use crate::codec;
use crate::error::{Error, Result};
use crate::path::AttributePath;
use crate::placeholder::{Placeholders, value_placeholder};
use crate::schema::{NodeKind, SchemaNode};

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Leaf operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `begins_with(path, prefix)`
    BeginsWith,
    /// `path BETWEEN low AND high`
    Between,
    /// `path IN (a, b, ...)`
    In,
    /// `attribute_type(path, tag)`
    AttributeType,
    /// `attribute_exists(path)`
    AttributeExists,
    /// `attribute_not_exists(path)`
    AttributeNotExists,
    /// `contains(path, operand)`
    Contains,
    /// `size(path) <cmp> n`
    Size,
}

impl Operator {
    /// Wire token of the operator.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::BeginsWith => "begins_with",
            Self::Between => "between",
            Self::In => "in",
            Self::AttributeType => "attribute_type",
            Self::AttributeExists => "attribute_exists",
            Self::AttributeNotExists => "attribute_not_exists",
            Self::Contains => "contains",
            Self::Size => "size",
        }
    }

    /// Whether this is one of the six binary comparators.
    #[must_use]
    pub fn is_comparator(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "=" => Self::Eq,
            "<>" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "begins_with" => Self::BeginsWith,
            "between" => Self::Between,
            "in" => Self::In,
            "attribute_type" => Self::AttributeType,
            "attribute_exists" => Self::AttributeExists,
            "attribute_not_exists" => Self::AttributeNotExists,
            "contains" => Self::Contains,
            "size" => Self::Size,
            other => return Err(Error::condition(format!("unknown operator '{other}'"))),
        })
    }
}

/// Boolean combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    /// All children hold.
    And,
    /// Any child holds.
    Or,
    /// The children do not (all) hold.
    Not,
}

impl LogicalOperator {
    /// Lower-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "not" => Ok(Self::Not),
            _ => Err(Error::condition(format!("unknown logical operator '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Condition tree
// ---------------------------------------------------------------------------

/// Right-hand side of a comparison leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// One value.
    Single(Value),
    /// Inclusive bounds for `between`.
    Pair(Value, Value),
    /// Candidates for `in`.
    List(Vec<Value>),
    /// Comparator and number for `size`.
    Size(Operator, Value),
}

impl Operand {
    fn describe(&self) -> &'static str {
        match self {
            Self::Single(_) => "single value",
            Self::Pair(..) => "pair",
            Self::List(_) => "list",
            Self::Size(..) => "size comparison",
        }
    }
}

/// A condition tree, as used for filters, key conditions and write conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `path <operator> operand`.
    Comparison {
        /// Attribute the leaf tests.
        path: AttributePath,
        /// Leaf operator.
        operator: Operator,
        /// Right-hand side.
        operand: Operand,
    },
    /// `attribute_exists(path)` / `attribute_not_exists(path)`.
    NoValueComparison {
        /// Attribute the leaf tests.
        path: AttributePath,
        /// Leaf operator.
        operator: Operator,
    },
    /// Boolean combination of child conditions.
    Logical {
        /// Combinator.
        operator: LogicalOperator,
        /// Children, in order.
        children: Vec<Condition>,
    },
}

impl Condition {
    /// `path <operator> value`.
    pub fn compare(
        path: impl Into<AttributePath>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self::Comparison {
            path: path.into(),
            operator,
            operand: Operand::Single(value.into()),
        }
    }

    /// `path = value`.
    pub fn eq(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Operator::Eq, value)
    }

    /// `path <> value`.
    pub fn ne(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Operator::Ne, value)
    }

    /// `path < value`.
    pub fn lt(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Operator::Lt, value)
    }

    /// `path <= value`.
    pub fn le(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Operator::Le, value)
    }

    /// `path > value`.
    pub fn gt(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Operator::Gt, value)
    }

    /// `path >= value`.
    pub fn ge(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Operator::Ge, value)
    }

    /// `begins_with(path, prefix)`.
    pub fn begins_with(path: impl Into<AttributePath>, prefix: impl Into<Value>) -> Self {
        Self::compare(path, Operator::BeginsWith, prefix)
    }

    /// `contains(path, value)`.
    pub fn contains(path: impl Into<AttributePath>, value: impl Into<Value>) -> Self {
        Self::compare(path, Operator::Contains, value)
    }

    /// `attribute_type(path, tag)`, `tag` being a descriptor tag such as `"S"`.
    pub fn attribute_type(path: impl Into<AttributePath>, tag: impl Into<String>) -> Self {
        Self::compare(path, Operator::AttributeType, Value::String(tag.into()))
    }

    /// `path BETWEEN low AND high`.
    pub fn between(
        path: impl Into<AttributePath>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Self::Comparison {
            path: path.into(),
            operator: Operator::Between,
            operand: Operand::Pair(low.into(), high.into()),
        }
    }

    /// `path IN (values...)`.
    pub fn is_in<V: Into<Value>>(
        path: impl Into<AttributePath>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::Comparison {
            path: path.into(),
            operator: Operator::In,
            operand: Operand::List(values.into_iter().map(Into::into).collect()),
        }
    }

    /// `size(path) <comparator> value`.
    pub fn size(
        path: impl Into<AttributePath>,
        comparator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self::Comparison {
            path: path.into(),
            operator: Operator::Size,
            operand: Operand::Size(comparator, value.into()),
        }
    }

    /// `attribute_exists(path)`.
    pub fn exists(path: impl Into<AttributePath>) -> Self {
        Self::NoValueComparison {
            path: path.into(),
            operator: Operator::AttributeExists,
        }
    }

    /// `attribute_not_exists(path)`.
    pub fn not_exists(path: impl Into<AttributePath>) -> Self {
        Self::NoValueComparison {
            path: path.into(),
            operator: Operator::AttributeNotExists,
        }
    }

    /// All of `children`.
    pub fn and(children: impl IntoIterator<Item = Condition>) -> Self {
        Self::logical(LogicalOperator::And, children)
    }

    /// Any of `children`.
    pub fn or(children: impl IntoIterator<Item = Condition>) -> Self {
        Self::logical(LogicalOperator::Or, children)
    }

    /// Negation of `children` (their conjunction when there are several).
    pub fn not(children: impl IntoIterator<Item = Condition>) -> Self {
        Self::logical(LogicalOperator::Not, children)
    }

    /// Combine `children` with `operator`.
    pub fn logical(operator: LogicalOperator, children: impl IntoIterator<Item = Condition>) -> Self {
        Self::Logical {
            operator,
            children: children.into_iter().collect(),
        }
    }

    /// Every attribute path the tree references, in visiting order.
    #[must_use]
    pub fn paths(&self) -> Vec<&AttributePath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a AttributePath>) {
        match self {
            Self::Comparison { path, .. } | Self::NoValueComparison { path, .. } => out.push(path),
            Self::Logical { children, .. } => {
                for child in children {
                    child.collect_paths(out);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Per-compilation state: the occurrence index handed to each leaf.
///
/// One context may be threaded through the key condition, filter and write
/// condition of a single operation so that their placeholders never collide.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    next_index: usize,
}

impl CompileContext {
    /// Start counting from zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next leaf will receive.
    #[must_use]
    pub fn position(&self) -> usize {
        self.next_index
    }

    fn next(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }
}

/// Result of compiling a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    /// Expression text.
    pub expression: String,
    /// Name and value tables the expression refers to.
    pub placeholders: Placeholders,
}

impl CompiledCondition {
    /// Name table.
    #[must_use]
    pub fn names(&self) -> &NamePlaceholders {
        self.placeholders.names()
    }

    /// Value table.
    #[must_use]
    pub fn values(&self) -> &ValuePlaceholders {
        self.placeholders.values()
    }
}

/// Compile `condition` against `schema` with a fresh context.
pub fn compile(condition: &Condition, schema: &SchemaNode) -> Result<CompiledCondition> {
    compile_with(condition, schema, &mut CompileContext::new())
}

/// Compile `condition` continuing the numbering of `ctx`. On failure `ctx`
/// is left untouched.
pub fn compile_with(
    condition: &Condition,
    schema: &SchemaNode,
    ctx: &mut CompileContext,
) -> Result<CompiledCondition> {
    let mut placeholders = Placeholders::new();
    let expression = compile_into(condition, schema, ctx, &mut placeholders)?;
    Ok(CompiledCondition {
        expression,
        placeholders,
    })
}

/// Compile `condition` into an existing table, so name tokens stay distinct
/// across every expression of one operation. On failure neither `ctx` nor
/// `placeholders` changes.
pub fn compile_into(
    condition: &Condition,
    schema: &SchemaNode,
    ctx: &mut CompileContext,
    placeholders: &mut Placeholders,
) -> Result<String> {
    let mut scratch = ctx.clone();
    let mut table = placeholders.clone();
    let expression = render(condition, schema, &mut scratch, &mut table)?;
    *ctx = scratch;
    *placeholders = table;

    debug!(
        expression = %expression,
        names = placeholders.names().len(),
        values = placeholders.values().len(),
        "compiled condition"
    );
    Ok(expression)
}

fn render(
    condition: &Condition,
    schema: &SchemaNode,
    ctx: &mut CompileContext,
    placeholders: &mut Placeholders,
) -> Result<String> {
    match condition {
        Condition::Logical { operator, children } => {
            if children.is_empty() {
                return Err(Error::condition(format!(
                    "'{operator}' needs at least one condition"
                )));
            }
            let parts = children
                .iter()
                .map(|child| render(child, schema, ctx, placeholders))
                .collect::<Result<Vec<_>>>()?;
            Ok(match operator {
                LogicalOperator::And | LogicalOperator::Or => {
                    format!("({})", parts.join(&format!(" {} ", operator.keyword())))
                }
                LogicalOperator::Not if parts.len() == 1 => format!("(NOT {})", parts[0]),
                LogicalOperator::Not => format!("(NOT ({}))", parts.join(" AND ")),
            })
        }
        Condition::NoValueComparison { path, operator } => {
            let index = ctx.next();
            path.resolve(schema)?;
            let name = bind_leaf_name(path, index, placeholders)?;
            match operator {
                Operator::AttributeExists | Operator::AttributeNotExists => {
                    Ok(format!("{operator}({name})"))
                }
                other => Err(Error::condition(format!("'{other}' needs a value"))),
            }
        }
        Condition::Comparison {
            path,
            operator,
            operand,
        } => {
            let index = ctx.next();
            let leaf = path.resolve(schema)?;
            let name = bind_leaf_name(path, index, placeholders)?;
            let mut leaf_ctx = Leaf {
                path,
                index,
                placeholders,
            };
            render_comparison(&mut leaf_ctx, &name, leaf, *operator, operand)
        }
    }
}

struct Leaf<'a> {
    path: &'a AttributePath,
    index: usize,
    placeholders: &'a mut Placeholders,
}

impl Leaf<'_> {
    fn bind(&mut self, suffix: Option<usize>, value: TypeDescriptor) -> Result<String> {
        let suffix = match suffix {
            Some(k) => format!("{}_v{k}", self.index),
            None => self.index.to_string(),
        };
        let token = value_placeholder(self.path, &suffix);
        self.placeholders.bind_value(token.clone(), value)?;
        Ok(token)
    }
}

fn render_comparison(
    leaf_ctx: &mut Leaf<'_>,
    name: &str,
    leaf: &SchemaNode,
    operator: Operator,
    operand: &Operand,
) -> Result<String> {
    match (operator, operand) {
        (op, Operand::Single(value)) if op.is_comparator() => {
            let token = leaf_ctx.bind(None, codec::encode(leaf, value)?)?;
            Ok(format!("{name} {op} {token}"))
        }
        (Operator::BeginsWith, Operand::Single(value)) => {
            let token = leaf_ctx.bind(None, codec::encode(leaf, value)?)?;
            Ok(format!("begins_with({name}, {token})"))
        }
        (Operator::Contains, Operand::Single(value)) => {
            let member;
            let target: &SchemaNode = match leaf.unwrap_key().kind() {
                NodeKind::List(element) => element,
                NodeKind::Set(kind) => {
                    member = SchemaNode::scalar(kind.member_kind());
                    &member
                }
                _ => leaf,
            };
            let token = leaf_ctx.bind(None, codec::encode(target, value)?)?;
            Ok(format!("contains({name}, {token})"))
        }
        (Operator::AttributeType, Operand::Single(value)) => {
            let tag = value
                .as_str()
                .filter(|t| DESCRIPTOR_TAGS.contains(t))
                .ok_or_else(|| {
                    Error::condition(format!("'{value}' is not an attribute type tag"))
                })?;
            let token = leaf_ctx.bind(None, TypeDescriptor::S(tag.to_owned()))?;
            Ok(format!("attribute_type({name}, {token})"))
        }
        (Operator::Between, Operand::Pair(low, high)) => {
            let low = leaf_ctx.bind(Some(0), codec::encode(leaf, low)?)?;
            let high = leaf_ctx.bind(Some(1), codec::encode(leaf, high)?)?;
            Ok(format!("{name} BETWEEN {low} AND {high}"))
        }
        (Operator::In, Operand::List(values)) => {
            if values.is_empty() {
                return Err(Error::condition("'in' needs at least one value"));
            }
            let tokens = values
                .iter()
                .enumerate()
                .map(|(k, value)| leaf_ctx.bind(Some(k), codec::encode(leaf, value)?))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("{name} IN ({})", tokens.join(", ")))
        }
        (Operator::Size, Operand::Size(comparator, value)) if comparator.is_comparator() => {
            let number = SchemaNode::scalar(ScalarKind::Number);
            let token = leaf_ctx.bind(None, codec::encode(&number, value)?)?;
            Ok(format!("size({name}) {comparator} {token}"))
        }
        (op, operand) => Err(Error::condition(format!(
            "'{op}' does not accept a {} operand",
            operand.describe()
        ))),
    }
}

/// Top-level names are suffixed with the occurrence index; nested paths keep
/// one stable token per segment.
fn bind_leaf_name(
    path: &AttributePath,
    index: usize,
    placeholders: &mut Placeholders,
) -> Result<String> {
    let suffix = if path.is_top_level() {
        index.to_string()
    } else {
        String::new()
    };
    placeholders.bind_path(path, &suffix)
}
