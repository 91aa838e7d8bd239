//! End-to-end tests for dynaql.
//!
//! Operations are compiled by `dynaql-core` and executed by [`MemoryRunner`],
//! a small in-process store that understands the expressions the compiler
//! emits for top-level attributes. Run them with:
//! ```text
//! cargo test -p dynaql-integration
//! ```

use std::collections::BTreeMap;
use std::sync::Once;

use anyhow::{Context, anyhow, bail};
use dynaql_core::schema::{
    TableSchema, date, list, map, number, partition_key, schema, sort_key, string, string_set,
};
use dynaql_core::{DecodeMode, DynaqlConfig, Runner, Table};
use dynaql_model::input::{QueryInput, UpdateItemInput};
use dynaql_model::{
    Item, NamePlaceholders, OperationDef, RawResponse, ReturnValues, TypeDescriptor,
    ValuePlaceholders,
};
use parking_lot::Mutex;
use tracing::debug;

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Single-table design shared by the tests: users and their orders, plus an
/// index keyed by email.
#[must_use]
pub fn shop_table(decode_mode: DecodeMode) -> Table {
    init_tracing();

    let users = schema()
        .field("pk", partition_key(string()))
        .field("sk", sort_key(string()))
        .field("name", string())
        .field("email", string())
        .field("visits", number())
        .field("joined", date())
        .field("roles", string_set().optional())
        .field(
            "address",
            map(
                schema()
                    .field("city", string())
                    .field("zip", string().optional()),
            )
            .optional(),
        )
        .field("history", list(string()).optional())
        .field("nickname", string().nullable().optional());
    let orders = schema()
        .field("pk", partition_key(string()))
        .field("sk", sort_key(string()))
        .field("total", number())
        .field("items", list(map(schema().field("sku", string()).field("qty", number()))));
    let by_email = TableSchema::builder().entity(
        "users",
        schema()
            .field("email", partition_key(string()))
            .field("pk", string())
            .field("sk", string())
            .field("name", string()),
    );

    let schema = TableSchema::builder()
        .entity("users", users)
        .entity("orders", orders)
        .index("by_email", by_email)
        .build()
        .unwrap_or_else(|e| panic!("invalid fixture schema: {e}"));
    Table::with_config(
        schema,
        DynaqlConfig {
            table_name: "shop".to_owned(),
            decode_mode,
        },
    )
}

/// In-memory store keyed by `pk` and `sk`.
///
/// Writes are applied unconditionally except for a `PutItem` guarded by a
/// condition on an item that already exists, which fails the way the store
/// rejects a conditional check. Queries select on the partition key only.
#[derive(Debug, Default)]
pub struct MemoryRunner {
    items: Mutex<BTreeMap<(String, String), Item>>,
    operations: Mutex<Vec<OperationDef>>,
}

impl MemoryRunner {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation received so far.
    pub fn operations(&self) -> Vec<OperationDef> {
        self.operations.lock().clone()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    fn execute(&self, operation: &OperationDef) -> anyhow::Result<RawResponse> {
        let mut items = self.items.lock();
        let response = match operation {
            OperationDef::PutItem(input) => {
                let key = storage_key(&input.item)?;
                if input.condition_expression.is_some() && items.contains_key(&key) {
                    bail!("conditional check failed");
                }
                let old = items.insert(key, input.item.clone());
                RawResponse {
                    attributes: old.filter(|_| input.return_values == Some(ReturnValues::AllOld)),
                    ..Default::default()
                }
            }
            OperationDef::GetItem(input) => RawResponse {
                item: items.get(&storage_key(&input.key)?).cloned(),
                ..Default::default()
            },
            OperationDef::DeleteItem(input) => {
                let old = items.remove(&storage_key(&input.key)?);
                RawResponse {
                    attributes: old.filter(|_| input.return_values == Some(ReturnValues::AllOld)),
                    ..Default::default()
                }
            }
            OperationDef::UpdateItem(input) => {
                let item = items
                    .entry(storage_key(&input.key)?)
                    .or_insert_with(|| input.key.clone());
                apply_update(item, input)?;
                RawResponse {
                    attributes: (input.return_values == Some(ReturnValues::AllNew))
                        .then(|| item.clone()),
                    ..Default::default()
                }
            }
            OperationDef::Query(input) => {
                let partition = partition_value(input)?;
                let mut matched: Vec<Item> = items
                    .values()
                    .filter(|item| item.get("pk") == Some(partition))
                    .cloned()
                    .collect();
                if input.scan_index_forward == Some(false) {
                    matched.reverse();
                }
                page(matched, input.limit)
            }
            OperationDef::Scan(input) => page(items.values().cloned().collect(), input.limit),
        };
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Runner for MemoryRunner {
    async fn run(&self, operation: &OperationDef) -> anyhow::Result<RawResponse> {
        debug!(operation = %operation.kind(), "memory runner received operation");
        self.operations.lock().push(operation.clone());
        self.execute(operation)
    }
}

/// Runner whose transport always fails.
#[derive(Debug, Default)]
pub struct UnreachableRunner;

#[async_trait::async_trait]
impl Runner for UnreachableRunner {
    async fn run(&self, operation: &OperationDef) -> anyhow::Result<RawResponse> {
        Err(anyhow!("connection refused while sending {}", operation.kind()))
    }
}

fn storage_key(item: &Item) -> anyhow::Result<(String, String)> {
    let part = |name: &str| -> anyhow::Result<String> {
        let value = item
            .get(name)
            .with_context(|| format!("key attribute '{name}' missing"))?;
        Ok(serde_json::to_string(value)?)
    };
    Ok((part("pk")?, part("sk")?))
}

fn page(items: Vec<Item>, limit: Option<u32>) -> RawResponse {
    let limit = limit.map_or(items.len(), |l| l as usize);
    let truncated = items.len() > limit;
    let items: Vec<Item> = items.into_iter().take(limit).collect();
    let last_evaluated_key = truncated.then(|| items.last().cloned()).flatten();
    RawResponse {
        count: u32::try_from(items.len()).ok(),
        items,
        last_evaluated_key,
        ..Default::default()
    }
}

/// Value compared with `pk` by `#token = :value` in the key condition.
fn partition_value(input: &QueryInput) -> anyhow::Result<&TypeDescriptor> {
    let expression = &input.key_condition_expression;
    input
        .expression_attribute_names
        .iter()
        .filter(|(_, name)| name.as_str() == "pk")
        .find_map(|(token, _)| {
            let rest = &expression[expression.find(&format!("{token} = "))? + token.len() + 3..];
            let end = rest.find([' ', ')']).unwrap_or(rest.len());
            input.expression_attribute_values.get(&rest[..end])
        })
        .context("key condition does not select a partition")
}

fn apply_update(item: &mut Item, input: &UpdateItemInput) -> anyhow::Result<()> {
    let names = &input.expression_attribute_names;
    let values = &input.expression_attribute_values;
    let expression = input.update_expression.as_str();

    let (set, remove) = match expression.split_once("REMOVE ") {
        Some((set, remove)) => (set, Some(remove)),
        None => (expression, None),
    };

    if let Some(set) = set.trim().strip_prefix("SET ") {
        for clause in split_clauses(set) {
            let (target, source) = clause
                .split_once(" = ")
                .with_context(|| format!("malformed SET clause '{clause}'"))?;
            let attribute = lookup_name(names, target)?;
            let value = evaluate(item, names, values, source)?;
            item.insert(attribute.to_owned(), value);
        }
    }

    for token in remove.into_iter().flat_map(|r| r.split(", ")) {
        let attribute = lookup_name(names, token.trim())?;
        item.shift_remove(attribute);
    }
    Ok(())
}

fn parse_number(descriptor: &TypeDescriptor) -> anyhow::Result<f64> {
    let n = descriptor
        .as_n()
        .with_context(|| format!("expected N, found {}", descriptor.tag()))?;
    Ok(n.parse()?)
}

fn evaluate(
    item: &Item,
    names: &NamePlaceholders,
    values: &ValuePlaceholders,
    source: &str,
) -> anyhow::Result<TypeDescriptor> {
    let value = |token: &str| {
        values
            .get(token)
            .cloned()
            .with_context(|| format!("unbound value '{token}'"))
    };
    if let Some(args) = source
        .strip_prefix("list_append(")
        .and_then(|s| s.strip_suffix(')'))
    {
        let (target, appended) = args.split_once(", ").context("malformed list_append")?;
        let mut list = match item.get(lookup_name(names, target)?) {
            Some(existing) => existing
                .as_l()
                .with_context(|| format!("list_append on {}", existing.tag()))?
                .to_vec(),
            None => Vec::new(),
        };
        let extra = value(appended)?;
        list.extend_from_slice(
            extra
                .as_l()
                .with_context(|| format!("list_append with {}", extra.tag()))?,
        );
        return Ok(TypeDescriptor::L(list));
    }

    for (symbol, sign) in [(" + ", 1.0), (" - ", -1.0)] {
        if let Some((target, amount)) = source.split_once(symbol) {
            let base = item
                .get(lookup_name(names, target)?)
                .context("arithmetic on a missing attribute")?;
            let base = parse_number(base).context("arithmetic on a non-number")?;
            let amount = parse_number(&value(amount)?).context("arithmetic with a non-number")?;
            return Ok(TypeDescriptor::N((base + sign * amount).to_string()));
        }
    }

    value(source)
}

fn lookup_name<'a>(names: &'a NamePlaceholders, token: &str) -> anyhow::Result<&'a str> {
    names
        .get(token)
        .map(String::as_str)
        .with_context(|| format!("unbound or nested name '{token}'"))
}

/// Split on `, ` outside parentheses.
fn split_clauses(text: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                clauses.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    clauses.push(text[start..].trim());
    clauses.retain(|c| !c.is_empty());
    clauses
}

mod test_errors;
mod test_put_get;
mod test_query_scan;
mod test_update;
