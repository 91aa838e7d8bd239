//! Type-descriptor codec.
//!
//! Encoding walks a [`Value`] alongside its [`SchemaNode`] and produces the
//! store's [`TypeDescriptor`] form; decoding walks a descriptor back into a
//! value. Decoding is partial: a map only receives the keys the descriptor
//! actually carries, nothing is synthesized.

use chrono::{DateTime, SecondsFormat, Utc};
use dynaql_model::{Item, ScalarKind, SetKind, TypeDescriptor, Value};
use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::config::DecodeMode;
use crate::error::{Error, Result};
use crate::schema::{NodeKind, SchemaNode};

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a present value against `node`.
pub fn encode(node: &SchemaNode, value: &Value) -> Result<TypeDescriptor> {
    encode_value(node, value, "")
}

/// Encode a possibly absent value. An absent optional value encodes to
/// `None`; an absent required value is an error.
pub fn encode_optional(node: &SchemaNode, value: Option<&Value>) -> Result<Option<TypeDescriptor>> {
    match value {
        Some(value) => encode_value(node, value, "").map(Some),
        None if node.is_optional() => Ok(None),
        None => Err(Error::ValueNotOptional {
            path: String::new(),
        }),
    }
}

/// Encode a top-level map into an item: the `M` payload without its wrapper.
pub fn encode_item(node: &SchemaNode, value: &Value) -> Result<Item> {
    match encode(node, value)? {
        TypeDescriptor::M(item) => Ok(item),
        other => Err(Error::shape("", "M", other.tag())),
    }
}

fn encode_value(node: &SchemaNode, value: &Value, path: &str) -> Result<TypeDescriptor> {
    trace!(path, expected = %node, found = value.kind_name(), "encoding value");

    if value.is_null() {
        return if node.is_nullable() {
            Ok(TypeDescriptor::Null)
        } else {
            Err(Error::ValueNotNullable {
                path: path.to_owned(),
            })
        };
    }

    match node.kind() {
        NodeKind::Scalar(kind) => encode_scalar(*kind, value, path),
        NodeKind::Set(kind) => encode_set(*kind, value, path),
        NodeKind::Map(children) => {
            let Value::Map(entries) = value else {
                return Err(Error::shape(path, node, value.kind_name()));
            };
            let mut encoded = IndexMap::with_capacity(children.len());
            for (name, child) in children {
                let child_path = join(path, name);
                match entries.get(name) {
                    Some(v) => {
                        encoded.insert(name.clone(), encode_value(child, v, &child_path)?);
                    }
                    None if child.is_optional() => {}
                    None => return Err(Error::ValueNotOptional { path: child_path }),
                }
            }
            Ok(TypeDescriptor::M(encoded))
        }
        NodeKind::List(element) => {
            let Value::List(items) = value else {
                return Err(Error::shape(path, node, value.kind_name()));
            };
            items
                .iter()
                .enumerate()
                .map(|(i, item)| encode_value(element, item, &join_index(path, i)))
                .collect::<Result<Vec<_>>>()
                .map(TypeDescriptor::L)
        }
        NodeKind::PartitionKey(inner) | NodeKind::SortKey(inner) => {
            encode_value(inner, value, path)
        }
    }
}

fn encode_scalar(kind: ScalarKind, value: &Value, path: &str) -> Result<TypeDescriptor> {
    match (kind, value) {
        (ScalarKind::String, Value::String(s)) => Ok(TypeDescriptor::S(s.clone())),
        (ScalarKind::Number, Value::Number(n)) => format_number(*n, path).map(TypeDescriptor::N),
        (ScalarKind::Boolean, Value::Bool(b)) => Ok(TypeDescriptor::Bool(*b)),
        (ScalarKind::Date, Value::Date(d)) => Ok(TypeDescriptor::S(format_date(d))),
        (ScalarKind::Date, Value::String(s)) => {
            parse_date(s, path).map(|d| TypeDescriptor::S(format_date(&d)))
        }
        (ScalarKind::Binary, Value::Binary(b)) => Ok(TypeDescriptor::B(b.clone())),
        _ => Err(Error::shape(path, kind, value.kind_name())),
    }
}

fn encode_set(kind: SetKind, value: &Value, path: &str) -> Result<TypeDescriptor> {
    let Value::List(items) = value else {
        return Err(Error::shape(path, kind, value.kind_name()));
    };
    let member = kind.member_kind();
    let mismatch = |i: usize, item: &Value| Error::shape(&join_index(path, i), member, item.kind_name());

    let members = items.iter().enumerate();
    match kind {
        SetKind::String => members
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(mismatch(i, other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(TypeDescriptor::Ss),
        SetKind::Number => members
            .map(|(i, item)| match item {
                Value::Number(n) => format_number(*n, &join_index(path, i)),
                other => Err(mismatch(i, other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(TypeDescriptor::Ns),
        SetKind::Binary => members
            .map(|(i, item)| match item {
                Value::Binary(b) => Ok(b.clone()),
                other => Err(mismatch(i, other)),
            })
            .collect::<Result<Vec<_>>>()
            .map(TypeDescriptor::Bs),
    }
}

fn format_number(n: f64, path: &str) -> Result<String> {
    if n.is_finite() {
        Ok(n.to_string())
    } else {
        Err(Error::shape(path, "finite number", n))
    }
}

fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_date(s: &str, path: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| Error::InvalidDate {
            path: path.to_owned(),
            value: s.to_owned(),
        })
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a descriptor against `node`, rejecting undeclared attributes.
pub fn decode(node: &SchemaNode, descriptor: &TypeDescriptor) -> Result<Value> {
    decode_value(node, descriptor, "", DecodeMode::Strict)
}

/// Decode a descriptor against `node` with an explicit [`DecodeMode`].
pub fn decode_with_mode(
    node: &SchemaNode,
    descriptor: &TypeDescriptor,
    mode: DecodeMode,
) -> Result<Value> {
    decode_value(node, descriptor, "", mode)
}

/// Decode a top-level item (an unwrapped `M` payload) into a map value.
pub fn decode_item(node: &SchemaNode, item: &Item, mode: DecodeMode) -> Result<Value> {
    let Some(children) = node.children() else {
        return Err(Error::shape("", node, "M"));
    };
    decode_fields(children, item, "", mode).map(Value::Map)
}

fn decode_value(
    node: &SchemaNode,
    descriptor: &TypeDescriptor,
    path: &str,
    mode: DecodeMode,
) -> Result<Value> {
    trace!(path, expected = %node, found = descriptor.tag(), "decoding descriptor");

    if descriptor.is_null() {
        return Ok(Value::Null);
    }

    match node.kind() {
        NodeKind::Scalar(kind) => decode_scalar(*kind, descriptor, path),
        NodeKind::Set(kind) => decode_set(*kind, descriptor, path),
        NodeKind::Map(children) => {
            let TypeDescriptor::M(entries) = descriptor else {
                return Err(Error::shape(path, "M", descriptor.tag()));
            };
            decode_fields(children, entries, path, mode).map(Value::Map)
        }
        NodeKind::List(element) => {
            let TypeDescriptor::L(items) = descriptor else {
                return Err(Error::shape(path, "L", descriptor.tag()));
            };
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_value(element, item, &join_index(path, i), mode))
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        }
        NodeKind::PartitionKey(inner) | NodeKind::SortKey(inner) => {
            decode_value(inner, descriptor, path, mode)
        }
    }
}

fn decode_fields(
    children: &IndexMap<String, SchemaNode>,
    entries: &IndexMap<String, TypeDescriptor>,
    path: &str,
    mode: DecodeMode,
) -> Result<IndexMap<String, Value>> {
    for key in entries.keys().filter(|k| !children.contains_key(k.as_str())) {
        let key_path = join(path, key);
        match mode {
            DecodeMode::Strict => return Err(Error::PathNotFound { path: key_path }),
            DecodeMode::Lenient => {
                warn!(path = %key_path, "skipping attribute not declared in schema");
            }
        }
    }

    let mut decoded = IndexMap::with_capacity(entries.len());
    for (name, child) in children {
        if let Some(descriptor) = entries.get(name) {
            let value = decode_value(child, descriptor, &join(path, name), mode)?;
            decoded.insert(name.clone(), value);
        }
    }
    Ok(decoded)
}

fn decode_scalar(kind: ScalarKind, descriptor: &TypeDescriptor, path: &str) -> Result<Value> {
    match (kind, descriptor) {
        (ScalarKind::String, TypeDescriptor::S(s)) => Ok(Value::String(s.clone())),
        (ScalarKind::Number, TypeDescriptor::N(n)) => parse_number(n, path).map(Value::Number),
        (ScalarKind::Boolean, TypeDescriptor::Bool(b)) => Ok(Value::Bool(*b)),
        (ScalarKind::Date, TypeDescriptor::S(s)) => parse_date(s, path).map(Value::Date),
        (ScalarKind::Binary, TypeDescriptor::B(b)) => Ok(Value::Binary(b.clone())),
        _ => Err(Error::shape(path, kind.descriptor_tag(), descriptor.tag())),
    }
}

fn decode_set(kind: SetKind, descriptor: &TypeDescriptor, path: &str) -> Result<Value> {
    match (kind, descriptor) {
        (SetKind::String, TypeDescriptor::Ss(members)) => Ok(Value::List(
            members.iter().cloned().map(Value::String).collect(),
        )),
        (SetKind::Number, TypeDescriptor::Ns(members)) => members
            .iter()
            .enumerate()
            .map(|(i, n)| parse_number(n, &join_index(path, i)).map(Value::Number))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (SetKind::Binary, TypeDescriptor::Bs(members)) => Ok(Value::List(
            members.iter().cloned().map(Value::Binary).collect(),
        )),
        _ => Err(Error::shape(path, kind.descriptor_tag(), descriptor.tag())),
    }
}

fn parse_number(n: &str, path: &str) -> Result<f64> {
    n.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidNumber {
            path: path.to_owned(),
            value: n.to_owned(),
        })
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_owned()
    } else {
        format!("{path}.{name}")
    }
}

fn join_index(path: &str, index: usize) -> String {
    join(path, &index.to_string())
}
