//! `TypeDescriptor`: the tagged-union wire representation of one value.
//!
//! A descriptor is a single-key JSON object keyed by its storage type, e.g.
//! `{"S": "hello"}` or `{"M": {"age": {"N": "42"}}}`.

use std::fmt;

use base64::Engine;
use bytes::Bytes;
use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An encoded item: top-level attribute name to descriptor, in declaration order.
pub type Item = IndexMap<String, TypeDescriptor>;

/// All descriptor tags accepted on the wire.
pub const DESCRIPTOR_TAGS: &[&str] = &["S", "N", "B", "SS", "NS", "BS", "BOOL", "NULL", "L", "M"];

/// Wire-level attribute value.
///
/// Exactly one variant is present. Numbers are always string-encoded to
/// preserve precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// String value.
    S(String),
    /// Number value (decimal string).
    N(String),
    /// Binary value (base64-encoded in JSON).
    B(Bytes),
    /// String set.
    Ss(Vec<String>),
    /// Number set. Members are kept as decimal strings and travel as JSON numbers.
    Ns(Vec<String>),
    /// Binary set (base64-encoded in JSON).
    Bs(Vec<Bytes>),
    /// Boolean value.
    Bool(bool),
    /// Null marker.
    Null,
    /// Ordered list of descriptors.
    L(Vec<TypeDescriptor>),
    /// Map of descriptors. Insertion order is kept, equality ignores it.
    M(IndexMap<String, TypeDescriptor>),
}

impl TypeDescriptor {
    /// Returns the string value if this is an `S` variant.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number string if this is an `N` variant.
    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the map if this is an `M` variant.
    #[must_use]
    pub fn as_m(&self) -> Option<&IndexMap<String, TypeDescriptor>> {
        match self {
            Self::M(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the list if this is an `L` variant.
    #[must_use]
    pub fn as_l(&self) -> Option<&[TypeDescriptor]> {
        match self {
            Self::L(l) => Some(l),
            _ => None,
        }
    }

    /// Returns `true` if this is the `NULL` marker.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the wire tag of this descriptor (e.g. "S", "N", "BOOL").
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
            Self::Bool(_) => "BOOL",
            Self::Null => "NULL",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S(s) => write!(f, "{{S: {s}}}"),
            Self::N(n) => write!(f, "{{N: {n}}}"),
            Self::B(b) => write!(f, "{{B: {} bytes}}", b.len()),
            Self::Ss(v) => write!(f, "{{SS: {v:?}}}"),
            Self::Ns(v) => write!(f, "{{NS: {v:?}}}"),
            Self::Bs(v) => write!(f, "{{BS: {} items}}", v.len()),
            Self::Bool(b) => write!(f, "{{BOOL: {b}}}"),
            Self::Null => write!(f, "{{NULL: null}}"),
            Self::L(v) => write!(f, "{{L: {} items}}", v.len()),
            Self::M(m) => write!(f, "{{M: {} keys}}", m.len()),
        }
    }
}

fn encode_binary(b: &Bytes) -> String {
    base64::engine::general_purpose::STANDARD.encode(b)
}

/// A number set member as it may appear on the wire.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum NumberMember {
    Number(serde_json::Number),
    Text(String),
}

impl NumberMember {
    fn from_decimal(n: &str) -> Self {
        n.parse::<serde_json::Number>()
            .map_or_else(|_| Self::Text(n.to_owned()), Self::Number)
    }

    fn into_decimal(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::S(s) => map.serialize_entry("S", s)?,
            Self::N(n) => map.serialize_entry("N", n)?,
            Self::B(b) => map.serialize_entry("B", &encode_binary(b))?,
            Self::Ss(v) => map.serialize_entry("SS", v)?,
            Self::Ns(v) => {
                let members: Vec<NumberMember> =
                    v.iter().map(|n| NumberMember::from_decimal(n)).collect();
                map.serialize_entry("NS", &members)?;
            }
            Self::Bs(v) => {
                let encoded: Vec<String> = v.iter().map(encode_binary).collect();
                map.serialize_entry("BS", &encoded)?;
            }
            Self::Bool(b) => map.serialize_entry("BOOL", b)?,
            Self::Null => map.serialize_entry("NULL", &())?,
            Self::L(list) => map.serialize_entry("L", list)?,
            Self::M(m) => map.serialize_entry("M", m)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TypeDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TypeDescriptorVisitor)
    }
}

struct TypeDescriptorVisitor;

impl<'de> Visitor<'de> for TypeDescriptorVisitor {
    type Value = TypeDescriptor;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a type descriptor object with exactly one type key")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Err(de::Error::custom("type descriptor must have exactly one key"));
        };

        let value = match key.as_str() {
            "S" => TypeDescriptor::S(map.next_value()?),
            "N" => TypeDescriptor::N(map.next_value()?),
            "B" => {
                let encoded: String = map.next_value()?;
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(&encoded)
                    .map_err(de::Error::custom)?;
                TypeDescriptor::B(Bytes::from(decoded))
            }
            "SS" => TypeDescriptor::Ss(map.next_value()?),
            "NS" => {
                let members: Vec<NumberMember> = map.next_value()?;
                TypeDescriptor::Ns(members.into_iter().map(NumberMember::into_decimal).collect())
            }
            "BS" => {
                let encoded: Vec<String> = map.next_value()?;
                let decoded: Result<Vec<Bytes>, _> = encoded
                    .iter()
                    .map(|e| {
                        base64::engine::general_purpose::STANDARD
                            .decode(e)
                            .map(Bytes::from)
                    })
                    .collect();
                TypeDescriptor::Bs(decoded.map_err(de::Error::custom)?)
            }
            "BOOL" => TypeDescriptor::Bool(map.next_value()?),
            "NULL" => {
                let marker: Option<bool> = map.next_value()?;
                if marker == Some(false) {
                    return Err(de::Error::custom("NULL descriptor must be true"));
                }
                TypeDescriptor::Null
            }
            "L" => TypeDescriptor::L(map.next_value()?),
            "M" => TypeDescriptor::M(map.next_value()?),
            other => {
                return Err(de::Error::unknown_field(other, DESCRIPTOR_TAGS));
            }
        };

        if map.next_key::<String>()?.is_some() {
            return Err(de::Error::custom("type descriptor must have exactly one key"));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_serialize_string_descriptor() {
        let val = TypeDescriptor::S("hello".to_owned());
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"S":"hello"}"#);
    }

    #[test]
    fn test_should_serialize_number_descriptor() {
        let val = TypeDescriptor::N("42".to_owned());
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"N":"42"}"#);
    }

    #[test]
    fn test_should_serialize_null_as_json_null() {
        let json = serde_json::to_string(&TypeDescriptor::Null).unwrap();
        assert_eq!(json, r#"{"NULL":null}"#);
    }

    #[test]
    fn test_should_accept_null_marker_written_as_true() {
        let val: TypeDescriptor = serde_json::from_str(r#"{"NULL":true}"#).unwrap();
        assert!(val.is_null());
        let back: TypeDescriptor = serde_json::from_str(r#"{"NULL":null}"#).unwrap();
        assert!(back.is_null());
        assert!(serde_json::from_str::<TypeDescriptor>(r#"{"NULL":false}"#).is_err());
    }

    #[test]
    fn test_should_serialize_number_set_as_json_numbers() {
        let val = TypeDescriptor::Ns(vec!["1".to_owned(), "2.5".to_owned(), "-3".to_owned()]);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"NS":[1,2.5,-3]}"#);
        let back: TypeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, val);
    }

    #[test]
    fn test_should_accept_number_set_members_written_as_strings() {
        let val: TypeDescriptor = serde_json::from_str(r#"{"NS":["7",8]}"#).unwrap();
        assert_eq!(val, TypeDescriptor::Ns(vec!["7".to_owned(), "8".to_owned()]));
    }

    #[test]
    fn test_should_keep_map_declaration_order_on_the_wire() {
        let mut m = IndexMap::new();
        m.insert("field".to_owned(), TypeDescriptor::S("v".to_owned()));
        m.insert("num".to_owned(), TypeDescriptor::N("5".to_owned()));
        let json = serde_json::to_string(&TypeDescriptor::M(m)).unwrap();
        assert_eq!(json, r#"{"M":{"field":{"S":"v"},"num":{"N":"5"}}}"#);
    }

    #[test]
    fn test_should_serialize_nested_list() {
        let val = TypeDescriptor::L(vec![
            TypeDescriptor::S("a".to_owned()),
            TypeDescriptor::L(vec![TypeDescriptor::Bool(true)]),
        ]);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"L":[{"S":"a"},{"L":[{"BOOL":true}]}]}"#);
    }

    #[test]
    fn test_should_roundtrip_binary_set_through_base64() {
        let val = TypeDescriptor::Bs(vec![
            Bytes::from_static(b"one"),
            Bytes::from_static(b"\x00\xff"),
        ]);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"BS":["b25l","AP8="]}"#);
        let back: TypeDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, val);
    }

    #[test]
    fn test_should_reject_unknown_tag() {
        let err = serde_json::from_str::<TypeDescriptor>(r#"{"X":"1"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_should_reject_multiple_keys() {
        assert!(serde_json::from_str::<TypeDescriptor>(r#"{"S":"a","N":"1"}"#).is_err());
        assert!(serde_json::from_str::<TypeDescriptor>("{}").is_err());
    }

    #[test]
    fn test_should_compare_maps_regardless_of_order() {
        let mut a = IndexMap::new();
        a.insert("x".to_owned(), TypeDescriptor::Bool(true));
        a.insert("y".to_owned(), TypeDescriptor::Null);
        let mut b = IndexMap::new();
        b.insert("y".to_owned(), TypeDescriptor::Null);
        b.insert("x".to_owned(), TypeDescriptor::Bool(true));
        assert_eq!(TypeDescriptor::M(a), TypeDescriptor::M(b));
    }

    #[test]
    fn test_should_report_tags() {
        assert_eq!(TypeDescriptor::Ns(vec![]).tag(), "NS");
        assert_eq!(TypeDescriptor::Null.tag(), "NULL");
        assert_eq!(TypeDescriptor::Bool(false).tag(), "BOOL");
    }
}
