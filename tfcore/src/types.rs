//! Core value model for tfcore
//!
//! Configuration and state cross the host boundary as maps from attribute
//! name to [`Value`]. Adapters never pattern-match on values directly; the
//! typed accessors on [`AttributeMap`] perform path lookup and type checking
//! and turn mistakes into [`TfError`] instead of panics.

use crate::error::{Result, TfError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel used to round-trip [`Value::Unknown`] through wire encodings.
const UNKNOWN_SENTINEL: &str = "__unknown__";

/// A Terraform value. All numbers are f64 to match Terraform's type system.
/// `Unknown` represents a value not yet known during planning.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    Unknown,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Unknown => "unknown",
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(l) => l.serialize(serializer),
            Value::Map(m) => m.serialize(serializer),
            Value::Unknown => serializer.serialize_str(UNKNOWN_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a Terraform value")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Value::deserialize(deserializer)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
                Ok(Value::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
                Ok(Value::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
                Ok(Value::Number(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
                if v == UNKNOWN_SENTINEL {
                    Ok(Value::Unknown)
                } else {
                    Ok(Value::String(v.to_string()))
                }
            }

            fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
                if v == UNKNOWN_SENTINEL {
                    Ok(Value::Unknown)
                } else {
                    Ok(Value::String(v))
                }
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Value, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::List(items))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Value, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut values = HashMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Map(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// The attribute bag exchanged with the host: one per resource instance,
/// owned by the adapter only for the duration of a single callback.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeMap {
    pub values: HashMap<String, Value>,
}

/// Configuration values as written by the operator.
pub type Config = AttributeMap;

/// Resource state values as persisted by the host.
pub type State = AttributeMap;

impl AttributeMap {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// True when the attribute is absent, null or unknown.
    pub fn is_unset(&self, name: &str) -> bool {
        matches!(
            self.values.get(name),
            None | Some(Value::Null) | Some(Value::Unknown)
        )
    }

    fn mismatch(name: &str, expected: &'static str, value: &Value) -> TfError {
        TfError::TypeMismatch {
            attribute: name.to_string(),
            expected,
            actual: value.type_name(),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        match self.values.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) if !other.is_null() => Err(Self::mismatch(name, "string", other)),
            _ => Err(TfError::MissingAttribute(name.to_string())),
        }
    }

    pub fn optional_string(&self, name: &str) -> Result<Option<String>> {
        match self.values.get(name) {
            None | Some(Value::Null) | Some(Value::Unknown) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Self::mismatch(name, "string", other)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.values.get(name) {
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) if !other.is_null() => Err(Self::mismatch(name, "bool", other)),
            _ => Err(TfError::MissingAttribute(name.to_string())),
        }
    }

    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.values.get(name) {
            None | Some(Value::Null) | Some(Value::Unknown) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(Self::mismatch(name, "bool", other)),
        }
    }

    pub fn get_i64(&self, name: &str) -> Result<i64> {
        match self.values.get(name) {
            Some(Value::Number(n)) => Ok(*n as i64),
            Some(other) if !other.is_null() => Err(Self::mismatch(name, "number", other)),
            _ => Err(TfError::MissingAttribute(name.to_string())),
        }
    }

    pub fn optional_i64(&self, name: &str) -> Result<Option<i64>> {
        match self.values.get(name) {
            None | Some(Value::Null) | Some(Value::Unknown) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(*n as i64)),
            Some(other) => Err(Self::mismatch(name, "number", other)),
        }
    }

    pub fn get_list(&self, name: &str) -> Result<Vec<Value>> {
        match self.values.get(name) {
            Some(Value::List(l)) => Ok(l.clone()),
            Some(other) if !other.is_null() => Err(Self::mismatch(name, "list", other)),
            _ => Err(TfError::MissingAttribute(name.to_string())),
        }
    }

    pub fn optional_list(&self, name: &str) -> Result<Option<Vec<Value>>> {
        match self.values.get(name) {
            None | Some(Value::Null) | Some(Value::Unknown) => Ok(None),
            Some(Value::List(l)) => Ok(Some(l.clone())),
            Some(other) => Err(Self::mismatch(name, "list", other)),
        }
    }

    pub fn get_map(&self, name: &str) -> Result<HashMap<String, Value>> {
        match self.values.get(name) {
            Some(Value::Map(m)) => Ok(m.clone()),
            Some(other) if !other.is_null() => Err(Self::mismatch(name, "map", other)),
            _ => Err(TfError::MissingAttribute(name.to_string())),
        }
    }

    /// Read an optional map-of-strings attribute (tags and the like).
    pub fn optional_string_map(&self, name: &str) -> Result<Option<HashMap<String, String>>> {
        match self.values.get(name) {
            None | Some(Value::Null) | Some(Value::Unknown) => Ok(None),
            Some(Value::Map(m)) => {
                let mut out = HashMap::with_capacity(m.len());
                for (k, v) in m {
                    match v {
                        Value::String(s) => {
                            out.insert(k.clone(), s.clone());
                        }
                        other => return Err(Self::mismatch(name, "map of strings", other)),
                    }
                }
                Ok(Some(out))
            }
            Some(other) => Err(Self::mismatch(name, "map", other)),
        }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) {
        self.set(name, Value::String(value.into()));
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.set(name, Value::Bool(value));
    }

    pub fn set_i64(&mut self, name: &str, value: i64) {
        self.set(name, Value::Number(value as f64));
    }

    pub fn set_list(&mut self, name: &str, value: Vec<Value>) {
        self.set(name, Value::List(value));
    }

    pub fn set_string_map(&mut self, name: &str, value: &HashMap<String, String>) {
        let map = value
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.set(name, Value::Map(map));
    }

    /// The stable resource identifier assigned after creation.
    pub fn id(&self) -> Result<String> {
        self.get_string("id")
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.set_string("id", id);
    }

    /// Wire codecs - Terraform exchanges values as msgpack by default,
    /// with JSON as a fallback encoding.
    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        rmp_serde::encode::to_vec(&self.values)
            .map_err(|e| TfError::Encoding(format!("msgpack encoding failed: {}", e)))
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::new());
        }
        let values = rmp_serde::decode::from_slice(data)
            .map_err(|e| TfError::Decoding(format!("msgpack decoding failed: {}", e)))?;
        Ok(Self { values })
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.values)
            .map_err(|e| TfError::Encoding(format!("json encoding failed: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        let values = serde_json::from_slice(data)
            .map_err(|e| TfError::Decoding(format!("json decoding failed: {}", e)))?;
        Ok(Self { values })
    }
}

impl FromIterator<(String, Value)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A warning or error surfaced to the host.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub summary: String,
    pub detail: Option<String>,
    pub attribute: Option<String>,
}

/// Accumulated diagnostics from validation or provider configuration.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: Option<String>) {
        self.errors.push(Diagnostic {
            summary: summary.into(),
            detail,
            attribute: None,
        });
    }

    pub fn add_attribute_error(
        &mut self,
        attribute: impl Into<String>,
        summary: impl Into<String>,
        detail: Option<String>,
    ) {
        self.errors.push(Diagnostic {
            summary: summary.into(),
            detail,
            attribute: Some(attribute.into()),
        });
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: Option<String>) {
        self.warnings.push(Diagnostic {
            summary: summary.into(),
            detail,
            attribute: None,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Collapse error diagnostics into a single configuration error, for
    /// adapters that fail fast before issuing any remote call.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let summaries: Vec<&str> = self.errors.iter().map(|d| d.summary.as_str()).collect();
        Err(TfError::InvalidConfiguration(summaries.join("; ")))
    }
}
