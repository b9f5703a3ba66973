//! Typed WAFv2 rule statements
//!
//! Rule statements form a recursive tree (logical combinators over match
//! conditions). The tree is modeled as a sum type with one bidirectional
//! serializer per variant between [`Statement`] and the nested attribute
//! representation, so configuration decoding and state flattening cannot
//! drift apart. Malformed nesting and unknown statement kinds are decode
//! errors, never panics.

use std::collections::HashMap;
use tfcore::types::Value;
use tfcore::{Result, TfError};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    And(Vec<Statement>),
    Or(Vec<Statement>),
    Not(Box<Statement>),
    ByteMatch(ByteMatch),
    GeoMatch(GeoMatch),
    IpSetReference(IpSetReference),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ByteMatch {
    pub search_string: String,
    pub positional_constraint: String,
    pub field_to_match: FieldToMatch,
    pub text_transformations: Vec<TextTransformation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldToMatch {
    UriPath,
    QueryString,
    Method,
    Body,
    SingleHeader { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextTransformation {
    pub priority: i64,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoMatch {
    pub country_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IpSetReference {
    pub arn: String,
}

const VARIANT_KEYS: &[&str] = &[
    "and_statement",
    "or_statement",
    "not_statement",
    "byte_match_statement",
    "geo_match_statement",
    "ip_set_reference_statement",
];

fn decode_err(msg: impl Into<String>) -> TfError {
    TfError::Decoding(msg.into())
}

fn map_of<'a>(value: &'a Value, what: &str) -> Result<&'a HashMap<String, Value>> {
    value
        .as_map()
        .ok_or_else(|| decode_err(format!("{} must be a block, got {}", what, value.type_name())))
}

fn string_field(map: &HashMap<String, Value>, block: &str, field: &str) -> Result<String> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(decode_err(format!(
            "{}.{} must be a string, got {}",
            block,
            field,
            other.type_name()
        ))),
        None => Err(decode_err(format!("{}.{} is required", block, field))),
    }
}

fn statement_list(map: &HashMap<String, Value>, block: &str) -> Result<Vec<Statement>> {
    let items = match map.get("statement") {
        Some(Value::List(items)) => items,
        Some(other) => {
            return Err(decode_err(format!(
                "{}.statement must be a list, got {}",
                block,
                other.type_name()
            )))
        }
        None => return Err(decode_err(format!("{}.statement is required", block))),
    };
    if items.is_empty() {
        return Err(decode_err(format!(
            "{} requires at least one nested statement",
            block
        )));
    }
    items.iter().map(Statement::from_value).collect()
}

impl Statement {
    /// Decode one statement block. Exactly one variant key must be set.
    pub fn from_value(value: &Value) -> Result<Statement> {
        let map = map_of(value, "statement")?;

        let mut present: Vec<&str> = VARIANT_KEYS
            .iter()
            .copied()
            .filter(|k| matches!(map.get(*k), Some(v) if !v.is_null()))
            .collect();
        for key in map.keys() {
            if !VARIANT_KEYS.contains(&key.as_str()) {
                return Err(decode_err(format!("unknown statement type '{}'", key)));
            }
        }
        let variant = match (present.pop(), present.pop()) {
            (Some(only), None) => only,
            (None, _) => {
                return Err(decode_err(
                    "statement must set exactly one statement type, got none",
                ))
            }
            (Some(_), Some(_)) => {
                return Err(decode_err(
                    "statement must set exactly one statement type, got several",
                ))
            }
        };
        let body = map_of(&map[variant], variant)?;

        match variant {
            "and_statement" => Ok(Statement::And(statement_list(body, variant)?)),
            "or_statement" => Ok(Statement::Or(statement_list(body, variant)?)),
            "not_statement" => {
                let inner = body.get("statement").ok_or_else(|| {
                    decode_err("not_statement.statement is required")
                })?;
                Ok(Statement::Not(Box::new(Statement::from_value(inner)?)))
            }
            "byte_match_statement" => Ok(Statement::ByteMatch(ByteMatch::from_map(body)?)),
            "geo_match_statement" => Ok(Statement::GeoMatch(GeoMatch::from_map(body)?)),
            "ip_set_reference_statement" => Ok(Statement::IpSetReference(IpSetReference {
                arn: string_field(body, variant, "arn")?,
            })),
            _ => unreachable!("variant filtered against VARIANT_KEYS"),
        }
    }

    /// Flatten back into the nested attribute representation. The inverse
    /// of [`Statement::from_value`].
    pub fn to_value(&self) -> Value {
        let (key, body) = match self {
            Statement::And(statements) => ("and_statement", nested_list(statements)),
            Statement::Or(statements) => ("or_statement", nested_list(statements)),
            Statement::Not(statement) => {
                let mut body = HashMap::new();
                body.insert("statement".to_string(), statement.to_value());
                ("not_statement", body)
            }
            Statement::ByteMatch(m) => ("byte_match_statement", m.to_map()),
            Statement::GeoMatch(m) => ("geo_match_statement", m.to_map()),
            Statement::IpSetReference(m) => {
                let mut body = HashMap::new();
                body.insert("arn".to_string(), Value::String(m.arn.clone()));
                ("ip_set_reference_statement", body)
            }
        };
        let mut outer = HashMap::new();
        outer.insert(key.to_string(), Value::Map(body));
        Value::Map(outer)
    }
}

fn nested_list(statements: &[Statement]) -> HashMap<String, Value> {
    let mut body = HashMap::new();
    body.insert(
        "statement".to_string(),
        Value::List(statements.iter().map(Statement::to_value).collect()),
    );
    body
}

impl ByteMatch {
    fn from_map(map: &HashMap<String, Value>) -> Result<ByteMatch> {
        let block = "byte_match_statement";
        let field_to_match = match map.get("field_to_match") {
            Some(v) => FieldToMatch::from_value(v)?,
            None => return Err(decode_err(format!("{}.field_to_match is required", block))),
        };
        let transformations = match map.get("text_transformation") {
            Some(Value::List(items)) => items
                .iter()
                .map(TextTransformation::from_value)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(decode_err(format!(
                    "{}.text_transformation must be a list, got {}",
                    block,
                    other.type_name()
                )))
            }
            None => Vec::new(),
        };
        Ok(ByteMatch {
            search_string: string_field(map, block, "search_string")?,
            positional_constraint: string_field(map, block, "positional_constraint")?,
            field_to_match,
            text_transformations: transformations,
        })
    }

    fn to_map(&self) -> HashMap<String, Value> {
        let mut body = HashMap::new();
        body.insert(
            "search_string".to_string(),
            Value::String(self.search_string.clone()),
        );
        body.insert(
            "positional_constraint".to_string(),
            Value::String(self.positional_constraint.clone()),
        );
        body.insert("field_to_match".to_string(), self.field_to_match.to_value());
        body.insert(
            "text_transformation".to_string(),
            Value::List(
                self.text_transformations
                    .iter()
                    .map(TextTransformation::to_value)
                    .collect(),
            ),
        );
        body
    }
}

impl FieldToMatch {
    fn from_value(value: &Value) -> Result<FieldToMatch> {
        let map = map_of(value, "field_to_match")?;
        let keys: Vec<&String> = map.keys().collect();
        let [key] = keys.as_slice() else {
            return Err(decode_err(
                "field_to_match must set exactly one match target",
            ));
        };
        match key.as_str() {
            "uri_path" => Ok(FieldToMatch::UriPath),
            "query_string" => Ok(FieldToMatch::QueryString),
            "method" => Ok(FieldToMatch::Method),
            "body" => Ok(FieldToMatch::Body),
            "single_header" => {
                let body = map_of(&map[key.as_str()], "single_header")?;
                Ok(FieldToMatch::SingleHeader {
                    name: string_field(body, "single_header", "name")?,
                })
            }
            other => Err(decode_err(format!("unknown field_to_match '{}'", other))),
        }
    }

    fn to_value(&self) -> Value {
        let mut outer = HashMap::new();
        match self {
            FieldToMatch::UriPath => {
                outer.insert("uri_path".to_string(), Value::Map(HashMap::new()));
            }
            FieldToMatch::QueryString => {
                outer.insert("query_string".to_string(), Value::Map(HashMap::new()));
            }
            FieldToMatch::Method => {
                outer.insert("method".to_string(), Value::Map(HashMap::new()));
            }
            FieldToMatch::Body => {
                outer.insert("body".to_string(), Value::Map(HashMap::new()));
            }
            FieldToMatch::SingleHeader { name } => {
                let mut body = HashMap::new();
                body.insert("name".to_string(), Value::String(name.clone()));
                outer.insert("single_header".to_string(), Value::Map(body));
            }
        }
        Value::Map(outer)
    }
}

impl TextTransformation {
    fn from_value(value: &Value) -> Result<TextTransformation> {
        let map = map_of(value, "text_transformation")?;
        let priority = match map.get("priority") {
            Some(Value::Number(n)) => *n as i64,
            Some(other) => {
                return Err(decode_err(format!(
                    "text_transformation.priority must be a number, got {}",
                    other.type_name()
                )))
            }
            None => return Err(decode_err("text_transformation.priority is required")),
        };
        Ok(TextTransformation {
            priority,
            kind: string_field(map, "text_transformation", "type")?,
        })
    }

    fn to_value(&self) -> Value {
        let mut body = HashMap::new();
        body.insert("priority".to_string(), Value::Number(self.priority as f64));
        body.insert("type".to_string(), Value::String(self.kind.clone()));
        Value::Map(body)
    }
}

impl GeoMatch {
    fn from_map(map: &HashMap<String, Value>) -> Result<GeoMatch> {
        let codes = match map.get("country_codes") {
            Some(Value::List(items)) => items
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        decode_err("geo_match_statement.country_codes must contain strings")
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(decode_err(format!(
                    "geo_match_statement.country_codes must be a list, got {}",
                    other.type_name()
                )))
            }
            None => {
                return Err(decode_err(
                    "geo_match_statement.country_codes is required",
                ))
            }
        };
        Ok(GeoMatch {
            country_codes: codes,
        })
    }

    fn to_map(&self) -> HashMap<String, Value> {
        let mut body = HashMap::new();
        body.insert(
            "country_codes".to_string(),
            Value::List(
                self.country_codes
                    .iter()
                    .map(|c| Value::String(c.clone()))
                    .collect(),
            ),
        );
        body
    }
}
