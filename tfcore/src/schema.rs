//! Attribute schemas for resources and data sources
//!
//! A schema declares the attribute names, types, mutability flags and
//! validation for one resource or data source type. Declaring a schema is
//! pure: no side effects, no I/O. The schema doubles as the fail-fast
//! configuration check run before any remote call is issued.

use crate::types::{Config, Diagnostics, Value};
use crate::validator::Validator;
use std::collections::HashMap;
use std::sync::Arc;

/// The Terraform attribute type system.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    /// Always f64, matching Terraform.
    Number,
    Bool,
    /// Ordered, allows duplicates.
    List(Box<AttributeType>),
    /// Unordered, no duplicates.
    Set(Box<AttributeType>),
    /// String keys only.
    Map(Box<AttributeType>),
    /// Fixed structure.
    Object(HashMap<String, AttributeType>),
    /// Any shape; skipped by type checking. Used for recursive structures
    /// such as WAFv2 statement trees, which are validated by their decoder.
    Dynamic,
}

impl AttributeType {
    fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Bool => "bool",
            AttributeType::List(_) => "list",
            AttributeType::Set(_) => "set",
            AttributeType::Map(_) => "map",
            AttributeType::Object(_) => "object",
            AttributeType::Dynamic => "dynamic",
        }
    }

    /// Structural check of a concrete value against this type. Null and
    /// unknown values are accepted everywhere; requiredness is a separate
    /// concern.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (_, Value::Unknown) => true,
            (AttributeType::Dynamic, _) => true,
            (AttributeType::String, Value::String(_)) => true,
            (AttributeType::Number, Value::Number(_)) => true,
            (AttributeType::Bool, Value::Bool(_)) => true,
            (AttributeType::List(elem), Value::List(items))
            | (AttributeType::Set(elem), Value::List(items)) => {
                items.iter().all(|item| elem.accepts(item))
            }
            (AttributeType::Map(elem), Value::Map(entries)) => {
                entries.values().all(|item| elem.accepts(item))
            }
            (AttributeType::Object(fields), Value::Map(entries)) => entries
                .iter()
                .all(|(k, v)| fields.get(k).map(|ty| ty.accepts(v)).unwrap_or(false)),
            _ => false,
        }
    }
}

/// A single declared attribute.
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing this attribute forces destroy-then-create instead of Update.
    pub force_new: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    /// Overrides structural equality when diffing, for attributes whose
    /// textual form is not canonical (JSON policy documents).
    pub semantic_equals: Option<SemanticEquality>,
}

/// Equality predicate applied during planning instead of `==`.
pub type SemanticEquality = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("force_new", &self.force_new)
            .field("validators", &self.validators.len())
            .field("semantic_equals", &self.semantic_equals.is_some())
            .finish()
    }
}

impl Attribute {
    /// True for attributes only ever populated from the remote response.
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }
}

/// Schema for one resource or data source type.
#[derive(Debug, Clone)]
pub struct Schema {
    pub version: i64,
    pub attributes: HashMap<String, Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Fail-fast configuration validation, run before any remote call:
    /// required attributes present, computed-only attributes not supplied,
    /// declared types matched, unknown names rejected, validators applied.
    pub fn validate(&self, config: &Config) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for (name, attr) in &self.attributes {
            let value = config.get(name);
            let unset = config.is_unset(name);

            if attr.required && unset {
                diags.add_attribute_error(name, format!("{} is required", name), None);
                continue;
            }
            if attr.is_computed_only() && !unset {
                diags.add_attribute_error(
                    name,
                    format!("{} is computed and cannot be set in configuration", name),
                    None,
                );
                continue;
            }

            let Some(value) = value else { continue };
            if !attr.r#type.accepts(value) {
                diags.add_attribute_error(
                    name,
                    format!(
                        "{} must be of type {}, got {}",
                        name,
                        attr.r#type.name(),
                        value.type_name()
                    ),
                    None,
                );
                continue;
            }
            if !value.is_null() && !value.is_unknown() {
                for validator in &attr.validators {
                    validator.validate(value, name, &mut diags);
                }
            }
        }

        for name in config.values.keys() {
            if !self.attributes.contains_key(name) {
                diags.add_attribute_error(
                    name,
                    format!("unexpected attribute {}", name),
                    None,
                );
            }
        }

        diags
    }
}

/// Fluent builder for attributes. Use this instead of constructing
/// `Attribute` directly.
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    fn new(name: &str, r#type: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                force_new: false,
                validators: Vec::new(),
                semantic_equals: None,
            },
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, AttributeType::Number)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn list(name: &str, elem: AttributeType) -> Self {
        Self::new(name, AttributeType::List(Box::new(elem)))
    }

    pub fn set(name: &str, elem: AttributeType) -> Self {
        Self::new(name, AttributeType::Set(Box::new(elem)))
    }

    pub fn map(name: &str, elem: AttributeType) -> Self {
        Self::new(name, AttributeType::Map(Box::new(elem)))
    }

    pub fn object(name: &str, fields: HashMap<String, AttributeType>) -> Self {
        Self::new(name, AttributeType::Object(fields))
    }

    pub fn dynamic(name: &str) -> Self {
        Self::new(name, AttributeType::Dynamic)
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.attribute.force_new = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn semantic_equals(
        mut self,
        eq: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.attribute.semantic_equals = Some(Arc::new(eq));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// Fluent builder for schemas.
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                attributes: HashMap::new(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, builder: AttributeBuilder) -> Self {
        let attr = builder.build();
        self.schema.attributes.insert(attr.name.clone(), attr);
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
