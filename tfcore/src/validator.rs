//! Stock attribute validators
//!
//! Validators run during [`Schema::validate`](crate::schema::Schema::validate)
//! on values that are present and known.

use crate::types::{Diagnostics, Value};

pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value, attribute_path: &str, diagnostics: &mut Diagnostics);
}

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for StringLengthValidator {
    fn validate(&self, value: &Value, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_str() {
            if let Some(min) = self.min {
                if s.len() < min {
                    diagnostics.add_error(
                        format!("{} must be at least {} characters", attribute_path, min),
                        Some(format!("Got length {}", s.len())),
                    );
                }
            }
            if let Some(max) = self.max {
                if s.len() > max {
                    diagnostics.add_error(
                        format!("{} must be at most {} characters", attribute_path, max),
                        Some(format!("Got length {}", s.len())),
                    );
                }
            }
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub description: String,
}

impl Validator for StringPatternValidator {
    fn validate(&self, value: &Value, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_str() {
            if !self.pattern.is_match(s) {
                diagnostics.add_error(
                    format!("{} must match {}", attribute_path, self.description),
                    Some(format!("Value '{}' does not match pattern", s)),
                );
            }
        }
    }
}

/// Restricts a string attribute to a fixed set of accepted values.
pub struct OneOfValidator {
    pub allowed: Vec<&'static str>,
}

impl Validator for OneOfValidator {
    fn validate(&self, value: &Value, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_str() {
            if !self.allowed.contains(&s) {
                diagnostics.add_error(
                    format!(
                        "{} must be one of [{}]",
                        attribute_path,
                        self.allowed.join(", ")
                    ),
                    Some(format!("Got '{}'", s)),
                );
            }
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRangeValidator {
    fn validate(&self, value: &Value, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    diagnostics.add_error(
                        format!("{} must be at least {}", attribute_path, min),
                        Some(format!("Got {}", n)),
                    );
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    diagnostics.add_error(
                        format!("{} must be at most {}", attribute_path, max),
                        Some(format!("Got {}", n)),
                    );
                }
            }
        }
    }
}

pub struct ListLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl Validator for ListLengthValidator {
    fn validate(&self, value: &Value, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Value::List(items) = value {
            if let Some(min) = self.min {
                if items.len() < min {
                    diagnostics.add_error(
                        format!("{} must have at least {} items", attribute_path, min),
                        Some(format!("Got {} items", items.len())),
                    );
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    diagnostics.add_error(
                        format!("{} must have at most {} items", attribute_path, max),
                        Some(format!("Got {} items", items.len())),
                    );
                }
            }
        }
    }
}
