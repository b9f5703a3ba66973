//! Replacement planning
//!
//! Decides which lifecycle callback a configuration change maps to. The one
//! rule adapters rely on: a changed `force_new` attribute must produce a
//! replacement (destroy then create), never an in-place update.

use crate::schema::Schema;
use crate::types::{Config, State, Value};

/// The action the host should take for one resource instance.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedAction {
    Create,
    Update { changed: Vec<String> },
    Replace { forced_by: Vec<String> },
    Delete,
    NoOp,
}

/// Diff prior state against desired configuration under a schema.
///
/// Computed-only attributes never participate: they are populated from the
/// remote response and carry no operator intent. Optional+computed
/// attributes left unset in configuration keep their prior value. Absent
/// and null are equivalent on both sides.
pub fn plan(schema: &Schema, prior: Option<&State>, config: Option<&Config>) -> PlannedAction {
    let (prior, config) = match (prior, config) {
        (None, None) => return PlannedAction::NoOp,
        (None, Some(_)) => return PlannedAction::Create,
        (Some(_), None) => return PlannedAction::Delete,
        (Some(p), Some(c)) => (p, c),
    };

    let mut changed = Vec::new();
    let mut forced_by = Vec::new();

    for (name, attr) in &schema.attributes {
        if attr.is_computed_only() {
            continue;
        }
        let prior_value = normalized(prior.get(name));
        let mut config_value = normalized(config.get(name));
        // Optional+computed attributes default from the remote side, so an
        // unset config value inherits the prior value rather than diffing
        // against it.
        if attr.computed && matches!(config_value, &Value::Null) {
            config_value = prior_value;
        }
        let equal = match &attr.semantic_equals {
            Some(eq) => eq(prior_value, config_value),
            None => prior_value == config_value,
        };
        if !equal {
            if attr.force_new {
                forced_by.push(name.clone());
            } else {
                changed.push(name.clone());
            }
        }
    }

    changed.sort();
    forced_by.sort();

    if !forced_by.is_empty() {
        PlannedAction::Replace { forced_by }
    } else if !changed.is_empty() {
        PlannedAction::Update { changed }
    } else {
        PlannedAction::NoOp
    }
}

fn normalized(value: Option<&Value>) -> &Value {
    match value {
        None | Some(Value::Null) => &Value::Null,
        Some(v) => v,
    }
}
