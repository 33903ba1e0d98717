use serde_json::Value;

use crate::models::{ActionRequest, Interrupt, InterruptConfig};

/// Outcome of inspecting one task payload: either the structured decision
/// schema, or the untouched payload for the raw fallback view.
#[derive(Clone, Debug, PartialEq)]
pub enum Classified {
    Structured(Vec<Interrupt>),
    Raw(Value),
}

impl Classified {
    pub fn is_structured(&self) -> bool {
        matches!(self, Classified::Structured(_))
    }

    pub fn interrupts(&self) -> &[Interrupt] {
        match self {
            Classified::Structured(interrupts) => interrupts,
            Classified::Raw(_) => &[],
        }
    }
}

/// Total classification: any payload yields a result, and a payload that does
/// not qualify comes back unchanged as `Raw`.
///
/// Shape rules, checked but never enforced deeper than this: a sequence
/// qualifies iff it is non-empty and its first element qualifies on its own;
/// anything else qualifies iff it is an object holding an `action_request`
/// object with an `action` key plus a `config` object. Flag values are not
/// inspected here; anything missing or mistyped reads as false downstream.
pub fn classify(payload: Value) -> Classified {
    match &payload {
        Value::Array(items) => {
            if items.first().map(qualifies).unwrap_or(false) {
                Classified::Structured(items.iter().map(convert_interrupt).collect())
            } else {
                Classified::Raw(payload)
            }
        }
        other => {
            if qualifies(other) {
                let interrupt = convert_interrupt(other);
                Classified::Structured(vec![interrupt])
            } else {
                Classified::Raw(payload)
            }
        }
    }
}

fn qualifies(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let Some(action_request) = obj.get("action_request").and_then(Value::as_object) else {
        return false;
    };
    action_request.contains_key("action")
        && obj.get("config").map(Value::is_object).unwrap_or(false)
}

/// Field-by-field coercion. Non-string actions and arg values are
/// stringified, mistyped flags read as false, so a qualifying element always
/// converts. A non-qualifying element inside an already-qualified sequence
/// converts to an inert interrupt (empty action, no capabilities).
fn convert_interrupt(value: &Value) -> Interrupt {
    let action_request = value.get("action_request").and_then(Value::as_object);

    let action = action_request
        .and_then(|ar| ar.get("action"))
        .map(coerce_string)
        .unwrap_or_default();

    let args = action_request
        .and_then(|ar| ar.get("args"))
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(key, val)| (key.clone(), coerce_string(val)))
                .collect()
        })
        .unwrap_or_default();

    let config_obj = value.get("config").and_then(Value::as_object);
    let flag = |name: &str| {
        config_obj
            .and_then(|config| config.get(name))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    };

    Interrupt {
        action_request: ActionRequest { action, args },
        config: InterruptConfig {
            allow_ignore: flag("allow_ignore"),
            allow_respond: flag("allow_respond"),
            allow_edit: flag("allow_edit"),
            allow_accept: flag("allow_accept"),
        },
        description: value
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
