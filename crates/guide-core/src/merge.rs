#![forbid(unsafe_code)]

//! Fill-if-missing defaults merge over plain configuration values.
//!
//! [`fill_defaults`] walks every key of `defaults`. A key is copied into the
//! target when the predicate says the target's value is missing; when both
//! sides hold objects the merge recurses. Everything else in the target is
//! left untouched, including keys the defaults do not mention.

use serde_json::{Map, Value};

/// Default "missing" predicate: the key is absent or `null`.
#[must_use]
pub fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Stricter predicate: absent, `null`, or an empty string/array/object.
#[must_use]
pub fn is_absent_or_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

/// Merge `defaults` into a copy of `target`.
///
/// Non-object targets are returned unchanged; the merge only descends into
/// object/object pairs.
#[must_use]
pub fn fill_defaults<F>(target: &Value, defaults: &Value, is_missing: F) -> Value
where
    F: Fn(Option<&Value>) -> bool + Copy,
{
    let (Value::Object(target), Value::Object(defaults)) = (target, defaults) else {
        return target.clone();
    };
    Value::Object(fill_map(target, defaults, is_missing))
}

fn fill_map<F>(
    target: &Map<String, Value>,
    defaults: &Map<String, Value>,
    is_missing: F,
) -> Map<String, Value>
where
    F: Fn(Option<&Value>) -> bool + Copy,
{
    let mut out = target.clone();
    for (key, default) in defaults {
        let current = out.get(key);
        if is_missing(current) {
            out.insert(key.clone(), default.clone());
            continue;
        }
        if let (Some(Value::Object(inner)), Value::Object(default_inner)) = (current, default) {
            let merged = fill_map(inner, default_inner, is_missing);
            out.insert(key.clone(), Value::Object(merged));
        }
    }
    out
}

/// Typed counterpart of [`fill_defaults`] for partially specified structs.
pub trait FillDefaults {
    /// Complete type produced once every field is known.
    type Output;

    /// Fill every missing field from `defaults`.
    fn fill(self, defaults: &Self::Output) -> Self::Output;
}
