#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Canonical parameter handling for paygate
//!
//! Both signing schemes compute signatures over byte sequences derived from
//! parameter maps, so the client and the gateway must canonicalize maps
//! identically: merge in a fixed precedence, drop empty values, sort keys
//! ascending. Everything here is a pure function over immutable maps; the
//! `BTreeMap` representation makes sorted iteration the only iteration.

use paygate_errors::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;

mod xml;

pub use xml::{from_xml, to_xml};

/// Parameter map with JSON values, used for asymmetric-scheme option maps
pub type Params = BTreeMap<String, Value>;

/// Parameter map with string values, used for queries and the legacy scheme
pub type StringParams = BTreeMap<String, String>;

/// Merge maps in order; later maps override earlier ones on key collision.
///
/// Used to layer defaults < computed fields < caller overrides. The inputs
/// are never mutated.
#[must_use]
pub fn merge<V: Clone>(maps: &[&BTreeMap<String, V>]) -> BTreeMap<String, V> {
    let mut merged = BTreeMap::new();
    for map in maps {
        for (key, value) in *map {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Remove keys whose value is empty: the empty string, null, or a
/// zero-length collection.
///
/// Must run after merging and before signing. An empty-but-present key
/// would end up in the canonical string and fail gateway-side verification.
#[must_use]
pub fn filter_empty(params: &Params) -> Params {
    params
        .iter()
        .filter(|(_, value)| !is_empty_value(value))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// [`filter_empty`] for string-valued maps.
#[must_use]
pub fn filter_empty_strings(params: &StringParams) -> StringParams {
    params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Join parameters as `k=v` pairs with `&`, keys sorted ascending.
///
/// Values are not escaped: the gateway derives the identical string on its
/// side, so any transformation here would break signature verification.
#[must_use]
pub fn sorted_query_string(params: &StringParams) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Serialize an option map to its canonical JSON body.
///
/// Keys come out in ascending order, so the bytes signed here are exactly
/// the bytes transmitted.
///
/// # Errors
///
/// Returns an error if a value cannot be serialized.
pub fn json_body(params: &Params) -> Result<String> {
    serde_json::to_string(params).map_err(Error::from)
}

/// Coerce a JSON-valued map to string values for the legacy scheme.
///
/// # Errors
///
/// Returns an error if a value is a nested array or object; the legacy
/// scheme only signs flat scalar parameters.
pub fn to_string_params(params: &Params) -> Result<StringParams> {
    let mut out = StringParams::new();
    for (key, value) in params {
        let s = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => {
                return Err(Error::internal(format!(
                    "parameter {key} is not a scalar value"
                )));
            }
        };
        out.insert(key.clone(), s);
    }
    Ok(out)
}
