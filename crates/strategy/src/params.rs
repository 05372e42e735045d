use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Untyped strategy option value as it arrives from a config file or test harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Case-sensitive map of option name to value.
///
/// Lookups never fail: a missing key yields the caller's default, and a value
/// of the wrong shape yields the default with a warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: HashMap<String, ParamValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy in tests and hand-built configs.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get_f64_or(&self, key: &str, default: f64) -> f64 {
        let parsed = match self.values.get(key) {
            None => return default,
            Some(ParamValue::Float(v)) => Some(*v),
            Some(ParamValue::Int(v)) => Some(*v as f64),
            Some(ParamValue::Str(s)) => s.trim().parse::<f64>().ok(),
            Some(ParamValue::Bool(_)) => None,
        };
        match parsed.filter(|v| v.is_finite()) {
            Some(v) => v,
            None => fallback(key, default),
        }
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        let parsed = match self.values.get(key) {
            None => return default,
            Some(ParamValue::Int(v)) => Some(*v),
            Some(ParamValue::Float(v)) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            Some(ParamValue::Str(s)) => s.trim().parse::<i64>().ok(),
            Some(_) => None,
        };
        parsed.unwrap_or_else(|| fallback(key, default))
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        let parsed = match self.values.get(key) {
            None => return default,
            Some(ParamValue::Bool(v)) => Some(*v),
            Some(ParamValue::Str(s)) => s.trim().parse::<bool>().ok(),
            Some(_) => None,
        };
        parsed.unwrap_or_else(|| fallback(key, default))
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.values.get(key) {
            None => default,
            Some(ParamValue::Str(s)) => s.as_str(),
            Some(_) => fallback(key, default),
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

fn fallback<T: std::fmt::Debug>(key: &str, default: T) -> T {
    warn!(key, ?default, "Malformed strategy parameter, using default");
    default
}
