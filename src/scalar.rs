//! Scalar coercion
//!
//! Models only need a black-box "coerce this raw value into the declared
//! type" capability. [`ScalarCoercion`] is that seam; [`StandardCoercion`]
//! covers the usual primitives and is what a registry uses unless told
//! otherwise.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Declared primitive type of a scalar attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    /// Any JSON value, kept verbatim
    Json,
}

impl ScalarKind {
    /// Get the declaration name of this kind
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Date => "date",
            ScalarKind::DateTime => "datetime",
            ScalarKind::Json => "json",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A coerced scalar
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Json(Value),
}

impl ScalarValue {
    /// The kind this value was coerced into
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Integer(_) => ScalarKind::Integer,
            ScalarValue::Float(_) => ScalarKind::Float,
            ScalarValue::Boolean(_) => ScalarKind::Boolean,
            ScalarValue::Date(_) => ScalarKind::Date,
            ScalarValue::DateTime(_) => ScalarKind::DateTime,
            ScalarValue::Json(_) => ScalarKind::Json,
        }
    }

    /// JSON representation used on serialization
    pub fn to_json(&self) -> Value {
        match self {
            ScalarValue::String(s) => Value::String(s.clone()),
            ScalarValue::Integer(i) => Value::from(*i),
            // NaN and infinities have no JSON form
            ScalarValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            ScalarValue::Boolean(b) => Value::Bool(*b),
            ScalarValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            ScalarValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            ScalarValue::Json(v) => v.clone(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<i64> for ScalarValue {
    fn from(i: i64) -> Self {
        ScalarValue::Integer(i)
    }
}

impl From<i32> for ScalarValue {
    fn from(i: i32) -> Self {
        ScalarValue::Integer(i64::from(i))
    }
}

impl From<f64> for ScalarValue {
    fn from(f: f64) -> Self {
        ScalarValue::Float(f)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Boolean(b)
    }
}

/// Scalar coercion failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScalarError {
    #[error("Scalar mismatch: cannot coerce {value} into {kind}")]
    Mismatch { kind: ScalarKind, value: Value },

    #[error("Unknown enum value: {value} is not one of [{}]", .allowed.join(", "))]
    UnknownEnumValue { value: Value, allowed: Vec<String> },
}

/// Label-to-backing-value table of an enum attribute
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMapping {
    kind: ScalarKind,
    variants: Vec<(String, ScalarValue)>,
}

impl EnumMapping {
    /// Create an empty mapping whose backing values are of `kind`
    pub fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            variants: Vec::new(),
        }
    }

    /// Add a variant
    pub fn variant(mut self, label: impl Into<String>, backing: impl Into<ScalarValue>) -> Self {
        self.variants.push((label.into(), backing.into()));
        self
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|(label, _)| label.as_str())
    }

    /// Look up a variant by its label
    pub fn by_label(&self, label: &str) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|(l, _)| l == label)
            .map(|(l, v)| EnumValue::new(l.clone(), v.clone()))
    }

    /// Look up a variant by its backing value
    pub fn by_value(&self, backing: &ScalarValue) -> Option<EnumValue> {
        self.variants
            .iter()
            .find(|(_, v)| v == backing)
            .map(|(l, v)| EnumValue::new(l.clone(), v.clone()))
    }

    /// Describe the first variant that cannot be told apart on cast, if any
    ///
    /// Labels are matched before backing values, so a string backing value
    /// equal to another variant's label would read back as that variant.
    pub fn ambiguity(&self) -> Option<String> {
        for (i, (label, backing)) in self.variants.iter().enumerate() {
            for (other_label, other_backing) in &self.variants[..i] {
                if label == other_label {
                    return Some(format!("label '{}' is declared more than once", label));
                }
                if backing == other_backing {
                    return Some(format!(
                        "'{}' and '{}' share the backing value {}",
                        other_label,
                        label,
                        backing.to_json()
                    ));
                }
            }
            if let ScalarValue::String(text) = backing {
                if let Some(shadow) = self.labels().find(|l| *l == text && *l != label) {
                    return Some(format!(
                        "backing value of '{}' equals the label '{}'",
                        label, shadow
                    ));
                }
            }
        }
        None
    }

    fn unknown(&self, raw: &Value) -> ScalarError {
        ScalarError::UnknownEnumValue {
            value: raw.clone(),
            allowed: self.labels().map(String::from).collect(),
        }
    }
}

/// A coerced enum value: the display label and the stored backing value
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    label: String,
    value: ScalarValue,
}

impl EnumValue {
    pub fn new(label: impl Into<String>, value: ScalarValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    /// The display form, emitted when enums serialize "as JSON"
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The stored backing value, emitted otherwise
    pub fn value(&self) -> &ScalarValue {
        &self.value
    }

    pub fn is(&self, label: &str) -> bool {
        self.label == label
    }
}

/// Coerces a single raw, non-null value into a declared type
///
/// JSON `null` never reaches an implementation; the cast engine maps it to a
/// null attribute before coercing.
pub trait ScalarCoercion: Send + Sync {
    /// Coerce `raw` into `kind`
    fn coerce(&self, kind: ScalarKind, raw: &Value) -> Result<ScalarValue, ScalarError>;

    /// Coerce `raw` into one of the variants of `mapping`
    ///
    /// A string matching a label wins; otherwise the value is coerced into the
    /// mapping's backing kind and matched against the backing values.
    fn coerce_enum(&self, mapping: &EnumMapping, raw: &Value) -> Result<EnumValue, ScalarError> {
        if let Value::String(label) = raw {
            if let Some(found) = mapping.by_label(label) {
                return Ok(found);
            }
        }
        let backing = self
            .coerce(mapping.kind(), raw)
            .map_err(|_| mapping.unknown(raw))?;
        mapping.by_value(&backing).ok_or_else(|| mapping.unknown(raw))
    }
}

/// Coercion rules for the built-in scalar kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCoercion;

impl ScalarCoercion for StandardCoercion {
    fn coerce(&self, kind: ScalarKind, raw: &Value) -> Result<ScalarValue, ScalarError> {
        let coerced = match kind {
            ScalarKind::String => match raw {
                Value::String(s) => Some(ScalarValue::String(s.clone())),
                Value::Number(n) => Some(ScalarValue::String(n.to_string())),
                Value::Bool(b) => Some(ScalarValue::String(b.to_string())),
                _ => None,
            },
            ScalarKind::Integer => coerce_integer(raw).map(ScalarValue::Integer),
            ScalarKind::Float => match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            // NaN and infinities cannot be emitted as JSON
            .filter(|f| f.is_finite())
            .map(ScalarValue::Float),
            ScalarKind::Boolean => coerce_boolean(raw).map(ScalarValue::Boolean),
            ScalarKind::Date => match raw {
                Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .ok()
                    .or_else(|| {
                        DateTime::parse_from_rfc3339(s.trim())
                            .ok()
                            .map(|dt| dt.with_timezone(&Utc).date_naive())
                    }),
                _ => None,
            }
            .map(ScalarValue::Date),
            ScalarKind::DateTime => match raw {
                Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc)),
                _ => None,
            }
            .map(ScalarValue::DateTime),
            ScalarKind::Json => Some(ScalarValue::Json(raw.clone())),
        };

        coerced.ok_or_else(|| ScalarError::Mismatch {
            kind,
            value: raw.clone(),
        })
    }
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    let truncate = |f: f64| {
        let t = f.trunc();
        (t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
    };
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

fn coerce_boolean(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "on" => Some(true),
            "false" | "f" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
