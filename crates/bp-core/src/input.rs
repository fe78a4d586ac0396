//! Planning inputs: parsing from files or `key=value` pairs, and per-field
//! numeric coercion.
//!
//! A planning input is a flat JSON object. Values arrive as strings (form
//! submissions) or numbers (JSON clients). The raw object is kept as-is for
//! echoing back in results; coercion happens per schema field at predict time.

use bp_common::{Error, Result};
use bp_config::{Coercion, FeatureSchema};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Raw planning inputs in submission order.
pub type PlanningInputs = Map<String, Value>;

/// A planning-input value that cannot become a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("{key}: expected an integer, got '{value}'")]
    NotInteger { key: String, value: String },

    #[error("{key}: expected a number, got '{value}'")]
    NotNumber { key: String, value: String },

    #[error("{key}: cannot convert {value} to an integer")]
    NonFinite { key: String, value: f64 },

    #[error("{key}: unsupported value type {kind}")]
    UnsupportedType { key: String, kind: &'static str },
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Coerce one raw value according to `coercion`.
///
/// Integer coercion truncates JSON floats toward zero and accepts strings of
/// an optional sign followed by ASCII digits only.
pub fn coerce_value(
    key: &str,
    value: &Value,
    coercion: Coercion,
) -> std::result::Result<f64, CoercionError> {
    match (value, coercion) {
        (Value::Bool(b), _) => Ok(if *b { 1.0 } else { 0.0 }),
        (Value::Number(n), Coercion::Integer) => {
            if let Some(i) = n.as_i64() {
                return Ok(i as f64);
            }
            if let Some(u) = n.as_u64() {
                return Ok(u as f64);
            }
            let f = n.as_f64().unwrap_or(f64::NAN);
            if !f.is_finite() {
                return Err(CoercionError::NonFinite {
                    key: key.to_string(),
                    value: f,
                });
            }
            Ok(f.trunc())
        }
        (Value::Number(n), Coercion::Float) => n.as_f64().ok_or_else(|| CoercionError::NotNumber {
            key: key.to_string(),
            value: n.to_string(),
        }),
        (Value::String(s), Coercion::Integer) => parse_integer(s).ok_or_else(|| CoercionError::NotInteger {
            key: key.to_string(),
            value: s.clone(),
        }),
        (Value::String(s), Coercion::Float) => parse_float(s).ok_or_else(|| CoercionError::NotNumber {
            key: key.to_string(),
            value: s.clone(),
        }),
        (other, _) => Err(CoercionError::UnsupportedType {
            key: key.to_string(),
            kind: kind_name(other),
        }),
    }
}

/// Parse `[+-]?[0-9]+` after trimming; magnitude is unbounded.
fn parse_integer(s: &str) -> Option<f64> {
    let cleaned = strip_digit_separators(s.trim())?;
    let t: &str = &cleaned;
    let digits = t.strip_prefix(['+', '-']).unwrap_or(t);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    t.parse::<f64>().ok()
}

fn parse_float(s: &str) -> Option<f64> {
    strip_digit_separators(s.trim())?.parse::<f64>().ok()
}

/// Remove `_` separators. Each one must sit between two ASCII digits
/// (`1_000`); any other placement rejects the string.
fn strip_digit_separators(s: &str) -> Option<Cow<'_, str>> {
    if !s.contains('_') {
        return Some(Cow::Borrowed(s));
    }
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let before = i.checked_sub(1).and_then(|j| bytes.get(j));
            let after = bytes.get(i + 1);
            if !(before.is_some_and(u8::is_ascii_digit) && after.is_some_and(u8::is_ascii_digit)) {
                return None;
            }
        } else {
            out.push(b as char);
        }
    }
    Some(Cow::Owned(out))
}

/// Coerce the way a browser's `parseInt` / `parseFloat` with a `|| 0`
/// default would: take the longest numeric prefix of the text and count
/// anything unparseable as zero. Never fails.
pub fn lenient_value(value: &Value, coercion: Coercion) -> f64 {
    let parsed = match value {
        Value::Number(n) => {
            let f = n.as_f64().unwrap_or(0.0);
            match coercion {
                Coercion::Integer => f.trunc(),
                Coercion::Float => f,
            }
        }
        Value::String(s) => numeric_prefix(s, coercion),
        _ => 0.0,
    };
    // `-0 || 0` and `NaN || 0` are both 0.
    if parsed.is_nan() || parsed == 0.0 {
        0.0
    } else {
        parsed
    }
}

/// Lenient value under `key`; absent keys count as zero.
pub fn lenient_field_value(inputs: &PlanningInputs, key: &str, coercion: Coercion) -> f64 {
    inputs
        .get(key)
        .map_or(0.0, |value| lenient_value(value, coercion))
}

/// Longest `[+-]?digits` prefix (integer) or decimal literal prefix with an
/// optional exponent (float) after leading whitespace.
fn numeric_prefix(s: &str, coercion: Coercion) -> f64 {
    let t = s.trim_start();
    let b = t.as_bytes();
    let digits_from = |mut k: usize| {
        while k < b.len() && b[k].is_ascii_digit() {
            k += 1;
        }
        k
    };

    let sign = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let int_end = digits_from(sign);
    let int_digits = int_end - sign;
    let mut end = int_end;

    if coercion == Coercion::Float {
        if b.get(end) == Some(&b'.') {
            let frac_end = digits_from(end + 1);
            if int_digits + (frac_end - end - 1) > 0 {
                end = frac_end;
            }
        }
        if end > sign && matches!(b.get(end), Some(b'e' | b'E')) {
            let exp_sign = usize::from(matches!(b.get(end + 1), Some(b'+' | b'-')));
            let exp_end = digits_from(end + 1 + exp_sign);
            if exp_end > end + 1 + exp_sign {
                end = exp_end;
            }
        }
    }

    let literal = &t[..end];
    if !literal.bytes().any(|c| c.is_ascii_digit()) {
        return 0.0;
    }
    literal.parse::<f64>().unwrap_or(0.0)
}

/// Coerce the value under `key`, defaulting to zero when absent.
pub fn field_value(
    inputs: &PlanningInputs,
    key: &str,
    coercion: Coercion,
) -> std::result::Result<f64, CoercionError> {
    match inputs.get(key) {
        Some(value) => coerce_value(key, value, coercion),
        None => Ok(0.0),
    }
}

/// Feature vector for the query row, in schema column order.
pub fn query_features(
    schema: &FeatureSchema,
    inputs: &PlanningInputs,
) -> std::result::Result<Vec<f64>, CoercionError> {
    schema
        .fields
        .iter()
        .map(|field| field_value(inputs, &field.input_key, field.coercion))
        .collect()
}

/// Input file encodings recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Toml,
    Yaml,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(InputFormat::Json),
            Some("toml") => Ok(InputFormat::Toml),
            Some("yaml") | Some("yml") => Ok(InputFormat::Yaml),
            Some(other) => Err(Error::UnsupportedInputFormat(format!(".{}", other))),
            None => Err(Error::UnsupportedInputFormat(format!(
                "{} has no extension",
                path.display()
            ))),
        }
    }
}

/// Parse planning inputs from text in the given format.
pub fn parse_inputs(content: &str, format: InputFormat) -> Result<PlanningInputs> {
    let value: Value = match format {
        InputFormat::Json => serde_json::from_str(content)
            .map_err(|e| Error::InvalidInput(format!("invalid JSON: {}", e)))?,
        InputFormat::Toml => toml::from_str(content)
            .map_err(|e| Error::InvalidInput(format!("invalid TOML: {}", e)))?,
        InputFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| Error::InvalidInput(format!("invalid YAML: {}", e)))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null if format == InputFormat::Yaml => Ok(PlanningInputs::new()),
        other => Err(Error::InvalidInput(format!(
            "expected an object of planning inputs, got {}",
            kind_name(&other)
        ))),
    }
}

/// Read planning inputs from a file, or JSON from stdin when `path` is `-`.
pub fn read_inputs(path: &Path) -> Result<PlanningInputs> {
    if path.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        return parse_inputs(&content, InputFormat::Json);
    }

    let format = InputFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_inputs(&content, format)
}

/// Split a `key=value` pair. The value stays a string.
pub fn parse_assignment(s: &str) -> Result<(String, Value)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| Error::InvalidInput(format!("expected key=value, got '{}'", s)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::InvalidInput(format!("empty key in '{}'", s)));
    }
    Ok((key.to_string(), Value::String(value.to_string())))
}

/// Apply `key=value` overrides on top of `base`. Existing keys keep their
/// position.
pub fn apply_assignments(mut base: PlanningInputs, assignments: &[String]) -> Result<PlanningInputs> {
    for assignment in assignments {
        let (key, value) = parse_assignment(assignment)?;
        base.insert(key, value);
    }
    Ok(base)
}

/// Documented sample submission for a built-in variant, as form strings.
pub fn sample_inputs(variant: bp_config::Variant) -> PlanningInputs {
    let pairs: &[(&str, &str)] = match variant {
        bp_config::Variant::Original => &[
            ("promotions", "20"),
            ("basicPayDifference", "4000000"),
            ("incrementJanuary", "4.5"),
            ("incrementJuly", "4.0"),
            ("retirements", "12"),
            ("gratuity", "1800000"),
            ("newJoinees", "22"),
            ("payLevel", "9.0"),
        ],
        bp_config::Variant::Updated => &[
            ("promotions", "20"),
            ("basicPayDifference", "4000000"),
            ("incrementJanuary", "4.5"),
            ("retirements", "12"),
            ("gratuity", "1800000"),
            ("newJoinees", "22"),
            ("newJoineeBasicPay", "17600000"),
        ],
    };
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}
