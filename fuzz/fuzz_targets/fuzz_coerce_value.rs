//! Fuzz target for per-field numeric coercion.

#![no_main]

use arbitrary::Arbitrary;
use bp_config::Coercion;
use bp_core::input::{coerce_value, lenient_value};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

#[derive(Debug, Arbitrary)]
enum RawValue {
    Text(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Arbitrary)]
struct Case {
    value: RawValue,
    integer: bool,
}

fuzz_target!(|case: Case| {
    let value = match case.value {
        RawValue::Text(s) => Value::String(s),
        RawValue::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        RawValue::Int(i) => Value::from(i),
        RawValue::Bool(b) => Value::Bool(b),
    };
    let coercion = if case.integer {
        Coercion::Integer
    } else {
        Coercion::Float
    };

    if let Ok(x) = coerce_value("field", &value, coercion) {
        if coercion == Coercion::Integer {
            assert_eq!(x, x.trunc());
        }
    }

    let lenient = lenient_value(&value, coercion);
    assert!(!lenient.is_nan());
    if coercion == Coercion::Integer && lenient.is_finite() {
        assert_eq!(lenient, lenient.trunc());
    }
});
