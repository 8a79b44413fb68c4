//! Output comparison
//!
//! Values are compared structurally: object key order is irrelevant and an
//! integral float equals the matching integer (`4.0 == 4`). Numbers only get
//! slack when the test case declares a tolerance.

use serde_json::{Number, Value};

/// Whether `actual` matches `expected`
pub fn outputs_match(actual: &Value, expected: &Value, tolerance: Option<f64>) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_match(a, b, tolerance),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| outputs_match(x, y, tolerance))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| {
                    b.get(key)
                        .is_some_and(|y| outputs_match(x, y, tolerance))
                })
        }
        _ => false,
    }
}

fn numbers_match(a: &Number, b: &Number, tolerance: Option<f64>) -> bool {
    // Exact integer comparison avoids f64 rounding on large values
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if tolerance.is_none() {
            return x == y;
        }
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        if tolerance.is_none() {
            return x == y;
        }
    }

    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => match tolerance {
            Some(tol) => (x - y).abs() <= tol.abs(),
            None => x == y,
        },
        _ => false,
    }
}

/// Short human-readable description of a mismatch
pub fn describe_mismatch(actual: &Value, expected: &Value) -> String {
    const MAX_PREVIEW: usize = 120;

    let preview = |v: &Value| {
        let text = v.to_string();
        if text.chars().count() > MAX_PREVIEW {
            let cut: String = text.chars().take(MAX_PREVIEW).collect();
            format!("{}...", cut)
        } else {
            text
        }
    };

    format!("expected {}, got {}", preview(expected), preview(actual))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integral_float_equals_integer() {
        assert!(outputs_match(&json!(4.0), &json!(4), None));
        assert!(outputs_match(&json!(4), &json!(4.0), None));
        assert!(!outputs_match(&json!(4.5), &json!(4), None));
    }

    #[test]
    fn test_object_key_order_is_irrelevant() {
        let actual: Value = serde_json::from_str(r#"{"b": [1, 2], "a": {"x": null}}"#).unwrap();
        let expected = json!({"a": {"x": null}, "b": [1, 2]});
        assert!(outputs_match(&actual, &expected, None));
        assert!(!outputs_match(&json!({"a": 1}), &json!({"a": 1, "b": 2}), None));
    }

    #[test]
    fn test_array_order_matters() {
        assert!(!outputs_match(&json!([1, 2]), &json!([2, 1]), None));
        assert!(!outputs_match(&json!([1]), &json!([1, 1]), None));
    }

    #[test]
    fn test_tolerance_only_when_declared() {
        let actual = json!(0.30000000000000004);
        let expected = json!(0.3);
        assert!(!outputs_match(&actual, &expected, None));
        assert!(outputs_match(&actual, &expected, Some(1e-9)));
        assert!(outputs_match(&json!([1.0001, 2]), &json!([1, 2]), Some(0.001)));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(!outputs_match(&json!("4"), &json!(4), None));
        assert!(!outputs_match(&json!(null), &json!(false), None));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let a = json!(9_007_199_254_740_993_i64);
        let b = json!(9_007_199_254_740_992_i64);
        assert!(!outputs_match(&a, &b, None));
    }

    #[test]
    fn test_describe_mismatch_truncates() {
        let long = Value::String("x".repeat(500));
        let message = describe_mismatch(&long, &json!(4));
        assert!(message.starts_with("expected 4, got \"xxx"));
        assert!(message.ends_with("..."));
    }
}
