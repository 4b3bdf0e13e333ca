//! Argument decoding: best-effort typed values from raw form fields.
//!
//! Every submitted field is tried as a JSON literal so complex arguments
//! (arrays, objects, numbers, booleans) can be passed through a plain HTML
//! form. Anything that is not valid JSON is passed on as the raw string.

use serde_json::Value;

/// Decode `raw` as a JSON literal.
///
/// Success is reported through the `Result`, never through the decoded
/// value, so `0`, `false`, `null`, `[]` and `{}` are all kept.
pub fn try_decode(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Decode `raw`, falling back to the unchanged string on failure.
pub fn decode(raw: &str) -> Value {
    match try_decode(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::trace!(raw, error = %e, "argument is not JSON, passing raw string");
            Value::String(raw.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_integer() {
        assert_eq!(decode("42"), json!(42));
    }

    #[test]
    fn zero_is_not_a_failure() {
        assert_eq!(decode("0"), json!(0));
        assert!(try_decode("0").is_ok());
    }

    #[test]
    fn falsy_values_are_kept() {
        assert_eq!(decode("false"), json!(false));
        assert_eq!(decode("null"), Value::Null);
        assert_eq!(decode("[]"), json!([]));
        assert_eq!(decode("{}"), json!({}));
        assert_eq!(decode("\"\""), json!(""));
    }

    #[test]
    fn decodes_structures() {
        assert_eq!(decode("[1,2]"), json!([1, 2]));
        assert_eq!(decode(r#"{"a": [true, 1.5]}"#), json!({"a": [true, 1.5]}));
    }

    #[test]
    fn plain_text_falls_back_to_raw() {
        assert_eq!(decode("hello"), json!("hello"));
        assert!(try_decode("hello").is_err());
    }

    #[test]
    fn partial_json_falls_back_to_raw() {
        assert_eq!(decode("[1,2"), json!("[1,2"));
        assert_eq!(decode("42abc"), json!("42abc"));
    }

    #[test]
    fn empty_field_is_an_empty_string() {
        assert_eq!(decode(""), json!(""));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(decode(" 7 "), json!(7));
    }
}
