//! Type-tag driven coercion of flag and environment strings.
//!
//! Flags reach the resolver as strings plus a type tag. This module turns
//! that pair into a typed [`Value`]:
//!
//! | tag | result |
//! |---|---|
//! | `bool` | boolean |
//! | `int`, `int8`..`int64`, `count` | signed integer |
//! | `uint`, `uint8`..`uint64` | unsigned integer |
//! | `float32`, `float64` | number (`inf`/`NaN` stay strings) |
//! | `<elem>Slice`, `<elem>Array` | array of `<elem>` |
//! | anything else | string, unchanged |

use serde_json::{Number, Value};

use crate::{Error, Result};

/// Coerce a rendered value into a typed value according to its tag.
pub fn coerce(raw: &str, value_type: &str) -> Result<Value> {
    if let Some(element) = list_element_type(value_type) {
        return split_list(raw)?
            .iter()
            .map(|item| coerce(item, element))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array);
    }

    let fail = |reason: String| Error::Coerce {
        value: raw.to_string(),
        value_type: value_type.to_string(),
        reason,
    };

    match value_type {
        "bool" => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| fail("expected true or false".to_string())),
        "int" | "int8" | "int16" | "int32" | "int64" | "count" => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| fail(e.to_string())),
        "uint" | "uint8" | "uint16" | "uint32" | "uint64" => raw
            .trim()
            .parse::<u64>()
            .map(Value::from)
            .map_err(|e| fail(e.to_string())),
        "float32" | "float64" => {
            let parsed = raw.trim().parse::<f64>().map_err(|e| fail(e.to_string()))?;
            // JSON has no inf/NaN; keep the text.
            Ok(Number::from_f64(parsed)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.trim().to_string())))
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Infer a type tag from an already typed value.
///
/// Returns `None` for values that carry no useful hint (strings, null,
/// objects), so callers keep the raw string.
pub fn type_tag_of(value: &Value) -> Option<&'static str> {
    match value {
        Value::Bool(_) => Some("bool"),
        Value::Number(n) if n.is_u64() => Some("uint64"),
        Value::Number(n) if n.is_i64() => Some("int64"),
        Value::Number(_) => Some("float64"),
        Value::Array(items) => match items.first().and_then(type_tag_of) {
            Some("bool") => Some("boolSlice"),
            Some("uint64") | Some("int64") => Some("int64Slice"),
            Some("float64") => Some("float64Slice"),
            _ => Some("stringSlice"),
        },
        _ => None,
    }
}

fn list_element_type(value_type: &str) -> Option<&str> {
    value_type
        .strip_suffix("Slice")
        .or_else(|| value_type.strip_suffix("Array"))
        .filter(|element| !element.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Split `[a,b]` or `a,b` as a single CSV record.
fn split_list(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = body.chars().peekable();
    let mut quoted = false;
    let mut at_field_start = true;

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if at_field_start => {
                quoted = true;
                at_field_start = false;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            _ => {
                field.push(c);
                at_field_start = false;
            }
        }
    }

    if quoted {
        return Err(Error::Coerce {
            value: raw.to_string(),
            value_type: "list".to_string(),
            reason: "unterminated quoted field".to_string(),
        });
    }

    fields.push(field);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_scalars() {
        assert_eq!(coerce("localhost", "string").unwrap(), json!("localhost"));
        assert_eq!(coerce("8080", "uint16").unwrap(), json!(8080));
        assert_eq!(coerce("-3", "int64").unwrap(), json!(-3));
        assert_eq!(coerce("2", "count").unwrap(), json!(2));
        assert_eq!(coerce("0.5", "float64").unwrap(), json!(0.5));
        assert_eq!(coerce("true", "bool").unwrap(), json!(true));
        assert_eq!(coerce("F", "bool").unwrap(), json!(false));
    }

    #[test]
    fn test_coerce_keeps_unknown_tags_as_strings() {
        assert_eq!(coerce("1h30m", "duration").unwrap(), json!("1h30m"));
        assert_eq!(coerce("", "ipNet").unwrap(), json!(""));
    }

    #[test]
    fn test_coerce_lists() {
        assert_eq!(coerce("[]", "stringSlice").unwrap(), json!([]));
        assert_eq!(coerce("[a,b]", "stringSlice").unwrap(), json!(["a", "b"]));
        assert_eq!(coerce("a,b", "stringSlice").unwrap(), json!(["a", "b"]));
        assert_eq!(coerce("[1,2,3]", "intSlice").unwrap(), json!([1, 2, 3]));
        assert_eq!(
            coerce("[true,false]", "boolSlice").unwrap(),
            json!([true, false])
        );
    }

    #[test]
    fn test_coerce_quoted_list_entries() {
        assert_eq!(
            coerce(r#"[a,"b,c","say ""hi"""]"#, "stringSlice").unwrap(),
            json!(["a", "b,c", "say \"hi\""])
        );
    }

    #[test]
    fn test_coerce_empty_list_entries() {
        assert_eq!(coerce(r#"[""]"#, "stringSlice").unwrap(), json!([""]));
        assert_eq!(coerce(r#"[a,""]"#, "stringSlice").unwrap(), json!(["a", ""]));
    }

    #[test]
    fn test_coerce_non_finite_floats_stay_text() {
        assert_eq!(coerce("inf", "float64").unwrap(), json!("inf"));
        assert_eq!(coerce("NaN", "float32").unwrap(), json!("NaN"));
        assert!(coerce("one", "float64").is_err());
    }

    #[test]
    fn test_coerce_errors() {
        assert!(matches!(
            coerce("abc", "int64"),
            Err(Error::Coerce { value_type, .. }) if value_type == "int64"
        ));
        assert!(coerce("yes", "bool").is_err());
        assert!(coerce("-1", "uint").is_err());
        assert!(coerce("[\"open", "stringSlice").is_err());
        assert!(coerce("[1,x]", "intSlice").is_err());
    }

    #[test]
    fn test_type_tag_of() {
        assert_eq!(type_tag_of(&json!(true)), Some("bool"));
        assert_eq!(type_tag_of(&json!(8080)), Some("uint64"));
        assert_eq!(type_tag_of(&json!(-1)), Some("int64"));
        assert_eq!(type_tag_of(&json!(1.5)), Some("float64"));
        assert_eq!(type_tag_of(&json!(["a"])), Some("stringSlice"));
        assert_eq!(type_tag_of(&json!([1, 2])), Some("int64Slice"));
        assert_eq!(type_tag_of(&json!("x")), None);
    }
}
