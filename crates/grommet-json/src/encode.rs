//! JSON encoder.
//!
//! Output uses `", "` between elements and `": "` between keys and values,
//! which is also what [`JsonValue`]'s `Display` produces. Floats always carry
//! a fraction or exponent so they decode back as floats. Non-finite floats
//! have no JSON spelling and are written as `null`.

use crate::value::JsonValue;

/// Encode a value as JSON text.
#[must_use]
pub fn encode(value: &JsonValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &JsonValue) {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(true) => out.push_str("true"),
        JsonValue::Bool(false) => out.push_str("false"),
        JsonValue::Integer(i) => out.push_str(&i.to_string()),
        JsonValue::Float(f) => write_float(out, *f),
        JsonValue::String(s) => write_string(out, s),
        JsonValue::Object(object) => {
            out.push('{');
            for (index, (key, item)) in object.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_string(out, key);
                out.push_str(": ");
                write_value(out, item);
            }
            out.push('}');
        }
        JsonValue::Array(array) => {
            out.push('[');
            for (index, item) in array.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
    }
}

fn write_float(out: &mut String, f: f64) {
    if !f.is_finite() {
        out.push_str("null");
        return;
    }
    let text = f.to_string();
    out.push_str(&text);
    if !text.contains(['.', 'e', 'E']) {
        out.push_str(".0");
    }
}

fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c < ' ' => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::JsonObject;

    #[test]
    fn encodes_scalars() {
        assert_eq!(encode(&JsonValue::Null), "null");
        assert_eq!(encode(&JsonValue::Bool(true)), "true");
        assert_eq!(encode(&JsonValue::Integer(-7)), "-7");
        assert_eq!(encode(&JsonValue::Float(2.75)), "2.75");
    }

    #[test]
    fn integral_floats_keep_a_fraction() {
        assert_eq!(encode(&JsonValue::Float(2.0)), "2.0");
        assert_eq!(encode(&JsonValue::Float(-0.0)), "-0.0");
    }

    #[test]
    fn non_finite_floats_encode_as_null() {
        assert_eq!(encode(&JsonValue::Float(f64::NAN)), "null");
        assert_eq!(encode(&JsonValue::Float(f64::INFINITY)), "null");
    }

    #[test]
    fn escapes_string_content() {
        let value = JsonValue::string("quote \" slash \\ line\n bell \u{7}");
        assert_eq!(
            encode(&value),
            r#""quote \" slash \\ line\n bell \u0007""#
        );
    }

    #[test]
    fn escapes_object_keys() {
        let object: JsonObject = [("a\"b", 1)].into_iter().collect();
        assert_eq!(encode(&object.into()), r#"{"a\"b": 1}"#);
    }

    #[test]
    fn uses_spaced_separators() {
        let mut value = JsonValue::object();
        value.set("list", vec![JsonValue::from(1), JsonValue::from(2)]);
        value.set("empty", JsonValue::object());
        assert_eq!(encode(&value), r#"{"list": [1, 2], "empty": {}}"#);
    }
}
