//! Recursive-descent JSON decoder.
//!
//! [`try_decode`] reports the first problem it finds as a [`DecodeError`].
//! [`decode`] is the fail-soft variant used on untrusted peer input: any
//! error yields `null`, which the fail-soft lookups of [`JsonValue`] then
//! treat like an empty document.

use std::borrow::Cow;

use crate::error::{DecodeError, Result};
use crate::lexer::{Lexer, Spanned, Token};
use crate::value::{JsonArray, JsonObject, JsonValue};

/// Maximum nesting depth of objects and arrays.
pub const MAX_DEPTH: usize = 128;

/// Decode `text` into a value, or `null` if it is not valid JSON.
#[must_use]
pub fn decode(text: &str) -> JsonValue {
    try_decode(text).unwrap_or_default()
}

/// Decode `text` into a value.
///
/// The whole input must be a single JSON value surrounded by optional
/// whitespace.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing the first syntax problem, a nesting
/// depth beyond [`MAX_DEPTH`], or text after the top-level value.
pub fn try_decode(text: &str) -> Result<JsonValue> {
    let mut parser = Parser::new(text);
    let value = parser.parse_value()?;
    if let Some(extra) = parser.next_token()? {
        return Err(DecodeError::TrailingCharacters {
            offset: extra.offset,
        });
    }
    Ok(value)
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Spanned<'a>>,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lexer: Lexer::new(text),
            peeked: None,
            depth: 0,
        }
    }

    fn next_token(&mut self) -> Result<Option<Spanned<'a>>> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }
        self.lexer.next().transpose()
    }

    fn peek_is(&mut self, expected: &Token<'_>) -> Result<bool> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next().transpose()?;
        }
        Ok(self.peeked.as_ref().is_some_and(|t| t.token == *expected))
    }

    fn expect_token(&mut self, expected: &'static str) -> Result<Spanned<'a>> {
        match self.next_token()? {
            Some(token) => Ok(token),
            None => Err(DecodeError::UnexpectedToken {
                found: "end of input".to_string(),
                expected,
                offset: self.lexer.end(),
            }),
        }
    }

    fn enter(&mut self, offset: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep {
                limit: MAX_DEPTH,
                offset,
            });
        }
        Ok(())
    }

    fn parse_value(&mut self) -> Result<JsonValue> {
        let Some(Spanned { token, offset }) = self.next_token()? else {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.lexer.end(),
            });
        };
        match token {
            Token::BeginObject => self.parse_object(offset),
            Token::BeginArray => self.parse_array(offset),
            Token::String(s) => Ok(JsonValue::String(Cow::Owned(s.into_owned()))),
            Token::Atom(atom) => parse_atom(atom, offset),
            other => Err(unexpected(&other, "a value", offset)),
        }
    }

    fn parse_object(&mut self, offset: usize) -> Result<JsonValue> {
        self.enter(offset)?;
        let mut object = JsonObject::new();

        if self.peek_is(&Token::EndObject)? {
            self.next_token()?;
            self.depth -= 1;
            return Ok(JsonValue::Object(object));
        }

        loop {
            let key = match self.expect_token("a string key")? {
                Spanned {
                    token: Token::String(key),
                    ..
                } => key.into_owned(),
                Spanned { token, offset } => {
                    return Err(unexpected(&token, "a string key", offset));
                }
            };

            match self.expect_token("':'")? {
                Spanned {
                    token: Token::Colon,
                    ..
                } => {}
                Spanned { token, offset } => return Err(unexpected(&token, "':'", offset)),
            }

            let value = self.parse_value()?;
            object.set(key, value);

            match self.expect_token("',' or '}'")? {
                Spanned {
                    token: Token::Comma,
                    ..
                } => {}
                Spanned {
                    token: Token::EndObject,
                    ..
                } => break,
                Spanned { token, offset } => {
                    return Err(unexpected(&token, "',' or '}'", offset));
                }
            }
        }

        self.depth -= 1;
        Ok(JsonValue::Object(object))
    }

    fn parse_array(&mut self, offset: usize) -> Result<JsonValue> {
        self.enter(offset)?;
        let mut array = JsonArray::new();

        if self.peek_is(&Token::EndArray)? {
            self.next_token()?;
            self.depth -= 1;
            return Ok(JsonValue::Array(array));
        }

        loop {
            array.push(self.parse_value()?);

            match self.expect_token("',' or ']'")? {
                Spanned {
                    token: Token::Comma,
                    ..
                } => {}
                Spanned {
                    token: Token::EndArray,
                    ..
                } => break,
                Spanned { token, offset } => {
                    return Err(unexpected(&token, "',' or ']'", offset));
                }
            }
        }

        self.depth -= 1;
        Ok(JsonValue::Array(array))
    }
}

fn unexpected(token: &Token<'_>, expected: &'static str, offset: usize) -> DecodeError {
    DecodeError::UnexpectedToken {
        found: token.describe(),
        expected,
        offset,
    }
}

fn parse_atom(atom: &str, offset: usize) -> Result<JsonValue> {
    match atom {
        "true" => Ok(JsonValue::Bool(true)),
        "false" => Ok(JsonValue::Bool(false)),
        "null" => Ok(JsonValue::Null),
        _ => parse_number(atom).ok_or_else(|| DecodeError::InvalidLiteral {
            literal: atom.to_string(),
            offset,
        }),
    }
}

/// Numbers with a fraction or exponent become floats. Integers that do not
/// fit in an `i64` fall back to floats.
fn parse_number(text: &str) -> Option<JsonValue> {
    let first = *text.as_bytes().first()?;
    if !(first.is_ascii_digit() || first == b'-') {
        return None;
    }
    // Rust's parsers accept forms JSON does not, such as "inf" or "NaN".
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
    {
        return None;
    }

    if text.contains(['.', 'e', 'E']) {
        return text.parse::<f64>().ok().map(JsonValue::Float);
    }
    text.parse::<i64>()
        .map(JsonValue::Integer)
        .or_else(|_| text.parse::<f64>().map(JsonValue::Float))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_nested_document() {
        let value = try_decode(r#"{"a": {"b": [1, 2.5, "x", null, false]}}"#).unwrap();
        let list = &value["a"]["b"];
        assert_eq!(list.len(), 5);
        assert_eq!(list[0].as_i64(), Some(1));
        assert_eq!(list[1].as_f64(), Some(2.5));
        assert_eq!(list[2].as_str(), Some("x"));
        assert!(list[3].is_null());
        assert_eq!(list[4].as_bool(), Some(false));
    }

    #[test]
    fn duplicate_keys_keep_last_value_at_first_position() {
        let value = try_decode(r#"{"k": 1, "j": 0, "k": 2}"#).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["k", "j"]);
        assert_eq!(value["k"].as_i64(), Some(2));
    }

    #[test]
    fn exponent_numbers_are_floats() {
        assert_eq!(try_decode("1e3").unwrap(), JsonValue::Float(1000.0));
        assert_eq!(try_decode("-2.5E-1").unwrap(), JsonValue::Float(-0.25));
    }

    #[test]
    fn oversized_integers_fall_back_to_float() {
        let value = try_decode("123456789012345678901234567890").unwrap();
        assert!(matches!(value, JsonValue::Float(_)));
    }

    #[test]
    fn rejects_non_json_number_spellings() {
        assert!(matches!(
            try_decode("inf"),
            Err(DecodeError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            try_decode("NaN"),
            Err(DecodeError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            try_decode("nul"),
            Err(DecodeError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn reports_trailing_characters() {
        assert_eq!(
            try_decode("{} x"),
            Err(DecodeError::TrailingCharacters { offset: 3 })
        );
    }

    #[test]
    fn reports_unexpected_end() {
        assert!(matches!(
            try_decode(r#"{"a": 1"#),
            Err(DecodeError::UnexpectedToken { offset: 7, .. })
        ));
        assert_eq!(try_decode("   "), Err(DecodeError::UnexpectedEnd { offset: 3 }));
    }

    #[test]
    fn rejects_non_string_keys() {
        assert!(matches!(
            try_decode("{1: 2}"),
            Err(DecodeError::UnexpectedToken {
                expected: "a string key",
                offset: 1,
                ..
            })
        ));
    }

    #[test]
    fn rejects_trailing_comma() {
        assert!(try_decode("[1, ]").is_err());
        assert!(try_decode(r#"{"a": 1,}"#).is_err());
    }

    #[test]
    fn enforces_depth_limit() {
        let at_limit = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(try_decode(&at_limit).is_ok());

        let beyond = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert_eq!(
            try_decode(&beyond),
            Err(DecodeError::TooDeep {
                limit: MAX_DEPTH,
                offset: MAX_DEPTH
            })
        );
    }

    #[test]
    fn fail_soft_decode_returns_null() {
        assert!(decode("{broken").is_null());
        assert!(decode("").is_null());
        assert_eq!(decode("[]"), JsonValue::array());
    }
}
