//! Tokenizer for JSON text.
//!
//! The lexer splits input into structural characters, string literals and
//! bare words ("atoms"). Atoms cover numbers and the `true`/`false`/`null`
//! literals; the decoder decides what an atom means. Every token records the
//! byte offset where it starts so errors can point at the input.

use std::borrow::Cow;

use crate::error::{DecodeError, Result};

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// A string literal with escapes resolved. Borrowed when the literal
    /// contains no escapes.
    String(Cow<'a, str>),
    /// A run of characters up to the next delimiter or whitespace.
    Atom(&'a str),
}

impl Token<'_> {
    /// Human-readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::BeginObject => "'{'".to_string(),
            Self::EndObject => "'}'".to_string(),
            Self::BeginArray => "'['".to_string(),
            Self::EndArray => "']'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Colon => "':'".to_string(),
            Self::String(s) => format!("string \"{s}\""),
            Self::Atom(a) => format!("'{a}'"),
        }
    }
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<'a> {
    /// The token.
    pub token: Token<'a>,
    /// Byte offset of the first character of the token.
    pub offset: usize,
}

/// Iterator over the tokens of a JSON document.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Length of the input in bytes.
    #[must_use]
    pub fn end(&self) -> usize {
        self.input.len()
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn lex_atom(&mut self, start: usize) -> &'a str {
        let bytes = self.input.as_bytes();
        let mut end = start;
        while let Some(&b) = bytes.get(end) {
            if b.is_ascii_whitespace() || is_delimiter(b) {
                break;
            }
            end += 1;
        }
        self.pos = end;
        // Delimiters are ASCII, so `end` always falls on a char boundary.
        &self.input[start..end]
    }

    fn lex_string(&mut self, start: usize) -> Result<Cow<'a, str>> {
        let bytes = self.input.as_bytes();
        let mut i = start + 1;
        let mut chunk_start = i;
        let mut owned: Option<String> = None;

        loop {
            let Some(&b) = bytes.get(i) else {
                return Err(DecodeError::UnterminatedString { offset: start });
            };
            match b {
                b'"' => {
                    let tail = &self.input[chunk_start..i];
                    self.pos = i + 1;
                    return Ok(match owned {
                        Some(mut text) => {
                            text.push_str(tail);
                            Cow::Owned(text)
                        }
                        None => Cow::Borrowed(tail),
                    });
                }
                b'\\' => {
                    let text = owned.get_or_insert_with(String::new);
                    text.push_str(&self.input[chunk_start..i]);
                    i = unescape(self.input, i, text)?;
                    chunk_start = i;
                }
                _ => i += 1,
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Spanned<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let offset = self.pos;
        let &b = self.input.as_bytes().get(offset)?;

        let token = match b {
            b'{' => Token::BeginObject,
            b'}' => Token::EndObject,
            b'[' => Token::BeginArray,
            b']' => Token::EndArray,
            b',' => Token::Comma,
            b':' => Token::Colon,
            b'"' => {
                return Some(
                    self.lex_string(offset)
                        .map(|s| Spanned {
                            token: Token::String(s),
                            offset,
                        })
                        .inspect_err(|_| self.pos = self.input.len()),
                );
            }
            _ => {
                let atom = self.lex_atom(offset);
                return Some(Ok(Spanned {
                    token: Token::Atom(atom),
                    offset,
                }));
            }
        };
        self.pos += 1;
        Some(Ok(Spanned { token, offset }))
    }
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'{' | b'}' | b'[' | b']' | b',' | b':' | b'"')
}

/// Resolve the escape starting at the backslash at `at`, appending the result
/// to `out`. Returns the index just past the escape.
fn unescape(input: &str, at: usize, out: &mut String) -> Result<usize> {
    let invalid = DecodeError::InvalidEscape { offset: at };
    let Some(&kind) = input.as_bytes().get(at + 1) else {
        return Err(invalid);
    };

    let simple = match kind {
        b'"' => Some('"'),
        b'\\' => Some('\\'),
        b'/' => Some('/'),
        b'b' => Some('\u{8}'),
        b'f' => Some('\u{c}'),
        b'n' => Some('\n'),
        b'r' => Some('\r'),
        b't' => Some('\t'),
        b'u' => None,
        _ => return Err(invalid),
    };
    if let Some(c) = simple {
        out.push(c);
        return Ok(at + 2);
    }

    let high = hex4(input, at + 2).ok_or(invalid.clone())?;
    if !(0xD800..=0xDBFF).contains(&high) {
        let c = char::from_u32(u32::from(high)).ok_or(invalid)?;
        out.push(c);
        return Ok(at + 6);
    }

    // High surrogate: a `\uXXXX` low surrogate must follow.
    if input.get(at + 6..at + 8) != Some("\\u") {
        return Err(invalid);
    }
    let low = hex4(input, at + 8).ok_or(invalid.clone())?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return Err(invalid);
    }
    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    out.push(char::from_u32(code).ok_or(invalid)?);
    Ok(at + 12)
}

fn hex4(input: &str, start: usize) -> Option<u16> {
    let digits = input.get(start..start + 4)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}
