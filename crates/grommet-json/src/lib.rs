//! A small JSON library for JSON-RPC clients.
//!
//! This library provides the value model used by the `grommet` engine
//! together with a lexer, a recursive-descent decoder and an encoder.
//!
//! # Example
//!
//! ```
//! use grommet_json::{decode, encode, JsonValue};
//!
//! let value = decode(r#"{"Int": 42, "Float": 3.14}"#);
//! assert_eq!(value["Int"].as_i64(), Some(42));
//! assert_eq!(encode(&value), r#"{"Int": 42, "Float": 3.14}"#);
//!
//! // Lookups never panic: missing keys and type mismatches read as null.
//! assert!(value["missing"]["deeper"].is_null());
//!
//! let mut reply = JsonValue::object();
//! reply.set("ok", true);
//! assert_eq!(reply.to_string(), r#"{"ok": true}"#);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod lexer;
mod serde_impl;
pub mod value;

pub use decode::{decode, try_decode, MAX_DEPTH};
pub use encode::encode;
pub use error::{DecodeError, Result};
pub use value::{JsonArray, JsonObject, JsonValue};
