//! JSON-RPC 2.0 envelope builders.

use grommet_json::JsonValue;

use super::RequestId;

/// Protocol version written into every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Build a request envelope: `{jsonrpc, method, params?, id}`.
///
/// `params` is included only if it is an object or an array.
#[must_use]
pub fn request(id: RequestId, method: &str, params: JsonValue) -> JsonValue {
    let mut envelope = notification(method, params);
    envelope.set("id", id);
    envelope
}

/// Build a notification envelope: `{jsonrpc, method, params?}`.
///
/// `params` is included only if it is an object or an array.
#[must_use]
pub fn notification(method: &str, params: JsonValue) -> JsonValue {
    let mut envelope = JsonValue::object();
    envelope.set("jsonrpc", JSONRPC_VERSION);
    envelope.set("method", JsonValue::string(method));
    if params.is_container() {
        envelope.set("params", params);
    }
    envelope
}

/// Build a success response to a server-to-client request.
///
/// `id` is echoed back exactly as the server sent it.
#[must_use]
pub fn response(id: JsonValue, result: JsonValue) -> JsonValue {
    let mut envelope = JsonValue::object();
    envelope.set("jsonrpc", JSONRPC_VERSION);
    envelope.set("id", id);
    envelope.set("result", result);
    envelope
}

/// Wrap an encoded body in a `Content-Length` header.
#[must_use]
pub fn frame(body: &str) -> Vec<u8> {
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    let mut bytes = Vec::with_capacity(header.len() + body.len());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(body.as_bytes());
    bytes
}
