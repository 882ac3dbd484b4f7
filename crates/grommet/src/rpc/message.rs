//! Classification of incoming JSON-RPC payloads.

use grommet_json::JsonValue;
use thiserror::Error;

use super::RequestId;

/// An error object from a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("server error {code}: {message}")]
pub struct ResponseError {
    /// The JSON-RPC error code.
    pub code: i64,
    /// The error message from the server.
    pub message: String,
    /// Additional data supplied by the server, or `null`.
    pub data: JsonValue,
}

impl ResponseError {
    /// Code used when the server sent an error without a numeric code.
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Read an error object, tolerating missing or mistyped fields.
    #[must_use]
    pub fn from_json(error: &JsonValue) -> Self {
        Self {
            code: error["code"].as_i64().unwrap_or(Self::INTERNAL_ERROR),
            message: error["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string(),
            data: error["data"].clone(),
        }
    }
}

/// A response to a request the client sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The id exactly as the server sent it.
    pub id: JsonValue,
    /// The `result` member, `null` when absent.
    pub result: JsonValue,
    /// The `error` member, if present.
    pub error: Option<ResponseError>,
}

impl Response {
    /// The id as a client request id, if it is one.
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        self.id.as_i64().and_then(RequestId::new)
    }

    /// Convert into the result or the error, whichever the server sent.
    ///
    /// # Errors
    ///
    /// Returns the server's error object when the response carries one.
    pub fn into_result(self) -> Result<JsonValue, ResponseError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

/// An incoming JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A response to one of the client's requests.
    Response(Response),

    /// A request from the server that expects a response.
    Request {
        /// The server's request id, echoed back in the response.
        id: JsonValue,
        /// The method name.
        method: String,
        /// The parameters, `null` when absent.
        params: JsonValue,
    },

    /// A notification from the server.
    Notification {
        /// The method name.
        method: String,
        /// The parameters, `null` when absent.
        params: JsonValue,
    },
}

impl Message {
    /// Sort a decoded payload into a message kind.
    ///
    /// - `method` and a non-null `id`: server request
    /// - `method` alone: notification
    /// - `id` with `result` or `error`: response
    ///
    /// Returns `None` for anything else, including non-objects.
    #[must_use]
    pub fn classify(value: JsonValue) -> Option<Self> {
        let JsonValue::Object(mut object) = value else {
            return None;
        };

        if let Some(method) = object.get("method").and_then(JsonValue::as_str) {
            let method = method.to_string();
            let params = object.remove("params").unwrap_or_default();
            return Some(match object.remove("id") {
                Some(id) if !id.is_null() => Self::Request { id, method, params },
                _ => Self::Notification { method, params },
            });
        }

        if !object.contains_key("result") && !object.contains_key("error") {
            return None;
        }
        let id = object.remove("id")?;
        let error = object.get("error").map(ResponseError::from_json);
        let result = object.remove("result").unwrap_or_default();
        Some(Self::Response(Response { id, result, error }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grommet_json::decode;

    fn classify(text: &str) -> Option<Message> {
        Message::classify(decode(text))
    }

    #[test]
    fn classifies_success_response() {
        let Some(Message::Response(response)) =
            classify(r#"{"jsonrpc": "2.0", "id": 3, "result": {"ok": true}}"#)
        else {
            panic!("expected a response");
        };
        assert_eq!(response.request_id(), RequestId::new(3));
        assert_eq!(response.into_result().unwrap()["ok"].as_bool(), Some(true));
    }

    #[test]
    fn classifies_error_response() {
        let Some(Message::Response(response)) = classify(
            r#"{"jsonrpc": "2.0", "id": 1, "error": {"code": -32601, "message": "no such method"}}"#,
        ) else {
            panic!("expected a response");
        };
        let error = response.into_result().unwrap_err();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "no such method");
        assert_eq!(error.to_string(), "server error -32601: no such method");
    }

    #[test]
    fn null_result_is_still_a_response() {
        assert!(matches!(
            classify(r#"{"jsonrpc": "2.0", "id": 2, "result": null}"#),
            Some(Message::Response(_))
        ));
    }

    #[test]
    fn classifies_server_request_with_string_id() {
        assert_eq!(
            classify(r#"{"jsonrpc": "2.0", "id": "w1", "method": "window/workDoneProgress/create", "params": {"token": 1}}"#),
            Some(Message::Request {
                id: JsonValue::string("w1"),
                method: "window/workDoneProgress/create".to_string(),
                params: decode(r#"{"token": 1}"#),
            })
        );
    }

    #[test]
    fn classifies_notification() {
        assert_eq!(
            classify(r#"{"jsonrpc": "2.0", "method": "window/logMessage"}"#),
            Some(Message::Notification {
                method: "window/logMessage".to_string(),
                params: JsonValue::Null,
            })
        );
    }

    #[test]
    fn rejects_non_messages() {
        assert_eq!(classify("[1, 2]"), None);
        assert_eq!(classify(r#"{"jsonrpc": "2.0"}"#), None);
        assert_eq!(classify(r#"{"result": 1}"#), None);
    }

    #[test]
    fn string_ids_are_not_request_ids() {
        let Some(Message::Response(response)) = classify(r#"{"id": "1", "result": 0}"#) else {
            panic!("expected a response");
        };
        assert_eq!(response.request_id(), None);
    }
}
