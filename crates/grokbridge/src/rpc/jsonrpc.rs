//! JSON-RPC 2.0 envelopes as they cross the stdio boundary.
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Request ID can be a number or string. Numbers are kept as received, so a
/// float or a value past `i64` is echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    String(String),
}

/// One request, built once per input line. A request without an id is a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Option<RequestId>,
    pub method: String,
    pub params: Value,
}

impl Request {
    pub fn new<S: Into<String>>(id: Option<RequestId>, method: S, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Read a request out of a decoded JSON value. On failure the error is the
    /// response to send back.
    pub fn from_value(value: Value) -> Result<Self, Response> {
        let Value::Object(mut object) = value else {
            return Err(Response::error(
                None,
                error_codes::INVALID_REQUEST,
                "Invalid Request: expected a JSON object",
            ));
        };

        let id = match object.remove("id") {
            None | Some(Value::Null) => None,
            Some(raw) => match serde_json::from_value::<RequestId>(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    return Err(Response::error(
                        None,
                        error_codes::INVALID_REQUEST,
                        "Invalid Request: id must be a string or a number",
                    ))
                }
            },
        };

        let method = match object.remove("method") {
            Some(Value::String(method)) => method,
            _ => {
                return Err(Response::error(
                    id,
                    error_codes::INVALID_REQUEST,
                    "Invalid Request: missing method",
                ))
            }
        };

        let params = match object.remove("params") {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(params) => params,
        };

        Ok(Self { id, method, params })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

/// A response line. A missing id is written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error<S: Into<String>>(id: Option<RequestId>, code: i32, message: S) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Error(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// The error code, if this is an error response
    pub fn error_code(&self) -> Option<i32> {
        match &self.outcome {
            Outcome::Error(error) => Some(error.code),
            Outcome::Result(_) => None,
        }
    }
}
