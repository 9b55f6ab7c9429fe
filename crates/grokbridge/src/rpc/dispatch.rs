use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::catalog::{tool_catalog, BridgeTool};
use super::jsonrpc::{error_codes, Request, RequestId, Response};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "grokbridge";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8001";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Where `tools/call` requests are forwarded to
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub server_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Routes a request by method name. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: BridgeConfig,
}

impl Dispatcher {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub async fn dispatch(&self, request: &Request) -> Response {
        let id = request.id.clone();
        debug!(method = %request.method, "dispatching request");

        match request.method.as_str() {
            "initialize" => Response::success(id, initialize_result()),
            "notifications/initialized" => Response::success(id, Value::Null),
            "tools/list" => Response::success(id, tool_catalog()),
            "tools/call" => self.call_tool(id, &request.params).await,
            other => Response::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Unknown method: {}", other),
            ),
        }
    }

    async fn call_tool(&self, id: Option<RequestId>, params: &Value) -> Response {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Response::error(id, error_codes::INVALID_PARAMS, "Missing tool name");
        };
        let Some(tool) = BridgeTool::from_name(name) else {
            return Response::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", name),
            );
        };
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        match self.forward(tool, &arguments).await {
            Ok(result) => Response::success(id, result),
            Err(err) => {
                warn!(tool = name, error = %err, "tool server unreachable");
                Response::error(id, error_codes::INTERNAL_ERROR, err.to_string())
            }
        }
    }

    /// Issue the single HTTP request behind a tool. A non-200 answer is still a
    /// result, carrying the status and body; only transport failures are errors.
    async fn forward(&self, tool: BridgeTool, arguments: &Value) -> Result<Value, reqwest::Error> {
        // One client per call, dropped with its connections when the call returns
        let client = Client::builder().timeout(self.config.timeout).build()?;
        let (method, path) = tool.route();
        let url = format!("{}{}", self.config.server_url.trim_end_matches('/'), path);

        let mut request = client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(api_key);
        }
        if method == Method::GET {
            let query = query_pairs(arguments);
            if !query.is_empty() {
                request = request.query(&query);
            }
        } else {
            request = request.json(arguments);
        }

        let response = request.send().await?;
        let status = response.status();
        info!(tool = tool.name(), status = status.as_u16(), "tool server answered");

        if status == StatusCode::OK {
            response.json().await
        } else {
            let body = response.text().await?;
            Ok(json!({
                "error": {
                    "code": status.as_u16(),
                    "message": body
                }
            }))
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "roots": {"listChanged": true},
            "sampling": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Scalar arguments become query parameters; nested values have no query form.
fn query_pairs(arguments: &Value) -> Vec<(String, String)> {
    let Some(object) = arguments.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key.clone(), s.clone())),
            Value::Number(n) => Some((key.clone(), n.to_string())),
            Value::Bool(b) => Some((key.clone(), b.to_string())),
            _ => None,
        })
        .collect()
}
