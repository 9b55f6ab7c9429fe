//! The compiled-in tool catalog. Each tool maps to exactly one route on the remote
//! tool server; adding a tool means adding a variant here.
use reqwest::Method;
use serde_json::{json, Value};
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::tool::ToolDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum BridgeTool {
    ChatCompletions,
    ListModels,
}

impl BridgeTool {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn description(self) -> &'static str {
        match self {
            BridgeTool::ChatCompletions => "Chat completions using Grok models",
            BridgeTool::ListModels => "List available Grok models",
        }
    }

    /// HTTP verb and path on the remote tool server
    pub fn route(self) -> (Method, &'static str) {
        match self {
            BridgeTool::ChatCompletions => (Method::POST, "/v1/chat/completions"),
            BridgeTool::ListModels => (Method::GET, "/v1/models"),
        }
    }

    pub fn input_schema(self) -> Value {
        match self {
            BridgeTool::ChatCompletions => json!({
                "type": "object",
                "properties": {
                    "model": {"type": "string", "description": "Model ID"},
                    "messages": {"type": "array", "description": "Chat messages"},
                    "stream": {"type": "boolean", "description": "Enable streaming"}
                },
                "required": ["model", "messages"]
            }),
            BridgeTool::ListModels => json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description(), self.input_schema())
    }
}

/// The `tools/list` result
pub fn tool_catalog() -> Value {
    let tools: Vec<ToolDescriptor> = BridgeTool::iter().map(BridgeTool::descriptor).collect();
    json!({ "tools": tools })
}
