//! Tool invocation types and explicit parameter schemas.
//!
//! Tools are the side effects the model may request during a turn. Their
//! parameter schemas are plain data so that every provider renders the
//! same contract; nothing is inferred from function signatures.

use serde::{Deserialize, Serialize};

/// A tool-invocation request emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID (provider-supplied, or synthesized when the provider has none)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,

    /// Opaque provider token that must be echoed back with the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            signature: None,
        }
    }
}

/// The textual outcome of one tool invocation, tagged by tool name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result answers
    pub call_id: String,

    /// The originating tool name
    pub name: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// Human-readable confirmation or error text
    pub output: String,
}

impl ToolResult {
    pub fn ok(call: &ToolCall, output: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            success: true,
            output: output.into(),
        }
    }

    pub fn error(call: &ToolCall, output: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            success: false,
            output: output.into(),
        }
    }
}

/// Primitive parameter types understood by the model services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
        }
    }
}

/// One parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
    /// Value applied when the model omits an optional parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// A tool descriptor sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    /// Render the parameter list as a JSON Schema object.
    ///
    /// Defaults are folded into the description text because not every
    /// model service accepts a `default` keyword in its schema dialect.
    pub fn json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.params {
            let description = match &param.default {
                Some(default) => format!("{} (default: {})", param.description, default),
                None => param.description.clone(),
            };
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.kind.as_str(),
                    "description": description,
                }),
            );
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
