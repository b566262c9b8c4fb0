//! Google Gemini provider over the `generateContent` REST API.
//!
//! Gemini speaks in `user` / `model` contents made of parts. Tool calls
//! arrive as `functionCall` parts and results go back as
//! `functionResponse` parts, each tagged with the function name.

use async_trait::async_trait;
use ironcoach_core::error::ProviderError;
use ironcoach_core::message::Role;
use ironcoach_core::provider::*;
use ironcoach_core::tool::{ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_KEY_NAME: &str = "GOOGLE_API_KEY";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// A Gemini `generateContent` client.
pub struct GeminiProvider {
    base_url: String,
    api_key: Option<String>,
    key_name: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a provider. A `None` key makes every call fail with
    /// [`ProviderError::MissingApiKey`] without touching the network.
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            key_name: DEFAULT_KEY_NAME.into(),
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Name reported in the missing-key error.
    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Gemini rejects empty text parts, so they are dropped along with any
    /// content left without parts (an empty answer in the history).
    fn build_contents(contents: &[Content]) -> Vec<GeminiContent> {
        contents
            .iter()
            .filter_map(|content| {
                let parts: Vec<GeminiPart> =
                    content.parts.iter().filter_map(Self::to_gemini_part).collect();
                if parts.is_empty() {
                    return None;
                }
                Some(GeminiContent {
                    role: match content.role {
                        Role::User => "user".into(),
                        Role::Assistant => "model".into(),
                    },
                    parts,
                })
            })
            .collect()
    }

    fn to_gemini_part(part: &Part) -> Option<GeminiPart> {
        let part = match part {
            Part::Text { text } if text.is_empty() => return None,
            Part::Text { text } => GeminiPart::Text { text: text.clone() },
            Part::ToolCall(call) => GeminiPart::FunctionCall {
                function_call: GeminiFunctionCall {
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                },
                thought_signature: call.signature.clone(),
            },
            Part::ToolResult(result) => GeminiPart::FunctionResponse {
                function_response: GeminiFunctionResponse {
                    name: result.name.clone(),
                    response: serde_json::json!({ "result": result.output }),
                },
            },
        };
        Some(part)
    }

    fn build_tools(tools: &[ToolDefinition]) -> Option<Vec<GeminiTool>> {
        if tools.is_empty() {
            return None;
        }

        let declarations = tools
            .iter()
            .map(|t| GeminiFunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.json_schema(),
            })
            .collect();

        Some(vec![GeminiTool {
            function_declarations: declarations,
        }])
    }

    fn build_request(request: &ProviderRequest) -> GeminiRequest {
        let system_instruction = if request.system_instruction.is_empty() {
            None
        } else {
            Some(GeminiSystemInstruction {
                parts: vec![GeminiTextPart {
                    text: request.system_instruction.clone(),
                }],
            })
        };

        GeminiRequest {
            contents: Self::build_contents(&request.contents),
            system_instruction,
            generation_config: Some(GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            }),
            tools: Self::build_tools(&request.tools),
        }
    }

    fn parse_response(
        response: GeminiResponse,
        model: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        if let Some(error) = response.error {
            return Err(ProviderError::ApiError {
                status_code: error.code.unwrap_or(200),
                message: error.message,
            });
        }

        let candidate = response
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| ProviderError::InvalidResponse("No candidates in response".into()))?;

        let mut parts = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            // Thought summaries are not part of the answer
            if part.thought.unwrap_or(false) {
                continue;
            }
            if let Some(text) = part.text {
                if !text.is_empty() {
                    parts.push(Part::Text { text });
                }
            }
            if let Some(fc) = part.function_call {
                let mut call = ToolCall::new(fc.id.unwrap_or_default(), fc.name, fc.args);
                call.signature = part.thought_signature;
                parts.push(Part::ToolCall(call));
            }
        }

        let usage = response.usage_metadata.map(|u| {
            let prompt = u.prompt_token_count.unwrap_or(0);
            let completion = u.candidates_token_count.unwrap_or(0);
            Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: u.total_token_count.unwrap_or(prompt + completion),
            }
        });

        Ok(ProviderResponse {
            parts,
            usage,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
        })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::MissingApiKey {
                key_name: self.key_name.clone(),
            });
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = Self::build_request(&request);

        debug!(
            model = %request.model,
            contents = body.contents.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited);
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        Self::parse_response(api_response, &request.model)
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Serialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
        #[serde(rename = "thoughtSignature", skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
}

#[derive(Debug, Serialize)]
struct GeminiFunctionCall {
    name: String,
    args: Value,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    text: Option<String>,
    thought: Option<bool>,
    function_call: Option<GeminiFunctionCallResponse>,
    thought_signature: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCallResponse {
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    code: Option<u16>,
    message: String,
}
