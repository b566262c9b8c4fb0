//! The tool-calling conversation loop.
//!
//! One turn runs as a small state machine:
//!
//! 1. Send the standing instruction, prior turns, tool definitions, and
//!    the new message to the provider
//! 2. If the response carries tool calls, execute all of them in response
//!    order, send the results back as one content block, and go to 1
//! 3. Otherwise the response's text is the answer
//!
//! Text that accompanies tool calls in intermediate rounds stays in the
//! model-facing transcript but is not part of the answer. Every failure
//! resolves to a displayable string; `run_turn` never returns an error.

use std::sync::Arc;

use ironcoach_config::AppConfig;
use ironcoach_core::error::ProviderError;
use ironcoach_core::message::{Role, Turn};
use ironcoach_core::provider::{Content, Part, Provider, ProviderRequest, ProviderResponse};
use ironcoach_core::tool::{ToolCall, ToolResult};
use ironcoach_tools::ToolRegistry;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default cap on tool-executing rounds per turn.
pub const DEFAULT_MAX_ROUNDS: u32 = 8;

/// The answer for a turn when no credential could be resolved.
pub const MISSING_API_KEY_ANSWER: &str = "Error: no API key found for the model service. \
     Add it to ~/.ironcoach/secrets.toml or set the matching environment variable \
     (GOOGLE_API_KEY for Gemini).";

/// Why a turn ended without a terminal answer.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("the model kept requesting tools after {0} rounds")]
    RoundLimit(u32),
}

/// Orchestrates provider calls and tool execution for one turn at a time.
pub struct AgentLoop {
    /// The model service
    provider: Arc<dyn Provider>,

    /// Tools the model may invoke
    tools: ToolRegistry,

    model: String,
    temperature: f32,
    max_tokens: Option<u32>,

    /// Maximum tool-executing rounds per turn
    max_rounds: u32,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Build a loop with model settings taken from configuration.
    pub fn from_config(provider: Arc<dyn Provider>, tools: ToolRegistry, config: &AppConfig) -> Self {
        Self::new(provider, tools, config.model.clone())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_max_rounds(config.max_tool_rounds)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap response length; `None` leaves it to the provider.
    pub fn with_max_tokens(mut self, max: Option<u32>) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set the maximum number of tool-executing rounds.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one turn and return the answer text.
    ///
    /// `history` holds the prior turns only; `message` is the in-flight
    /// user message.
    pub async fn run_turn(&self, system_instruction: &str, history: &[Turn], message: &str) -> String {
        match self.try_turn(system_instruction, history, message).await {
            Ok(answer) => answer,
            Err(TurnError::Provider(ProviderError::MissingApiKey { key_name })) => {
                warn!(key_name = %key_name, "No API key available");
                MISSING_API_KEY_ANSWER.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Turn failed");
                format!("AI error: {e}")
            }
        }
    }

    /// The loop proper, with failures as values.
    pub async fn try_turn(
        &self,
        system_instruction: &str,
        history: &[Turn],
        message: &str,
    ) -> Result<String, TurnError> {
        let mut contents: Vec<Content> = history.iter().map(Content::from).collect();
        contents.push(Content::user_text(message));

        let definitions = self.tools.definitions();
        let mut round: u32 = 0;

        info!(
            provider = %self.provider.name(),
            prior_turns = history.len(),
            "Starting turn"
        );

        loop {
            let request = ProviderRequest {
                model: self.model.clone(),
                system_instruction: system_instruction.to_string(),
                contents: contents.clone(),
                tools: definitions.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };

            let response = self.provider.complete(request).await?;
            if let Some(usage) = &response.usage {
                debug!(round, tokens = usage.total_tokens, model = %response.model, "Response received");
            }

            let (assistant, calls) = assign_call_ids(&response, round);
            if calls.is_empty() {
                let answer = response.text();
                info!(rounds = round, "Turn complete");
                return Ok(answer);
            }

            if round >= self.max_rounds {
                warn!(round, max = self.max_rounds, "Tool round limit reached");
                return Err(TurnError::RoundLimit(self.max_rounds));
            }

            let discarded = response.text();
            if !discarded.is_empty() {
                debug!(round, text = %discarded, "Discarding intermediate-round text");
            }

            debug!(round, tool_count = calls.len(), "Executing tool calls");
            let mut results: Vec<ToolResult> = Vec::with_capacity(calls.len());
            for call in &calls {
                results.push(self.tools.execute(call).await);
            }

            contents.push(assistant);
            contents.push(Content::tool_results(results));
            round += 1;
        }
    }
}

/// The response as a transcript entry, with synthesized ids for calls the
/// provider left unnamed, plus the calls themselves in response order.
fn assign_call_ids(response: &ProviderResponse, round: u32) -> (Content, Vec<ToolCall>) {
    let mut calls = Vec::new();
    let parts = response
        .parts
        .iter()
        .map(|part| match part {
            Part::ToolCall(call) => {
                let mut call = call.clone();
                if call.id.is_empty() {
                    call.id = format!("call_{round}_{}", calls.len());
                }
                calls.push(call.clone());
                Part::ToolCall(call)
            }
            other => other.clone(),
        })
        .collect();

    (
        Content {
            role: Role::Assistant,
            parts,
        },
        calls,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ironcoach_core::provider::Usage;
    use ironcoach_core::record::RecordStore;
    use ironcoach_store::InMemoryStore;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns canned responses in order and records every request.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
        requests: Mutex<Vec<ProviderRequest>>,
        repeat_last: Option<ProviderResponse>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                repeat_last: None,
            }
        }

        /// Answers every request with the same response.
        fn always(response: ProviderResponse) -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                repeat_last: Some(response),
            }
        }

        fn requests(&self) -> Vec<ProviderRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            if let Some(next) = self.responses.lock().unwrap().pop_front() {
                return next;
            }
            self.repeat_last
                .clone()
                .ok_or_else(|| ProviderError::InvalidResponse("script exhausted".into()))
        }
    }

    fn respond(parts: Vec<Part>) -> ProviderResponse {
        ProviderResponse {
            parts,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        }
    }

    fn tool_call(name: &str, arguments: serde_json::Value) -> Part {
        Part::ToolCall(ToolCall::new("", name, arguments))
    }

    fn agent(provider: Arc<ScriptedProvider>, store: Arc<InMemoryStore>) -> AgentLoop {
        AgentLoop::new(provider, ToolRegistry::new(store), "mock-model")
    }

    #[tokio::test]
    async fn simple_text_response() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(respond(vec![
            Part::text("Hello! "),
            Part::text("Ready to train?"),
        ]))]));
        let store = Arc::new(InMemoryStore::new());

        let answer = agent(provider.clone(), store).run_turn("be a coach", &[], "hi").await;

        assert_eq!(answer, "Hello! Ready to train?");
        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system_instruction, "be a coach");
        assert_eq!(requests[0].tools.len(), 2);
        assert_eq!(requests[0].contents.len(), 1);
    }

    #[tokio::test]
    async fn config_settings_reach_the_request() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(respond(vec![Part::text("ok")]))]));
        let config = AppConfig {
            model: "gemini-2.5-pro".into(),
            temperature: 0.2,
            max_tokens: Some(512),
            ..AppConfig::default()
        };

        AgentLoop::from_config(provider.clone(), ToolRegistry::new(Arc::new(InMemoryStore::new())), &config)
            .run_turn("", &[], "hi")
            .await;

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gemini-2.5-pro");
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, Some(512));
    }

    #[tokio::test]
    async fn prior_turns_precede_the_new_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(respond(vec![Part::text("ok")]))]));
        let history = vec![Turn::user("hello"), Turn::assistant("hey there")];

        agent(provider.clone(), Arc::new(InMemoryStore::new()))
            .run_turn("", &history, "what now?")
            .await;

        let contents = &provider.requests()[0].contents;
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1].role, Role::Assistant);
        assert_eq!(contents[2], Content::user_text("what now?"));
    }

    #[tokio::test]
    async fn two_calls_in_one_round_share_one_follow_up() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(respond(vec![
                tool_call(
                    "record_workout_set",
                    serde_json::json!({"exercise": "Squat", "weight": 100, "reps": 5, "date": "2024-05-01"}),
                ),
                tool_call("record_body_stat", serde_json::json!({"weight": 81.5, "date": "2024-05-01"})),
            ])),
            Ok(respond(vec![Part::text("Both saved.")])),
        ]));
        let store = Arc::new(InMemoryStore::new());

        let answer = agent(provider.clone(), store.clone())
            .run_turn("", &[], "squat 100x5, weighed 81.5")
            .await;

        assert_eq!(answer, "Both saved.");
        assert_eq!(store.list_workouts().await.len(), 1);
        assert_eq!(store.latest_body_weight().await, Some(81.5));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let follow_up = &requests[1].contents;
        // user message, model calls, tool results
        assert_eq!(follow_up.len(), 3);
        let results: Vec<&ToolResult> = follow_up[2]
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::ToolResult(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "record_workout_set");
        assert_eq!(results[0].call_id, "call_0_0");
        assert_eq!(results[1].name, "record_body_stat");
        assert_eq!(results[1].call_id, "call_0_1");
        assert!(results.iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn only_terminal_round_text_is_returned() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(respond(vec![
                Part::text("Let me save that. "),
                tool_call("record_body_stat", serde_json::json!({"weight": 65})),
            ])),
            Ok(respond(vec![Part::text("Recorded!")])),
        ]));

        let answer = agent(provider.clone(), Arc::new(InMemoryStore::new()))
            .run_turn("", &[], "I weigh 65kg")
            .await;

        assert_eq!(answer, "Recorded!");
        // intermediate text is still part of what the model sees
        let model_turn = &provider.requests()[1].contents[1];
        assert_eq!(model_turn.role, Role::Assistant);
        assert_eq!(model_turn.parts[0], Part::text("Let me save that. "));
    }

    #[tokio::test]
    async fn unknown_tool_does_not_abort_the_turn() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(respond(vec![tool_call("delete_all", serde_json::json!({}))])),
            Ok(respond(vec![Part::text("Sorry, I can't do that.")])),
        ]));

        let answer = agent(provider.clone(), Arc::new(InMemoryStore::new()))
            .run_turn("", &[], "wipe my log")
            .await;

        assert_eq!(answer, "Sorry, I can't do that.");
        match &provider.requests()[1].contents[2].parts[0] {
            Part::ToolResult(r) => {
                assert!(!r.success);
                assert_eq!(r.output, "Error: unknown tool 'delete_all'");
            }
            other => panic!("expected a tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_key_yields_fixed_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::MissingApiKey {
            key_name: "GOOGLE_API_KEY".into(),
        })]));

        let answer = agent(provider, Arc::new(InMemoryStore::new()))
            .run_turn("", &[], "hi")
            .await;

        assert_eq!(answer, MISSING_API_KEY_ANSWER);
    }

    #[tokio::test]
    async fn provider_failure_mid_turn_becomes_error_text() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(respond(vec![tool_call("record_body_stat", serde_json::json!({"weight": 70}))])),
            Err(ProviderError::Network("connection reset".into())),
        ]));
        let store = Arc::new(InMemoryStore::new());

        let answer = agent(provider, store.clone()).run_turn("", &[], "70kg").await;

        assert!(answer.starts_with("AI error: "), "{answer}");
        assert!(answer.contains("connection reset"));
        // the first round's write is not rolled back
        assert_eq!(store.list_body_stats().await.len(), 1);
    }

    #[tokio::test]
    async fn round_limit_ends_the_turn() {
        let provider = Arc::new(ScriptedProvider::always(respond(vec![tool_call(
            "record_body_stat",
            serde_json::json!({"weight": 70}),
        )])));
        let store = Arc::new(InMemoryStore::new());

        let answer = agent(provider.clone(), store.clone())
            .with_max_rounds(2)
            .run_turn("", &[], "loop forever")
            .await;

        assert!(answer.starts_with("AI error: "), "{answer}");
        assert!(answer.contains("2 rounds"));
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(store.list_body_stats().await.len(), 2);
    }

    #[test]
    fn provider_ids_are_kept() {
        let response = respond(vec![
            Part::ToolCall(ToolCall::new("abc", "record_body_stat", serde_json::json!({}))),
            tool_call("record_body_stat", serde_json::json!({})),
        ]);
        let (content, calls) = assign_call_ids(&response, 3);
        assert_eq!(calls[0].id, "abc");
        assert_eq!(calls[1].id, "call_3_1");
        assert_eq!(content.parts.len(), 2);
    }
}
