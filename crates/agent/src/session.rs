//! A chat session: in-memory history plus one turn at a time.

use std::sync::Arc;

use ironcoach_core::message::{ChatHistory, SessionId, Turn};
use tracing::info;

use crate::context::ContextAssembler;
use crate::loop_runner::AgentLoop;

/// Holds the turn history for one process lifetime and runs turns
/// against a fresh context each time.
pub struct ChatSession {
    agent: Arc<AgentLoop>,
    context: ContextAssembler,
    history: ChatHistory,
}

impl ChatSession {
    pub fn new(agent: Arc<AgentLoop>, context: ContextAssembler) -> Self {
        Self {
            agent,
            context,
            history: ChatHistory::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.history.id
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    /// Run one turn. The model sees the prior turns only; afterwards both
    /// the message and the answer (error answers included) are appended.
    pub async fn send(&mut self, message: &str) -> String {
        let instruction = self.context.build().await;
        let answer = self
            .agent
            .run_turn(&instruction, &self.history.turns, message)
            .await;

        self.history.push(Turn::user(message));
        self.history.push(Turn::assistant(answer.clone()));
        info!(session_id = %self.history.id, turns = self.history.len(), "Turn recorded");

        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ironcoach_core::error::ProviderError;
    use ironcoach_core::message::Role;
    use ironcoach_core::provider::{Part, Provider, ProviderRequest, ProviderResponse};
    use ironcoach_store::InMemoryStore;
    use ironcoach_tools::ToolRegistry;
    use std::sync::Mutex;

    /// Echoes how many contents it was sent, and records requests.
    #[derive(Default)]
    struct CountingProvider {
        requests: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait]
    impl Provider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let n = request.contents.len();
            self.requests.lock().unwrap().push(request);
            Ok(ProviderResponse {
                parts: vec![Part::text(format!("saw {n}"))],
                usage: None,
                model: "counting".into(),
            })
        }
    }

    #[tokio::test]
    async fn history_grows_and_excludes_in_flight_message() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(CountingProvider::default());
        let agent = Arc::new(AgentLoop::new(
            provider.clone(),
            ToolRegistry::new(store.clone()),
            "m",
        ));
        let mut session = ChatSession::new(agent, ContextAssembler::new(store, tmp.path()));

        assert_eq!(session.send("first").await, "saw 1");
        assert_eq!(session.send("second").await, "saw 3");

        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history.turns[0].role, Role::User);
        assert_eq!(history.turns[3].content, "saw 3");

        let requests = provider.requests.lock().unwrap();
        assert!(requests[1].system_instruction.contains("Current body weight: unknown"));
        assert!(!session.id().0.is_empty());
    }
}
