//! Record-keeping tools for ironcoach.
//!
//! The model may ask for exactly two side effects: logging a workout set
//! and logging a body measurement. The set is closed, so tools are an
//! enum rather than trait objects, and each one carries an explicit
//! parameter schema.

pub mod args;
pub mod body_stat;
pub mod workout;

use std::str::FromStr;
use std::sync::Arc;

use ironcoach_core::error::ToolError;
use ironcoach_core::record::RecordStore;
use ironcoach_core::tool::{ToolCall, ToolDefinition, ToolResult};
use tracing::{debug, warn};

/// The tools the model can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    RecordWorkoutSet,
    RecordBodyStat,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::RecordWorkoutSet, ToolKind::RecordBodyStat];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::RecordWorkoutSet => workout::NAME,
            ToolKind::RecordBodyStat => body_stat::NAME,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        match self {
            ToolKind::RecordWorkoutSet => workout::definition(),
            ToolKind::RecordBodyStat => body_stat::definition(),
        }
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ToolError::NotFound(s.to_string()))
    }
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Dispatches tool calls against a record store.
#[derive(Clone)]
pub struct ToolRegistry {
    store: Arc<dyn RecordStore>,
}

impl ToolRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Definitions for every tool, in a stable order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL.iter().map(ToolKind::definition).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        ToolKind::ALL.iter().map(ToolKind::name).collect()
    }

    /// Execute one call. Failures become error text for the model, never
    /// an `Err`, so a bad call cannot abort the turn.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        match self.dispatch(call).await {
            Ok(output) => {
                debug!(tool = %call.name, %output, "Tool executed");
                ToolResult::ok(call, output)
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult::error(call, format!("Error: {e}"))
            }
        }
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<String, ToolError> {
        let kind: ToolKind = call.name.parse()?;
        let arguments = match &call.arguments {
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };
        let invalid = |e: serde_json::Error| ToolError::InvalidArguments {
            tool_name: kind.name().to_string(),
            reason: e.to_string(),
        };

        match kind {
            ToolKind::RecordWorkoutSet => {
                let args = serde_json::from_value(arguments).map_err(invalid)?;
                workout::run(self.store.as_ref(), args).await
            }
            ToolKind::RecordBodyStat => {
                let args = serde_json::from_value(arguments).map_err(invalid)?;
                body_stat::run(self.store.as_ref(), args).await
            }
        }
    }
}
