//! Error types for the ironcoach domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the agent, tools, and CLI
//! convert them into displayable text at their own boundaries.

use thiserror::Error;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// No credential could be resolved for the model service.
    #[error("No API key available (looked up {key_name})")]
    MissingApiKey { key_name: String },

    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    NotFound(String),

    #[error("invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("{0}")]
    Store(#[from] StoreError),
}
