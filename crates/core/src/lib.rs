//! # ironcoach core
//!
//! Domain types, traits, and error definitions for the ironcoach training
//! assistant. This crate has no framework dependencies: it defines the
//! domain model that the store, tools, providers, and agent crates
//! implement against.
//!
//! ## Layout
//!
//! - [`record`]: workout and body-stat rows plus the `RecordStore` trait
//! - [`tool`]: tool calls, results, and explicit parameter schemas
//! - [`provider`]: the model-service boundary (requests, response parts)
//! - [`message`]: conversation turns held for one session
//! - [`knowledge`]: the three free-text documents injected every turn

pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod record;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, StoreError, ToolError};
pub use knowledge::KnowledgeDocs;
pub use message::{ChatHistory, Role, SessionId, Turn};
pub use provider::{Content, Part, Provider, ProviderRequest, ProviderResponse};
pub use record::{BodyStatEntry, NewBodyStat, NewWorkout, RecordStore, WorkoutEntry};
pub use tool::{ParamSpec, ParamType, ToolCall, ToolDefinition, ToolResult};
