//! The conversation core of ironcoach.
//!
//! Each user message runs one turn:
//!
//! 1. **Build context**: knowledge documents, latest weight, recent rows
//! 2. **Send to the model** with the prior turns and tool definitions
//! 3. **If tool calls**: execute them, send the results back, repeat
//! 4. **If text only**: that text is the answer
//!
//! The loop stops at the first text-only response or when the round cap
//! is reached.

pub mod context;
pub mod loop_runner;
pub mod session;

pub use context::{AssemblyInput, ContextAssembler};
pub use loop_runner::{AgentLoop, DEFAULT_MAX_ROUNDS, MISSING_API_KEY_ANSWER, TurnError};
pub use session::ChatSession;
