//! Record store implementations for ironcoach.
//!
//! - [`SqliteStore`]: the file-backed store used by the CLI
//! - [`InMemoryStore`]: ephemeral store for tests and dry runs
//! - [`analytics`]: per-exercise summaries over the workout log

pub mod analytics;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use analytics::{ExerciseSummary, WeightPoint, exercise_names, summarize};
pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
