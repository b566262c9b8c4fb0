//! Record store trait: the append-only training log.
//!
//! Two tables: workout sets and body measurements. Every write is a pure
//! insert; nothing is ever updated or deleted, so analytics always see the
//! full accumulated history.
//!
//! Reads never fail: a missing or unreadable table degrades to an empty
//! result so that the chat is never blocked. Writes do fail loudly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::StoreError;

/// One recorded workout set (or group of identical sets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub id: i64,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub exercise: String,
    /// Load in kg
    pub weight: f64,
    pub reps: i64,
    pub sets: i64,
    pub note: String,
}

/// One body measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyStatEntry {
    pub id: i64,
    pub date: String,
    /// Body weight in kg
    pub weight: f64,
    /// Body fat percentage, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fat: Option<f64>,
    pub note: String,
}

/// Insert payload for a workout row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkout {
    pub date: String,
    pub exercise: String,
    pub weight: f64,
    pub reps: i64,
    pub sets: i64,
    pub note: String,
}

impl NewWorkout {
    pub fn into_entry(self, id: i64) -> WorkoutEntry {
        WorkoutEntry {
            id,
            date: self.date,
            exercise: self.exercise,
            weight: self.weight,
            reps: self.reps,
            sets: self.sets,
            note: self.note,
        }
    }
}

/// Insert payload for a body-stat row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBodyStat {
    pub date: String,
    pub weight: f64,
    pub body_fat: Option<f64>,
    pub note: String,
}

impl NewBodyStat {
    pub fn into_entry(self, id: i64) -> BodyStatEntry {
        BodyStatEntry {
            id,
            date: self.date,
            weight: self.weight,
            body_fat: self.body_fat,
            note: self.note,
        }
    }
}

/// The record store contract shared by the tools, the context assembler,
/// and the analytics view.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// A human-readable name for this backend (e.g., "sqlite").
    fn name(&self) -> &str;

    /// Ensure both tables exist. Idempotent and safe on every startup.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Append a workout row, returning its id.
    async fn insert_workout(&self, workout: NewWorkout) -> Result<i64, StoreError>;

    /// Append a body-stat row, returning its id.
    async fn insert_body_stat(&self, stat: NewBodyStat) -> Result<i64, StoreError>;

    /// All workouts, newest date first. Empty on any read failure.
    async fn list_workouts(&self) -> Vec<WorkoutEntry>;

    /// All body stats, newest date first. Empty on any read failure.
    async fn list_body_stats(&self) -> Vec<BodyStatEntry>;

    /// Distinct exercise names. Empty on any read failure.
    async fn distinct_exercises(&self) -> Vec<String>;

    /// Weight from the body-stat row with the greatest date, if any.
    async fn latest_body_weight(&self) -> Option<f64>;
}
