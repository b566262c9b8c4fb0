//! In-memory store: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use ironcoach_core::error::StoreError;
use ironcoach_core::record::{BodyStatEntry, NewBodyStat, NewWorkout, RecordStore, WorkoutEntry};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    workouts: Vec<WorkoutEntry>,
    body_stats: Vec<BodyStatEntry>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A store that keeps both tables in a Vec.
/// Ordering matches the SQLite store: date descending, then id descending.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_workout(&self, workout: NewWorkout) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        tables.workouts.push(workout.into_entry(id));
        Ok(id)
    }

    async fn insert_body_stat(&self, stat: NewBodyStat) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.allocate_id();
        tables.body_stats.push(stat.into_entry(id));
        Ok(id)
    }

    async fn list_workouts(&self) -> Vec<WorkoutEntry> {
        let mut rows = self.tables.read().await.workouts.clone();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows
    }

    async fn list_body_stats(&self) -> Vec<BodyStatEntry> {
        let mut rows = self.tables.read().await.body_stats.clone();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows
    }

    async fn distinct_exercises(&self) -> Vec<String> {
        crate::analytics::exercise_names(&self.tables.read().await.workouts)
    }

    async fn latest_body_weight(&self) -> Option<f64> {
        self.list_body_stats().await.first().map(|s| s.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout(date: &str, exercise: &str) -> NewWorkout {
        NewWorkout {
            date: date.into(),
            exercise: exercise.into(),
            weight: 50.0,
            reps: 8,
            sets: 1,
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn ids_are_unique_across_tables() {
        let store = InMemoryStore::new();
        let a = store.insert_workout(workout("2024-01-01", "Squat")).await.unwrap();
        let b = store
            .insert_body_stat(NewBodyStat {
                date: "2024-01-01".into(),
                weight: 70.0,
                body_fat: None,
                note: String::new(),
            })
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn list_orders_like_sqlite() {
        let store = InMemoryStore::new();
        store.insert_workout(workout("2024-01-01", "Squat")).await.unwrap();
        store.insert_workout(workout("2024-02-01", "Bench")).await.unwrap();
        let last = store.insert_workout(workout("2024-02-01", "Row")).await.unwrap();

        let rows = store.list_workouts().await;
        assert_eq!(rows[0].id, last);
        assert_eq!(rows[2].date, "2024-01-01");
    }

    #[tokio::test]
    async fn latest_weight_and_exercises() {
        let store = InMemoryStore::new();
        assert_eq!(store.latest_body_weight().await, None);
        assert!(store.distinct_exercises().await.is_empty());

        for (date, weight) in [("2024-01-01", 70.0), ("2024-03-01", 72.0), ("2024-02-01", 71.0)] {
            store
                .insert_body_stat(NewBodyStat {
                    date: date.into(),
                    weight,
                    body_fat: None,
                    note: String::new(),
                })
                .await
                .unwrap();
        }
        store.insert_workout(workout("2024-01-01", "Squat")).await.unwrap();
        store.insert_workout(workout("2024-01-02", "Squat")).await.unwrap();

        assert_eq!(store.latest_body_weight().await, Some(72.0));
        assert_eq!(store.distinct_exercises().await, vec!["Squat"]);
    }
}
