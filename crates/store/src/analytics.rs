//! Per-exercise analytics over the workout log.
//!
//! Pure functions over `list_workouts` output: personal best, total sets,
//! and the weight-over-time series for one exercise.

use ironcoach_core::record::WorkoutEntry;
use serde::Serialize;

/// One point of the weight-over-time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightPoint {
    pub date: String,
    pub weight: f64,
}

/// Aggregates for a single exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseSummary {
    pub exercise: String,
    /// Heaviest recorded weight (kg)
    pub personal_best: f64,
    /// Sum of the `sets` column over every entry
    pub total_sets: i64,
    /// Number of log rows
    pub entries: usize,
    /// Weight per entry, oldest first
    pub series: Vec<WeightPoint>,
    /// Matching rows as stored, newest first
    pub rows: Vec<WorkoutEntry>,
}

/// Distinct exercise names in first-seen order.
pub fn exercise_names(entries: &[WorkoutEntry]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        if !names.iter().any(|n| n == &entry.exercise) {
            names.push(entry.exercise.clone());
        }
    }
    names
}

/// Summarize one exercise. `None` when it has no entries.
pub fn summarize(entries: &[WorkoutEntry], exercise: &str) -> Option<ExerciseSummary> {
    let rows: Vec<WorkoutEntry> = entries
        .iter()
        .filter(|e| e.exercise == exercise)
        .cloned()
        .collect();
    if rows.is_empty() {
        return None;
    }

    let personal_best = rows.iter().map(|e| e.weight).fold(f64::MIN, f64::max);
    let total_sets = rows.iter().map(|e| e.sets).sum();

    let mut chronological: Vec<&WorkoutEntry> = rows.iter().collect();
    chronological.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    let series = chronological
        .into_iter()
        .map(|e| WeightPoint {
            date: e.date.clone(),
            weight: e.weight,
        })
        .collect();

    Some(ExerciseSummary {
        exercise: exercise.to_string(),
        personal_best,
        total_sets,
        entries: rows.len(),
        series,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, date: &str, exercise: &str, weight: f64, sets: i64) -> WorkoutEntry {
        WorkoutEntry {
            id,
            date: date.into(),
            exercise: exercise.into(),
            weight,
            reps: 5,
            sets,
            note: String::new(),
        }
    }

    fn log() -> Vec<WorkoutEntry> {
        // newest first, as list_workouts returns them
        vec![
            entry(4, "2024-03-01", "Squat", 110.0, 3),
            entry(3, "2024-02-15", "Bench Press", 70.0, 5),
            entry(2, "2024-02-01", "Squat", 115.0, 1),
            entry(1, "2024-01-01", "Squat", 100.0, 4),
        ]
    }

    #[test]
    fn names_keep_first_seen_order() {
        assert_eq!(exercise_names(&log()), vec!["Squat", "Bench Press"]);
        assert!(exercise_names(&[]).is_empty());
    }

    #[test]
    fn summary_aggregates_one_exercise() {
        let summary = summarize(&log(), "Squat").unwrap();
        assert_eq!(summary.personal_best, 115.0);
        assert_eq!(summary.total_sets, 8);
        assert_eq!(summary.entries, 3);
        assert_eq!(summary.rows[0].id, 4);
    }

    #[test]
    fn series_runs_oldest_first() {
        let summary = summarize(&log(), "Squat").unwrap();
        let dates: Vec<&str> = summary.series.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
        assert_eq!(summary.series[1].weight, 115.0);
    }

    #[test]
    fn unknown_exercise_has_no_summary() {
        assert!(summarize(&log(), "Deadlift").is_none());
    }
}
