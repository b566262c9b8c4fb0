//! `record_workout_set`: append a workout row to the training log.

use crate::args;
use ironcoach_core::error::ToolError;
use ironcoach_core::record::{NewWorkout, RecordStore};
use ironcoach_core::tool::{ParamSpec, ParamType, ToolDefinition};
use serde::Deserialize;

pub const NAME: &str = "record_workout_set";

/// Arguments as sent by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkoutArgs {
    pub exercise: String,
    #[serde(deserialize_with = "args::number")]
    pub weight: f64,
    #[serde(deserialize_with = "args::integer")]
    pub reps: i64,
    #[serde(default, deserialize_with = "args::opt_integer")]
    pub sets: Option<i64>,
    #[serde(default, deserialize_with = "args::opt_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "args::opt_text")]
    pub note: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.into(),
        description: concat!(
            "Save a strength-training entry to the user's log. ",
            "Call this whenever the user reports exercises they performed, ",
            "e.g. 'bench press 60kg 10 reps 3 sets' -> exercise='Bench Press', weight=60, reps=10, sets=3."
        )
        .into(),
        params: vec![
            ParamSpec::required("exercise", ParamType::String, "Exercise name, e.g. Bench Press"),
            ParamSpec::required("weight", ParamType::Number, "Load in kg"),
            ParamSpec::required("reps", ParamType::Integer, "Repetitions per set"),
            ParamSpec::optional("sets", ParamType::Integer, "Number of sets")
                .with_default(serde_json::json!(1)),
            ParamSpec::optional(
                "date",
                ParamType::String,
                "Date performed, YYYY-MM-DD. Omit to use today's date",
            ),
            ParamSpec::optional("note", ParamType::String, "Free-form note")
                .with_default(serde_json::json!("")),
        ],
    }
}

/// Insert the row and return the confirmation text.
pub async fn run(store: &dyn RecordStore, args: WorkoutArgs) -> Result<String, ToolError> {
    let row = NewWorkout {
        date: args.date.unwrap_or_else(crate::today),
        exercise: args.exercise,
        weight: args.weight,
        reps: args.reps,
        sets: args.sets.unwrap_or(1),
        note: args.note.unwrap_or_default(),
    };

    let message = format!(
        "Recorded: {} {} {}kg x {} reps x {} sets",
        row.date, row.exercise, row.weight, row.reps, row.sets
    );
    store.insert_workout(row).await?;
    Ok(message)
}
