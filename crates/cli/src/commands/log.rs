//! `ironcoach log`: record a workout without going through the model.

use ironcoach_tools::workout::{self, WorkoutArgs};

use super::CommandResult;

pub struct LogArgs {
    pub exercise: String,
    pub weight: f64,
    pub reps: i64,
    pub sets: i64,
    pub date: Option<String>,
    pub note: Option<String>,
}

pub async fn run(args: LogArgs) -> CommandResult {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;

    let confirmation = workout::run(
        &store,
        WorkoutArgs {
            exercise: args.exercise,
            weight: args.weight,
            reps: args.reps,
            sets: Some(args.sets),
            date: args.date.filter(|d| !d.trim().is_empty()),
            note: args.note,
        },
    )
    .await?;

    println!("{confirmation}");
    Ok(())
}
