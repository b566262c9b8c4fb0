//! `ironcoach stats`: exercise list and per-exercise analytics.

use std::fmt::Write;

use ironcoach_core::record::RecordStore;
use ironcoach_store::analytics::{self, ExerciseSummary};

use super::CommandResult;

pub async fn run(exercise: Option<String>) -> CommandResult {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;

    match store.latest_body_weight().await {
        Some(w) => println!("Latest body weight: {w} kg"),
        None => println!("Latest body weight: unknown"),
    }

    let Some(exercise) = exercise else {
        let names = store.distinct_exercises().await;
        if names.is_empty() {
            println!("No workouts recorded yet.");
        } else {
            println!("Exercises:");
            for name in names {
                println!("  {name}");
            }
            println!("\nRun `ironcoach stats --exercise <name>` for details.");
        }
        return Ok(());
    };

    let workouts = store.list_workouts().await;
    let Some(summary) = analytics::summarize(&workouts, &exercise) else {
        println!("No entries for '{exercise}'.");
        return Ok(());
    };

    print!("{}", render_summary(&summary));
    Ok(())
}

/// Text report for one exercise. "Total sets" adds up the `sets` column;
/// the number of logged rows is shown separately.
fn render_summary(summary: &ExerciseSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", summary.exercise);
    let _ = writeln!(out, "  Personal best:        {} kg", summary.personal_best);
    let _ = writeln!(out, "  Total sets (summed):  {}", summary.total_sets);
    let _ = writeln!(out, "  Logged entries:       {}", summary.entries);

    let _ = writeln!(out, "\n  Weight over time:");
    for point in &summary.series {
        let _ = writeln!(out, "    {}  {} kg", point.date, point.weight);
    }

    let _ = writeln!(out, "\n  date       | weight | reps | sets | note");
    for row in &summary.rows {
        let _ = writeln!(
            out,
            "  {} | {} | {} | {} | {}",
            row.date, row.weight, row.reps, row.sets, row.note
        );
    }
    out
}
