//! `ironcoach weigh`: record a body measurement.

use ironcoach_tools::body_stat::{self, BodyStatArgs};

use super::CommandResult;

pub async fn run(weight: f64, body_fat: Option<f64>, date: Option<String>) -> CommandResult {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;

    let confirmation = body_stat::run(
        &store,
        BodyStatArgs {
            weight,
            body_fat,
            date: date.filter(|d| !d.trim().is_empty()),
        },
    )
    .await?;

    println!("{confirmation}");
    Ok(())
}
