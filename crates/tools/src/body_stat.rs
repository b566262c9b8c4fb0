//! `record_body_stat`: append a body weight / body-fat measurement.

use crate::args;
use ironcoach_core::error::ToolError;
use ironcoach_core::record::{NewBodyStat, RecordStore};
use ironcoach_core::tool::{ParamSpec, ParamType, ToolDefinition};
use serde::Deserialize;

pub const NAME: &str = "record_body_stat";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BodyStatArgs {
    #[serde(deserialize_with = "args::number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "args::opt_number")]
    pub body_fat: Option<f64>,
    #[serde(default, deserialize_with = "args::opt_text")]
    pub date: Option<String>,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: NAME.into(),
        description: concat!(
            "Save the user's body weight and, if mentioned, body-fat percentage. ",
            "Call this whenever the user reports a weigh-in, e.g. 'I weigh 65kg'."
        )
        .into(),
        params: vec![
            ParamSpec::required("weight", ParamType::Number, "Body weight in kg"),
            ParamSpec::optional(
                "body_fat",
                ParamType::Number,
                "Body-fat percentage. Omit when unknown",
            ),
            ParamSpec::optional(
                "date",
                ParamType::String,
                "Date measured, YYYY-MM-DD. Omit to use today's date",
            ),
        ],
    }
}

pub async fn run(store: &dyn RecordStore, args: BodyStatArgs) -> Result<String, ToolError> {
    let row = NewBodyStat {
        date: args.date.unwrap_or_else(crate::today),
        weight: args.weight,
        body_fat: args.body_fat,
        note: String::new(),
    };

    let mut message = format!("Recorded: {} body weight {}kg", row.date, row.weight);
    if let Some(bf) = row.body_fat.filter(|bf| *bf > 0.0) {
        message.push_str(&format!(", body fat {bf}%"));
    }
    store.insert_body_stat(row).await?;
    Ok(message)
}
