//! Standing-instruction assembly.
//!
//! Every turn gets a freshly built instruction block made of:
//!
//! 1. **Rules**: always record reported facts through the tools
//! 2. **Knowledge**: persona, training bible, and goals, verbatim
//! 3. **User data**: latest body weight and the most recent workout rows
//! 4. **Conduct**: speak per the persona, advise per the training bible
//!
//! Assembly itself is a pure function of its input; only [`ContextAssembler::build`]
//! touches the store and the knowledge directory.

use std::path::PathBuf;
use std::sync::Arc;

use ironcoach_config::AppConfig;
use ironcoach_core::knowledge::KnowledgeDocs;
use ironcoach_core::record::{RecordStore, WorkoutEntry};
use tracing::debug;

/// Default number of workout rows shown to the model.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

pub const NO_WORKOUTS_LINE: &str = "No workouts recorded yet.";

/// Everything one instruction block is made from.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    pub knowledge: &'a KnowledgeDocs,
    pub latest_weight: Option<f64>,
    /// Newest first, already cut to the display limit
    pub recent_workouts: &'a [WorkoutEntry],
}

/// Builds the per-turn standing instruction from the store and the
/// knowledge directory. Nothing is cached between turns.
#[derive(Clone)]
pub struct ContextAssembler {
    store: Arc<dyn RecordStore>,
    knowledge_dir: PathBuf,
    recent_limit: usize,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn RecordStore>, knowledge_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            knowledge_dir: knowledge_dir.into(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self::new(store, config.data.knowledge_dir.clone())
            .with_recent_limit(config.recent_log_limit)
    }

    /// Set how many recent workout rows are shown.
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit.max(1);
        self
    }

    /// Read current state and assemble this turn's instruction.
    pub async fn build(&self) -> String {
        let knowledge = KnowledgeDocs::load(&self.knowledge_dir);
        let latest_weight = self.store.latest_body_weight().await;
        let workouts = self.store.list_workouts().await;
        let recent = &workouts[..workouts.len().min(self.recent_limit)];

        debug!(
            latest_weight = ?latest_weight,
            rows = recent.len(),
            knowledge_empty = knowledge.is_empty(),
            "Assembled turn context"
        );

        Self::assemble(&AssemblyInput {
            knowledge: &knowledge,
            latest_weight,
            recent_workouts: recent,
        })
    }

    /// Render the instruction block. Deterministic: identical input yields
    /// identical output.
    pub fn assemble(input: &AssemblyInput<'_>) -> String {
        let mut out = String::with_capacity(2048);

        out.push_str("## Role\n");
        out.push_str(
            "You are the user's personal AI strength coach. Through conversation you \
             record their training and give advice.\n\n",
        );

        out.push_str("## Recording data\n");
        out.push_str(
            "Whenever the user reports a workout or a body measurement you MUST save it \
             with the provided tools before answering:\n",
        );
        out.push_str(
            "- \"bench press 60kg 10 reps 3 sets\" -> record_workout_set (sets=3)\n\
             - \"I weigh 65kg\" -> record_body_stat\n",
        );
        out.push_str("After a tool succeeds, tell the user what was saved.\n\n");

        out.push_str("---\n");
        push_section(&mut out, "Knowledge: persona", &input.knowledge.persona);
        push_section(&mut out, "Knowledge: training bible", &input.knowledge.training_bible);
        push_section(&mut out, "Knowledge: goals", &input.knowledge.goals);
        out.push_str("---\n\n");

        out.push_str("## User data\n");
        out.push_str(&format!(
            "Current body weight: {}\n",
            render_weight(input.latest_weight)
        ));
        out.push_str("Recent training log:\n");
        out.push_str(&render_workouts(input.recent_workouts));
        out.push_str("\n\n");

        out.push_str("## Conduct\n");
        out.push_str("1. Speak in the tone described by the persona document.\n");
        out.push_str(
            "2. Base advice on the training bible and avoid guidance without evidence.\n",
        );
        out.push_str("3. Use the tools proactively to keep the log up to date.\n");

        out
    }
}

fn push_section(out: &mut String, title: &str, body: &str) {
    out.push_str(&format!("### {title}\n"));
    out.push_str(body);
    out.push_str("\n\n");
}

/// `"72 kg"` or `"unknown"`.
pub fn render_weight(weight: Option<f64>) -> String {
    match weight {
        Some(w) => format!("{w} kg"),
        None => "unknown".into(),
    }
}

/// Pipe-separated table with a header, or [`NO_WORKOUTS_LINE`].
pub fn render_workouts(rows: &[WorkoutEntry]) -> String {
    if rows.is_empty() {
        return NO_WORKOUTS_LINE.into();
    }

    let mut table = String::from("date | exercise | weight (kg) | reps | sets | note");
    for row in rows {
        table.push_str(&format!(
            "\n{} | {} | {} | {} | {} | {}",
            row.date, row.exercise, row.weight, row.reps, row.sets, row.note
        ));
    }
    table
}
