//! ironcoach CLI: the main entry point.
//!
//! Commands:
//! - `init`: Create config, secrets template, knowledge files, and database
//! - `chat`: Interactive chat or single-message mode
//! - `log`: Record a workout set directly
//! - `weigh`: Record a body measurement directly
//! - `stats`: Per-exercise analytics

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ironcoach",
    about = "ironcoach: a chat-driven training log with an AI coach",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration, knowledge files, and the database
    Init,

    /// Chat with the coach
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Record a workout set
    Log {
        /// Exercise name, e.g. "Bench Press"
        #[arg(short, long)]
        exercise: String,

        /// Load in kg
        #[arg(short, long)]
        weight: f64,

        /// Repetitions per set
        #[arg(short, long)]
        reps: i64,

        /// Number of sets
        #[arg(short, long, default_value_t = 1)]
        sets: i64,

        /// Date performed (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,

        /// Free-form note
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Record body weight and optional body-fat percentage
    Weigh {
        /// Body weight in kg
        #[arg(short, long)]
        weight: f64,

        /// Body-fat percentage
        #[arg(short, long)]
        body_fat: Option<f64>,

        /// Date measured (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show recorded exercises, or analytics for one exercise
    Stats {
        /// Exercise to summarize
        #[arg(short, long)]
        exercise: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so the transcript on stdout stays clean
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Log {
            exercise,
            weight,
            reps,
            sets,
            date,
            note,
        } => {
            commands::log::run(commands::log::LogArgs {
                exercise,
                weight,
                reps,
                sets,
                date,
                note,
            })
            .await?
        }
        Commands::Weigh {
            weight,
            body_fat,
            date,
        } => commands::weigh::run(weight, body_fat, date).await?,
        Commands::Stats { exercise } => commands::stats::run(exercise).await?,
    }

    Ok(())
}
