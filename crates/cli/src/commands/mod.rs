pub mod chat;
pub mod init;
pub mod log;
pub mod stats;
pub mod weigh;

use ironcoach_config::AppConfig;
use ironcoach_store::SqliteStore;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}

/// Open (and initialize) the configured database.
pub async fn open_store(config: &AppConfig) -> Result<SqliteStore, Box<dyn std::error::Error>> {
    SqliteStore::open(&config.data.database_path)
        .await
        .map_err(|e| format!("Failed to open {}: {e}", config.data.database_path.display()).into())
}
