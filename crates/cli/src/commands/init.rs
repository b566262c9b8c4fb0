//! `ironcoach init`: first-time setup.

use ironcoach_config::AppConfig;
use ironcoach_core::knowledge::KnowledgeDocs;

use super::CommandResult;

const SECRETS_TEMPLATE: &str = concat!(
    "# ironcoach secrets. Keep this file private.\n",
    "# The key name must match the active provider (GOOGLE_API_KEY for gemini).\n",
    "# GOOGLE_API_KEY = \"...\"\n",
);

pub async fn run() -> CommandResult {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("ironcoach: first-time setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("  Config already exists: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Created {}", config_path.display());
    }

    let config = super::load_config()?;

    if config.secrets.path.exists() {
        println!("  Secrets file exists: {}", config.secrets.path.display());
    } else {
        if let Some(parent) = config.secrets.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config.secrets.path, SECRETS_TEMPLATE)?;
        println!("  Created secrets template: {}", config.secrets.path.display());
    }

    KnowledgeDocs::load(&config.data.knowledge_dir);
    println!("  Knowledge files in: {}", config.data.knowledge_dir.display());
    println!("    personality.txt, training_bible.txt, goals.txt");

    let store = super::open_store(&config).await?;
    println!("  Database ready: {}", store.path().display());

    println!("\nNext steps:");
    println!("  1. Put your {} in {}", config.api_key_name(), config.secrets.path.display());
    println!("  2. Describe your coach in {}", config.data.knowledge_dir.join("personality.txt").display());
    println!("  3. Run: ironcoach chat\n");

    Ok(())
}
