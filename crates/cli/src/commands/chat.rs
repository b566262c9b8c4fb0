//! `ironcoach chat`: interactive or single-message chat.

use std::io::Write;
use std::sync::Arc;

use ironcoach_agent::{AgentLoop, ChatSession, ContextAssembler};
use ironcoach_core::record::RecordStore;
use ironcoach_tools::ToolRegistry;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::warn;

use super::CommandResult;

pub async fn run(message: Option<String>) -> CommandResult {
    let config = super::load_config()?;
    let store: Arc<dyn RecordStore> = Arc::new(super::open_store(&config).await?);

    // Credentials are resolved once; a missing key is answered per turn
    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        warn!(
            key_name = %config.api_key_name(),
            secrets = %config.secrets.path.display(),
            "No API key found"
        );
    }
    let provider = ironcoach_providers::build_from_config(&config, api_key)?;

    let agent = Arc::new(AgentLoop::from_config(
        provider,
        ToolRegistry::new(store.clone()),
        &config,
    ));
    let context = ContextAssembler::from_config(store, &config);
    let mut session = ChatSession::new(agent, context);

    if let Some(msg) = message {
        let answer = session.send(&msg).await;
        println!("{answer}");
        return Ok(());
    }

    println!();
    println!("  ironcoach: interactive mode");
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  Database:  {}", config.data.database_path.display());
    println!();
    println!("  Tell me what you lifted or what you weigh.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let answer = session.send(line).await;
        println!();
        for text in answer.lines() {
            println!("  Coach > {text}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}
