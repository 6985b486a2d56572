//! `chatrelay ask` — Resolve a single message and print the reply.
//!
//! Runs dispatch and tool execution only: nothing is persisted, delivered
//! or broadcast.

use std::sync::Arc;

use anyhow::Context;
use chatrelay_config::AppConfig;
use chatrelay_pipeline::{CompletionDispatcher, ReplyResolver};

pub async fn run(message: &str) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    if !config.has_api_key() && config.completion.provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No completion API key configured!");
        eprintln!();
        eprintln!("  Set OPENAI_API_KEY or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        anyhow::bail!("No API key found. See above for setup instructions.");
    }

    let provider = chatrelay_providers::build_from_config(&config.completion)?;
    let tools = Arc::new(chatrelay_tools::default_registry());
    let dispatcher = CompletionDispatcher::from_config(provider, tools, &config.completion);
    let resolver = ReplyResolver::new(dispatcher);

    let reply = resolver.resolve(message.trim()).await?;
    if let Some(tool) = &reply.tool {
        eprintln!("  [tool: {tool}]");
    }
    println!("{}", reply.text);

    Ok(())
}
