//! `chatrelay gateway` — Start the HTTP and WebSocket server.

use anyhow::Context;
use chatrelay_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("Failed to load config")?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("ChatRelay Gateway");
    println!("   Listening:  {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:      {}", config.completion.model);
    println!("   Store:      {}", config.store.backend);
    println!(
        "   Messaging:  {}",
        if config.messaging.has_credentials() { "twilio" } else { "log only" }
    );

    chatrelay_gateway::start(config).await?;

    Ok(())
}
