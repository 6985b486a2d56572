//! `chatrelay doctor` — Diagnose configuration and collaborators.

use chatrelay_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    println!("ChatRelay Doctor — System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file — defaults and environment only (run `chatrelay onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid configuration.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ Completion API key configured ({})", config.completion.provider);
    } else {
        println!("  ❌ No completion API key — set OPENAI_API_KEY");
        issues += 1;
    }

    if config.messaging.has_credentials() {
        println!("  ✅ Twilio credentials configured");
        if config.messaging.from.is_empty() {
            println!("  ⚠️  No sender identity — set TWILIO_WHATSAPP_FROM");
            issues += 1;
        }
    } else {
        println!("  ⚠️  No Twilio credentials — replies will only be logged");
        issues += 1;
    }

    match chatrelay_store::open_from_config(&config.store).await {
        Ok(store) => match store.count().await {
            Ok(n) => println!("  ✅ Audit store reachable ({}, {n} exchanges)", store.name()),
            Err(e) => {
                println!("  ❌ Audit store query failed: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Audit store unavailable: {e}");
            issues += 1;
        }
    }

    match chatrelay_providers::build_from_config(&config.completion) {
        Ok(_) => println!("  ✅ Completion provider '{}' ready", config.completion.provider),
        Err(e) => {
            println!("  ❌ Completion provider: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
