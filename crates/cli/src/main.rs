//! ChatRelay CLI — the main entry point.
//!
//! Commands:
//! - `gateway` — Start the WhatsApp webhook and WebSocket server
//! - `ask`     — Resolve one message against the LLM and tools
//! - `doctor`  — Diagnose configuration and collaborators
//! - `onboard` — Write a default config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "chatrelay",
    about = "ChatRelay — WhatsApp relay to an LLM with tool calling",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long, env = "CHATRELAY_PORT")]
        port: Option<u16>,
    },

    /// Send one message and print the reply (nothing is stored or delivered)
    Ask {
        /// The message text
        message: String,
    },

    /// Diagnose configuration and collaborators
    Doctor,

    /// Create a default configuration file
    Onboard,
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    match cli.command {
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Ask { message } => commands::ask::run(&message).await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Onboard => commands::onboard::run()?,
    }

    Ok(())
}
