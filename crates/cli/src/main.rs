//! TutorForge CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize the config file
//! - `ask`     — Run one tutoring session in the terminal
//! - `serve`   — Start the HTTP gateway
//! - `status`  — Show the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tutorforge",
    about = "TutorForge — retrieval-grounded interactive tutoring",
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
    /// Initialize configuration
    Onboard,

    /// Ask about a topic and stream the tutor's reply
    #[command(after_help = "Examples:\n  \
        tutorforge ask \"Basketball\"\n  \
        tutorforge ask \"Machine Learning\" --level College\n  \
        tutorforge ask \"Personal Finance\"\n  \
        tutorforge ask \"U.S. History\" --level \"Elementary School\"")]
    Ask {
        /// The topic to learn about
        topic: String,

        /// Audience level, e.g. "Elementary School", "College"
        #[arg(short, long)]
        level: Option<String>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask { topic, level } => commands::ask::run(topic, level).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
