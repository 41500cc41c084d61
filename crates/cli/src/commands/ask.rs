//! `tutorforge ask` — Run one tutoring session in the terminal.
//!
//! Drives the whole pipeline in-process: source discovery, parallel
//! extraction, prompt assembly, then the streamed reply printed delta by
//! delta as it arrives. A failed search degrades to an empty source list;
//! the session continues either way.

use std::io::Write;

use tutorforge_config::AppConfig;
use tutorforge_core::message::{Conversation, Message};
use tutorforge_core::prompt::build_system_prompt;
use tutorforge_extract::ExtractionStage;
use tutorforge_stream::{CompletionClient, CompletionRequest, StreamConsumer, StreamProxy};

pub async fn run(topic: String, level: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No completion API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TOGETHER_API_KEY=...     (recommended)");
        eprintln!("    OPENAI_API_KEY=...");
        eprintln!("    TUTORFORGE_API_KEY=...   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let level = level.unwrap_or_else(|| config.default_level.clone());

    // --- Source discovery ---
    let sources = match tutorforge_search::build_from_config(&config) {
        Ok(client) => match client.search(&topic).await {
            Ok(sources) => sources,
            Err(e) => {
                eprintln!("  Could not fetch sources ({e}), continuing without them.");
                Vec::new()
            }
        },
        Err(e) => {
            eprintln!("  Search not configured ({e}), continuing without sources.");
            Vec::new()
        }
    };

    if !sources.is_empty() {
        println!();
        println!("  Sources:");
        for source in &sources {
            println!("    - {} ({})", source.name, source.url);
        }
        println!();
    }

    // --- Extraction ---
    eprint!("  Reading sources...");
    let sources = ExtractionStage::from_config(&config)
        .extract_all(sources)
        .await;
    eprint!("\r                    \r");

    // --- Prompt assembly + streamed reply ---
    let mut conversation = Conversation::new();
    conversation.push(Message::system(build_system_prompt(&sources, &level)));
    conversation.push(Message::user(&topic));

    let proxy = StreamProxy::new(CompletionClient::from_config(&config));
    let request = CompletionRequest::from_config(&config, conversation.messages.clone());
    let mut rx = proxy.open(request).await?;

    let mut consumer = StreamConsumer::new();
    let mut stdout = std::io::stdout();
    while let Some(item) = rx.recv().await {
        match item {
            Ok(frame) => {
                // Round-trip through the normalized wire form so the fold
                // sees exactly what a remote client would.
                for delta in consumer.feed(frame.to_sse().as_bytes(), &mut conversation) {
                    print!("{delta}");
                    stdout.flush()?;
                }
            }
            Err(e) => {
                eprintln!("\n  [Stream error] {e}");
                break;
            }
        }
    }
    println!();

    Ok(())
}
