//! `tutorforge status` — Show the effective configuration.

use tutorforge_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("📚 TutorForge Status");
    println!("====================");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Completion:    {}", config.completion.provider);
    println!("  Model:         {}", config.completion.model);
    println!("  Temperature:   {}", config.completion.temperature);
    println!("  Search:        {}", config.search.provider);
    println!(
        "  Fetch timeout: {}ms per source",
        config.extraction.fetch_timeout_ms
    );
    println!(
        "  Gateway:       {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!(
        "  Admission:     {}",
        if config.admission.enabled {
            format!(
                "{} requests / {} min",
                config.admission.max_requests, config.admission.window_minutes
            )
        } else {
            "disabled".into()
        }
    );
    println!("  Default level: {}", config.default_level);
    println!(
        "  API key:       {}",
        if config.has_api_key() { "set" } else { "missing" }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `tutorforge onboard` first");
    }

    Ok(())
}
