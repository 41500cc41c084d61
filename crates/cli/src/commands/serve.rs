//! `tutorforge serve` — Start the HTTP API server.

use tutorforge_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("📚 TutorForge Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "   Admission: {}",
        if config.admission.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    tutorforge_gateway::start(config).await?;

    Ok(())
}
