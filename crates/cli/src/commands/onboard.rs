//! `bashpilot onboard`: first-time setup.

use bashpilot_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🐚 Bashpilot First-Time Setup");
    println!("=============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if !config_path.exists() {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config file: {}", config_path.display());
    } else {
        println!("  Config file exists, leaving it alone: {}", config_path.display());
    }

    let config = AppConfig::load_from(&config_path)?;
    for dir in [config.sessions_dir(), config.history_dir()] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            println!("✅ Created {}", dir.display());
        }
    }

    println!();
    println!("Next steps:");
    println!("  1. export ANTHROPIC_API_KEY='sk-ant-...'   (or put it in a .env file)");
    println!("  2. bashpilot config validate");
    println!("  3. bashpilot chat            (add --dry-run to only describe commands)");
    println!();
    Ok(())
}
