//! `bashpilot config`: configuration management commands.

use bashpilot_config::AppConfig;

/// Warnings for a config that parses but won't work well.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.has_api_key() {
        warnings.push("No API key set (set ANTHROPIC_API_KEY or api_key in config.toml)".into());
    }
    if !config.shell.path.exists() {
        warnings.push(format!("Shell not found: {}", config.shell.path.display()));
    }
    if config.logging.backup_count == 0 {
        warnings.push("logging.backup_count = 0 discards old session logs on rotation".into());
    }

    warnings
}

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Model:     {}", config.model);
            println!("   Shell:     {}", config.shell.path.display());
            println!("   Dry run:   {}", config.dry_run);
            println!("   Rounds:    {}", config.agent.max_rounds);
            println!("   Sessions:  {}", config.sessions_dir().display());
            println!("   History:   {}", config.history_dir().display());
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
