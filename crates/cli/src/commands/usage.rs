//! `bashpilot usage`: token cost tools.

use bashpilot_config::AppConfig;
use bashpilot_telemetry::{ModelPricing, UsageLedger};

/// Resolve the rates to price with: a known model's, or the configured ones.
fn pricing(config: &AppConfig, model: Option<&str>) -> Result<ModelPricing, String> {
    match model {
        Some(model) => {
            ModelPricing::for_model(model).ok_or_else(|| format!("No built-in pricing for {model}"))
        }
        None => Ok(ModelPricing::new(
            config.pricing.input_per_m,
            config.pricing.output_per_m,
        )),
    }
}

/// Print what a token count would cost.
pub fn estimate(
    input_tokens: u64,
    output_tokens: u64,
    model: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let pricing = pricing(&config, model)?;

    let mut ledger = UsageLedger::new(pricing);
    ledger.add(input_tokens, output_tokens);

    println!("📊 Cost Estimate");
    println!("─────────────────────────────────────");
    println!(
        "  Rates: ${:.3} in / ${:.3} out per 1M tokens",
        pricing.input_per_m, pricing.output_per_m
    );
    for line in ledger.summary().log_lines() {
        println!("  {line}");
    }
    Ok(())
}
