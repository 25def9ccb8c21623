//! Per-million-token pricing.
//!
//! Prices are in USD per 1 million tokens, with separate input and output
//! rates. The ledger uses one fixed pricing for a whole session.

use serde::{Deserialize, Serialize};

/// Per-million-token pricing for a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens in USD.
    pub input_per_m: f64,
    /// Price per 1M output tokens in USD.
    pub output_per_m: f64,
}

impl ModelPricing {
    /// Create a new pricing entry.
    pub fn new(input_per_m: f64, output_per_m: f64) -> Self {
        Self {
            input_per_m,
            output_per_m,
        }
    }

    /// Built-in pricing for the known Anthropic models, matched by prefix so
    /// dated ids (`claude-3-5-sonnet-20241022`) resolve.
    pub fn for_model(model: &str) -> Option<Self> {
        const KNOWN: &[(&str, f64, f64)] = &[
            ("claude-3-5-sonnet", 3.0, 15.0),
            ("claude-3-7-sonnet", 3.0, 15.0),
            ("claude-sonnet-4", 3.0, 15.0),
            ("claude-3-5-haiku", 0.8, 4.0),
            ("claude-3-haiku", 0.25, 1.25),
            ("claude-3-opus", 15.0, 75.0),
            ("claude-opus-4", 15.0, 75.0),
        ];

        let bare = model.rsplit('/').next().unwrap_or(model).to_lowercase();
        KNOWN
            .iter()
            .filter(|(prefix, _, _)| bare.starts_with(prefix))
            .max_by_key(|(prefix, _, _)| prefix.len())
            .map(|&(_, input, output)| Self::new(input, output))
    }

    /// Cost of the input side.
    pub fn input_cost(&self, input_tokens: u64) -> f64 {
        input_tokens as f64 / 1_000_000.0 * self.input_per_m
    }

    /// Cost of the output side.
    pub fn output_cost(&self, output_tokens: u64) -> f64 {
        output_tokens as f64 / 1_000_000.0 * self.output_per_m
    }

    /// Compute cost for the given token counts.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        self.input_cost(input_tokens) + self.output_cost(output_tokens)
    }
}

impl Default for ModelPricing {
    /// Claude 3.5 Sonnet: $3 in / $15 out.
    fn default() -> Self {
        Self::new(3.0, 15.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_pricing_cost() {
        let p = ModelPricing::new(5.0, 15.0);
        // 500 input, 200 output → (500*5 + 200*15) / 1M = 0.0055
        assert!((p.cost(500, 200) - 0.0055).abs() < 1e-10);
    }

    #[test]
    fn default_is_sonnet_rates() {
        let p = ModelPricing::default();
        // 1000 in, 500 out → 0.003 + 0.0075
        assert!((p.cost(1000, 500) - 0.0105).abs() < 1e-10);
    }

    #[test]
    fn dated_model_ids_resolve() {
        let p = ModelPricing::for_model("claude-3-5-sonnet-20241022").unwrap();
        assert_eq!(p, ModelPricing::new(3.0, 15.0));
        let h = ModelPricing::for_model("anthropic/claude-3-5-haiku-20241022").unwrap();
        assert_eq!(h, ModelPricing::new(0.8, 4.0));
        assert!(ModelPricing::for_model("gpt-4o").is_none());
    }
}
