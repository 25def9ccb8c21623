//! Token usage ledger for one session.

use serde::{Deserialize, Serialize};

use crate::pricing::ModelPricing;

/// Accumulated token usage of a session.
///
/// Counters only grow. Updated once per provider call and priced on demand.
#[derive(Debug, Clone, Default)]
pub struct UsageLedger {
    pricing: ModelPricing,
    input_tokens: u64,
    output_tokens: u64,
    calls: u64,
}

/// Token totals and their cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

impl UsageLedger {
    pub fn new(pricing: ModelPricing) -> Self {
        Self {
            pricing,
            ..Default::default()
        }
    }

    /// Record one provider call.
    pub fn add(&mut self, input_tokens: u64, output_tokens: u64) {
        self.input_tokens = self.input_tokens.saturating_add(input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(output_tokens);
        self.calls += 1;
    }

    /// Number of `add` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn pricing(&self) -> ModelPricing {
        self.pricing
    }

    pub fn summary(&self) -> CostSummary {
        let input_cost = self.pricing.input_cost(self.input_tokens);
        let output_cost = self.pricing.output_cost(self.output_tokens);
        CostSummary {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }
}

impl CostSummary {
    /// The summary as log lines, one figure per line.
    pub fn log_lines(&self) -> Vec<String> {
        vec![
            format!("Total input tokens: {}", self.input_tokens),
            format!("Total output tokens: {}", self.output_tokens),
            format!("Total input cost: ${:.6}", self.input_cost),
            format!("Total output cost: ${:.6}", self.output_cost),
            format!("Total cost: ${:.6}", self.total_cost),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger_costs_nothing() {
        let summary = UsageLedger::default().summary();
        assert_eq!(summary.input_tokens, 0);
        assert!((summary.total_cost - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_prices_each_side() {
        let mut ledger = UsageLedger::new(ModelPricing::new(3.0, 15.0));
        ledger.add(1_000_000, 100_000);
        let s = ledger.summary();
        assert!((s.input_cost - 3.0).abs() < 1e-10);
        assert!((s.output_cost - 1.5).abs() < 1e-10);
        assert!((s.total_cost - 4.5).abs() < 1e-10);
        assert_eq!(ledger.calls(), 1);
    }

    #[test]
    fn add_is_additive() {
        let mut split = UsageLedger::default();
        split.add(1200, 340);
        split.add(800, 60);

        let mut once = UsageLedger::default();
        once.add(2000, 400);

        assert_eq!(split.summary(), once.summary());
    }

    #[test]
    fn log_lines_format_costs() {
        let mut ledger = UsageLedger::default();
        ledger.add(1000, 500);
        let lines = ledger.summary().log_lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Total input tokens: 1000");
        assert_eq!(lines[2], "Total input cost: $0.003000");
        assert_eq!(lines[4], "Total cost: $0.010500");
    }
}
