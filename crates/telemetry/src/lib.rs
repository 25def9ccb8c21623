//! Session logging and cost tracking for Bashpilot.
//!
//! Both are per-session objects: a [`SessionLog`] writes one rotating log
//! file per session and mirrors every record to `tracing`; a [`UsageLedger`]
//! accumulates token counts and prices them at fixed per-million rates.

pub mod ledger;
pub mod pricing;
pub mod session_log;

pub use ledger::{CostSummary, UsageLedger};
pub use pricing::ModelPricing;
pub use session_log::{LogLevel, LogRotation, ScopedLog, SessionLog};
