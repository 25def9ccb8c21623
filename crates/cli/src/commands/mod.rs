pub mod agent;
pub mod config_cmd;
pub mod history;
pub mod onboard;
pub mod usage;
