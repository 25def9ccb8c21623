//! Session identity and the per-session environment snapshot.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a session, derived from the local start time
/// (`YYYYMMDD-HH:MM:SS-ffffff`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Local::now().format("%Y%m%d-%H:%M:%S-%6f").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The environment every command of a session runs with.
///
/// Starts as a copy of the process environment. Commands run in fresh
/// subprocesses, so nothing they export survives; only an explicit restart
/// replaces the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Replace the snapshot with a fresh copy of the process environment.
    pub fn reset(&mut self) {
        *self = Self::from_process();
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_shape() {
        let id = SessionId::generate();
        // 20241022-13:45:07-123456
        assert_eq!(id.as_str().len(), 24);
        assert_eq!(&id.as_str()[8..9], "-");
        assert_eq!(&id.as_str()[17..18], "-");
    }

    #[test]
    fn snapshot_contains_path() {
        let env = Environment::from_process();
        assert_eq!(env.get("PATH").map(str::to_owned), std::env::var("PATH").ok());
    }

    #[test]
    fn reset_discards_local_changes() {
        let mut env = Environment::from_process();
        env.set("BASHPILOT_TEST_ONLY_VAR", "1");
        assert_eq!(env.get("BASHPILOT_TEST_ONLY_VAR"), Some("1"));
        env.reset();
        assert_eq!(env.get("BASHPILOT_TEST_ONLY_VAR"), None);
    }
}
