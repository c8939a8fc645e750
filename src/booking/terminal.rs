//! Ephemeral terminal session identifiers
//!
//! The booking backend requires a `terminal_id` on every protocol call. It is
//! a capability token scoped to one burst of day/slot calls against a single
//! center: generated fresh per burst, never persisted, never reused.

use rand::Rng;
use std::fmt;

/// An ephemeral per-burst terminal identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalId(String);

impl TerminalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a fresh terminal id: namespaced prefix, millisecond timestamp,
/// 6-digit random suffix.
///
/// Collision probability only needs to be negligible within one burst, not
/// globally: the timestamp already separates bursts, the random suffix
/// separates concurrent workers.
pub fn generate(prefix: &str) -> TerminalId {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    TerminalId(format!("{prefix}{millis}{suffix:06}"))
}
