//! Response type for command round-trips.

use std::time::Duration;

use super::SessionMode;

/// Outcome of one command round-trip.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was sent.
    pub command: String,

    /// Cleaned output: echo, control bytes, and the prompt removed.
    pub output: String,

    /// The raw capture for the same round-trip, untouched.
    pub output_raw: String,

    /// The prompt that ended the wait.
    pub prompt: String,

    /// Mode the session was in after the command.
    pub mode: SessionMode,

    /// Time from write to prompt.
    pub elapsed: Duration,

    /// Matched device error text, kept by the graceful send path.
    pub failure: Option<String>,
}

impl Response {
    /// Check whether the device accepted the command.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Iterate over the cleaned output lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }

    /// Check if the cleaned output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}
