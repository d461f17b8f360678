//! Tunable knobs for a session.

use std::time::Duration;

use crate::channel::EngineConfig;

/// Tunable knobs for a [`Session`](super::Session).
///
/// The defaults suit interactive network gear. Slow operations (`copy`,
/// image transfers, long `show tech-support`) usually only need a larger
/// `command_timeout`; the window already extends itself while the device
/// keeps printing.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Idle window for one wait. Expiring means the device went quiet
    /// without printing a prompt; any received bytes reset it.
    pub command_timeout: Duration,

    /// Hard cap on one wait, as a multiple of `command_timeout`. Bounds
    /// a device that keeps printing without ever prompting.
    pub overall_cap: u32,

    /// Byte written to terminate a command line.
    pub newline: u8,

    /// Byte written to erase one character.
    pub backspace: u8,

    /// Initial capacity of the receive buffer.
    pub buffer_size: usize,

    /// How far back from the buffer tail prompt matching looks.
    pub search_depth: usize,

    /// Pause between writing a command and matching its output, for
    /// devices that flush in bursts.
    pub settle: Duration,

    /// Mirror everything received to stdout.
    pub echo: bool,

    /// Log every received chunk at trace level.
    pub trace_reads: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(60),
            overall_cap: 6,
            newline: b'\r',
            backspace: 0x08,
            buffer_size: 4096,
            search_depth: 1000,
            settle: Duration::ZERO,
            echo: false,
            trace_reads: false,
        }
    }
}

impl SessionOptions {
    /// The engine view of these options.
    pub(crate) fn engine(&self) -> EngineConfig {
        EngineConfig {
            idle_window: self.command_timeout,
            overall_cap: self.overall_cap,
            search_depth: self.search_depth,
            buffer_capacity: self.buffer_size,
            echo: self.echo,
            trace_reads: self.trace_reads,
        }
    }
}
