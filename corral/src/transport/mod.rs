//! Byte-stream transport layer.
//!
//! The session engine consumes any duplex byte stream through the
//! [`Transport`] trait. [`SshTransport`] is the production implementation,
//! wrapping a russh PTY shell channel; tests drive the engine with a
//! scripted in-memory transport instead.

pub mod config;
#[cfg(test)]
pub(crate) mod mock;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// Outcome of a single bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// Bytes arrived. Never empty.
    Data(Bytes),

    /// Nothing arrived within the wait window. Not an error; the expect
    /// loop decides whether the overall wait has expired.
    Idle,
}

/// A duplex byte stream with bounded reads.
///
/// Reads must return [`ReadEvent::Idle`] when nothing arrives within
/// `max_wait`, and fail with [`TransportError::Disconnected`] once the peer
/// has closed the stream.
///
/// [`TransportError::Disconnected`]: crate::error::TransportError::Disconnected
pub trait Transport: Send {
    /// Read one chunk, waiting at most `max_wait`.
    fn read_chunk(&mut self, max_wait: Duration)
    -> impl Future<Output = Result<ReadEvent>> + Send;

    /// Write all bytes to the stream.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Close the stream. Closing an already-closed transport is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
