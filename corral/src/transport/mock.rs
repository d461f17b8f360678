//! Scripted in-memory transport for engine and session tests.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;

use super::{ReadEvent, Transport};
use crate::error::{Result, TransportError};

/// One scripted read outcome.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Deliver these bytes on the next read.
    Data(Vec<u8>),

    /// Sleep this long, then deliver the bytes. The delay is taken in
    /// full even if it exceeds the caller's wait slice, so tests should
    /// keep delays inside the window they are probing.
    DelayedData(Duration, Vec<u8>),

    /// Sleep out the full wait slice, then deliver nothing.
    Idle,

    /// Fail the next read as disconnected.
    Disconnect,
}

impl Script {
    pub(crate) fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Script::Data(bytes.into())
    }

    pub(crate) fn delayed(delay: Duration, bytes: impl Into<Vec<u8>>) -> Self {
        Script::DelayedData(delay, bytes.into())
    }
}

/// Transport that plays back a fixed read script and records writes.
///
/// An exhausted script behaves like a silent device: reads sleep out their
/// wait slice and return [`ReadEvent::Idle`]. Timeout tests should run under
/// `#[tokio::test(start_paused = true)]` so the sleeps cost nothing.
pub(crate) struct MockTransport {
    script: VecDeque<Script>,
    pub(crate) writes: Vec<Vec<u8>>,
    pub(crate) closed: bool,
}

impl MockTransport {
    pub(crate) fn new(script: impl IntoIterator<Item = Script>) -> Self {
        Self {
            script: script.into_iter().collect(),
            writes: Vec::new(),
            closed: false,
        }
    }

    /// Everything written so far, as one lossy UTF-8 string.
    pub(crate) fn written(&self) -> String {
        let joined: Vec<u8> = self.writes.iter().flatten().copied().collect();
        String::from_utf8_lossy(&joined).into_owned()
    }

    /// Queue more scripted reads after the fact.
    pub(crate) fn push(&mut self, item: Script) {
        self.script.push_back(item);
    }
}

impl Transport for MockTransport {
    async fn read_chunk(&mut self, max_wait: Duration) -> Result<ReadEvent> {
        if self.closed {
            return Err(TransportError::Disconnected.into());
        }
        match self.script.pop_front() {
            Some(Script::Data(bytes)) => Ok(ReadEvent::Data(Bytes::from(bytes))),
            Some(Script::DelayedData(delay, bytes)) => {
                tokio::time::sleep(delay).await;
                Ok(ReadEvent::Data(Bytes::from(bytes)))
            }
            Some(Script::Idle) | None => {
                tokio::time::sleep(max_wait).await;
                Ok(ReadEvent::Idle)
            }
            Some(Script::Disconnect) => Err(TransportError::Disconnected.into()),
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Disconnected.into());
        }
        self.writes.push(data.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
