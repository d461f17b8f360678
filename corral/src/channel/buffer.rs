//! Accumulation buffer with tail-search optimization.
//!
//! Only the last N bytes are searched for prompt patterns rather than the
//! entire output; for large captures (full routing tables) this is critical
//! for performance. Bytes are stored raw; control sequences are resolved
//! later by the cleaner, so raw output stays intact.

use bytes::{Bytes, BytesMut};

/// Buffer for accumulating session output and splitting it at matches.
///
/// Bytes after a match are never discarded; they stay buffered as the
/// residue seeding the next wait.
#[derive(Debug)]
pub struct ExpectBuffer {
    /// The accumulated output.
    buffer: BytesMut,

    /// How many bytes from the end to search for prompt patterns.
    search_depth: usize,
}

impl ExpectBuffer {
    /// Create a buffer with the given tail-search depth and initial capacity.
    pub fn new(search_depth: usize, capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            search_depth,
        }
    }

    /// Append raw bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// The tail slice to search for prompts, plus its offset into the
    /// full buffer. Match positions found in the slice translate to
    /// absolute positions by adding the offset.
    pub fn tail(&self) -> (&[u8], usize) {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        (&self.buffer[start..], start)
    }

    /// Split the buffer at an absolute match span.
    ///
    /// Returns `(before, matched)`; everything past `end` remains buffered.
    pub fn split_at_match(&mut self, start: usize, end: usize) -> (Bytes, Bytes) {
        debug_assert!(start <= end && end <= self.buffer.len());
        let before = self.buffer.split_to(start).freeze();
        let matched = self.buffer.split_to(end - start).freeze();
        (before, matched)
    }

    /// Remove an absolute span from the buffer, keeping what follows.
    ///
    /// Used to excise auto-answered continuation prompts so they do not
    /// surface in command output.
    pub fn excise(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && end <= self.buffer.len());
        let len = self.buffer.len();
        self.buffer.copy_within(end..len, start);
        self.buffer.truncate(len - (end - start));
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> BytesMut {
        std::mem::take(&mut self.buffer)
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}
