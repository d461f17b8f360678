//! The expect loop: accumulate bytes, match candidates, classify results.
//!
//! A wait runs under an adaptive deadline: the idle window resets whenever
//! bytes arrive, so a device that is slow but still talking is not cut off,
//! while a hard cap (a multiple of the window) bounds the total wall time
//! against a device that keeps printing without ever prompting.

use std::time::Duration;

use bytes::Bytes;
use log::{debug, trace};
use tokio::time::Instant;

use super::buffer::ExpectBuffer;
use super::patterns::{Expectation, PromptMode, find_tail_anchored, find_tail_literal};
use crate::error::{ExpectError, Result};
use crate::transport::{ReadEvent, Transport};

/// Tuning for the expect loop.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Idle window for a wait; resets whenever bytes arrive.
    pub idle_window: Duration,

    /// Hard cap on a wait, as a multiple of the idle window.
    pub overall_cap: u32,

    /// How many bytes from the buffer end are searched for prompts.
    pub search_depth: usize,

    /// Initial capacity of the accumulation buffer.
    pub buffer_capacity: usize,

    /// Mirror received bytes to stdout as they arrive.
    pub echo: bool,

    /// Log every received chunk at trace level.
    pub trace_reads: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_window: Duration::from_secs(60),
            overall_cap: 6,
            search_depth: 1000,
            buffer_capacity: 4096,
            echo: false,
            trace_reads: false,
        }
    }
}

/// Which candidate completed a wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedPattern {
    /// The literal current prompt; testifies the mode did not change.
    Literal { text: String },

    /// An authentication challenge awaiting an answer.
    Challenge { text: String },

    /// A mode-tagged prompt shape.
    Prompt { mode: PromptMode, text: String },

    /// The generic prompt shape; carries no mode evidence.
    Generic { text: String },
}

impl MatchedPattern {
    /// The matched text, trimmed.
    pub fn text(&self) -> &str {
        match self {
            MatchedPattern::Literal { text }
            | MatchedPattern::Challenge { text }
            | MatchedPattern::Prompt { text, .. }
            | MatchedPattern::Generic { text } => text,
        }
    }

    /// The mode this match testifies to, when it testifies to one.
    pub fn mode(&self) -> Option<PromptMode> {
        match self {
            MatchedPattern::Prompt { mode, .. } => Some(*mode),
            _ => None,
        }
    }
}

/// A recorded error-signature hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorHit {
    /// Signature name from the catalog.
    pub name: String,

    /// The text the signature matched.
    pub matched: String,
}

/// A completed wait.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Which candidate completed the wait.
    pub hit: MatchedPattern,

    /// Raw bytes that accumulated before the match.
    pub before: Bytes,

    /// The matched bytes themselves.
    pub matched: Bytes,

    /// Error signatures that matched along the way.
    pub error_hits: Vec<ErrorHit>,

    /// Wall time the wait took.
    pub elapsed: Duration,
}

/// Result of one wait: a match, or an expiry with whatever accumulated.
#[derive(Debug, Clone)]
pub enum WaitResult {
    /// A completing candidate matched.
    Matched(MatchOutcome),

    /// The idle window (or the hard cap) expired with no completing match.
    /// Buffered bytes stay in the engine; `buffered` is a lossy copy for
    /// reporting. Error hits recorded before the expiry are preserved so
    /// callers can classify a rejected command whose prompt never returned.
    TimedOut {
        waited: Duration,
        buffered: String,
        error_hits: Vec<ErrorHit>,
    },
}

impl WaitResult {
    /// Unwrap a match, converting an expiry into [`ExpectError::Timeout`].
    pub fn into_matched(self, window: Duration) -> Result<MatchOutcome> {
        match self {
            WaitResult::Matched(outcome) => Ok(outcome),
            WaitResult::TimedOut {
                waited, buffered, ..
            } => Err(ExpectError::Timeout {
                waited,
                window,
                buffered,
            }
            .into()),
        }
    }
}

/// What one scan pass over the buffer produced.
enum ScanStep {
    /// A completing candidate matched; buffer already split.
    Complete {
        idx: usize,
        before: Bytes,
        matched: Bytes,
    },

    /// A continuation was answered; scan again before reading.
    Answered,

    /// Nothing completed.
    None,
}

/// The expect engine: one transport, one accumulation buffer.
pub struct ExpectEngine<T> {
    transport: T,
    buffer: ExpectBuffer,
    config: EngineConfig,
}

impl<T: Transport> ExpectEngine<T> {
    /// Create an engine over a transport.
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self {
            buffer: ExpectBuffer::new(config.search_depth, config.buffer_capacity),
            transport,
            config,
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bytes accumulated but not yet consumed by a match.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Write bytes to the transport.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.transport.write_all(data).await
    }

    /// Close the transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Tear the engine apart into the transport and the unconsumed residue.
    pub fn into_parts(mut self) -> (T, Bytes) {
        (self.transport, self.buffer.take().freeze())
    }

    /// Wait until one of `candidates` completes, the idle window closes,
    /// or the hard cap is reached.
    ///
    /// Candidates are tried in [`Expectation::priority`] order, declaration
    /// order within a priority. Error signatures record without completing;
    /// continuations are answered inline. Bytes after a match stay buffered
    /// for the next wait.
    pub async fn await_match(
        &mut self,
        candidates: &[Expectation],
        window: Duration,
    ) -> Result<WaitResult> {
        let started = Instant::now();
        let cap = self.config.overall_cap.max(1);
        let hard_deadline = started + window * cap;
        let mut idle_deadline = started + window;

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by_key(|&i| candidates[i].priority());

        let mut error_hits: Vec<ErrorHit> = Vec::new();
        let mut error_seen = vec![false; candidates.len()];

        loop {
            match self
                .scan_once(candidates, &order, &mut error_hits, &mut error_seen)
                .await?
            {
                ScanStep::Complete {
                    idx,
                    before,
                    matched,
                } => {
                    let text = String::from_utf8_lossy(&matched).trim().to_string();
                    let hit = match &candidates[idx] {
                        Expectation::Literal(_) => MatchedPattern::Literal { text },
                        Expectation::Challenge(_) => MatchedPattern::Challenge { text },
                        Expectation::Prompt(p) => MatchedPattern::Prompt {
                            mode: p.mode(),
                            text,
                        },
                        Expectation::Generic(_) => MatchedPattern::Generic { text },
                        // Continuations and errors never complete a wait.
                        _ => unreachable!("non-completing candidate completed"),
                    };
                    return Ok(WaitResult::Matched(MatchOutcome {
                        hit,
                        before,
                        matched,
                        error_hits,
                        elapsed: started.elapsed(),
                    }));
                }
                ScanStep::Answered => {
                    // Progress was made; give the device a fresh window.
                    idle_deadline = Instant::now() + window;
                    continue;
                }
                ScanStep::None => {}
            }

            let now = Instant::now();
            let deadline = idle_deadline.min(hard_deadline);
            if now >= deadline {
                debug!(
                    "expect wait expired after {:?} with {} bytes buffered",
                    now - started,
                    self.buffer.len()
                );
                return Ok(WaitResult::TimedOut {
                    waited: now - started,
                    buffered: self.buffer.as_str_lossy().into_owned(),
                    error_hits,
                });
            }

            match self.transport.read_chunk(deadline - now).await? {
                ReadEvent::Data(chunk) => {
                    if self.config.trace_reads {
                        trace!("read {} bytes: {:?}", chunk.len(), String::from_utf8_lossy(&chunk));
                    }
                    if self.config.echo {
                        use std::io::Write as _;
                        let mut out = std::io::stdout();
                        let _ = out.write_all(&chunk);
                        let _ = out.flush();
                    }
                    self.buffer.extend(&chunk);
                    idle_deadline = Instant::now() + window;
                }
                ReadEvent::Idle => {}
            }
        }
    }

    /// One pass over the buffered tail: record error hits, answer at most
    /// one continuation, or split the buffer at a completing match.
    async fn scan_once(
        &mut self,
        candidates: &[Expectation],
        order: &[usize],
        error_hits: &mut Vec<ErrorHit>,
        error_seen: &mut [bool],
    ) -> Result<ScanStep> {
        enum Action {
            Complete(usize, usize, usize),
            Answer(usize, usize, usize),
        }

        let action = {
            let (tail, offset) = self.buffer.tail();

            // Error signatures record first. They never complete a wait, and
            // a prompt arriving in the same chunk as the rejection must not
            // hide them.
            for &idx in order {
                if let Expectation::Error { name, pattern } = &candidates[idx]
                    && !error_seen[idx]
                    && let Some(m) = pattern.find(tail)
                {
                    error_seen[idx] = true;
                    error_hits.push(ErrorHit {
                        name: name.clone(),
                        matched: String::from_utf8_lossy(m.as_bytes()).into_owned(),
                    });
                    debug!("error signature '{}' matched", name);
                }
            }

            let mut found: Option<Action> = None;
            for &idx in order {
                match &candidates[idx] {
                    Expectation::Literal(text) => {
                        if let Some((s, e)) = find_tail_literal(text, tail) {
                            found = Some(Action::Complete(idx, offset + s, offset + e));
                            break;
                        }
                    }
                    Expectation::Continuation { pattern, .. } => {
                        if let Some((s, e)) = find_tail_loose(pattern, tail) {
                            found = Some(Action::Answer(idx, offset + s, offset + e));
                            break;
                        }
                    }
                    Expectation::Challenge(pattern) => {
                        if let Some((s, e)) = find_tail_loose(pattern, tail) {
                            found = Some(Action::Complete(idx, offset + s, offset + e));
                            break;
                        }
                    }
                    Expectation::Error { .. } => {}
                    Expectation::Prompt(shape) => {
                        if let Some((s, e)) = shape.find(tail) {
                            found = Some(Action::Complete(idx, offset + s, offset + e));
                            break;
                        }
                    }
                    Expectation::Generic(pattern) => {
                        if let Some((s, e)) = find_tail_anchored(pattern, tail) {
                            found = Some(Action::Complete(idx, offset + s, offset + e));
                            break;
                        }
                    }
                }
            }
            found
        };

        match action {
            Some(Action::Complete(idx, start, end)) => {
                let (before, matched) = self.buffer.split_at_match(start, end);
                Ok(ScanStep::Complete {
                    idx,
                    before,
                    matched,
                })
            }
            Some(Action::Answer(idx, start, end)) => {
                let Expectation::Continuation { reply, .. } = &candidates[idx] else {
                    unreachable!("answer action on non-continuation");
                };
                let reply = reply.clone();
                self.buffer.excise(start, end);
                debug!("answered continuation at byte {}", start);
                self.transport.write_all(&reply).await?;
                Ok(ScanStep::Answered)
            }
            None => Ok(ScanStep::None),
        }
    }
}

/// Find the last match followed only by trailing noise, with no
/// line-start requirement. Continuations and challenges often trail
/// other text on the same line (`Proceed? [confirm]`).
fn find_tail_loose(pattern: &regex::bytes::Regex, hay: &[u8]) -> Option<(usize, usize)> {
    pattern
        .find_iter(hay)
        .filter(|m| {
            hay[m.end()..]
                .iter()
                .all(|&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x00))
        })
        .map(|m| (m.start(), m.end()))
        .last()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::channel::patterns::{PromptPattern, generic_prompt};
    use crate::transport::mock::{MockTransport, Script};

    fn engine(script: Vec<Script>, window_secs: u64) -> ExpectEngine<MockTransport> {
        let config = EngineConfig {
            idle_window: Duration::from_secs(window_secs),
            overall_cap: 6,
            ..Default::default()
        };
        ExpectEngine::new(MockTransport::new(script), config)
    }

    fn literal(text: &str) -> Expectation {
        Expectation::Literal(text.to_string())
    }

    #[tokio::test]
    async fn test_literal_prompt_completes_wait() {
        let mut eng = engine(
            vec![Script::data("show ver\r\nCisco IOS Software\r\nRouter>")],
            5,
        );
        let result = eng
            .await_match(&[literal("Router>")], Duration::from_secs(5))
            .await
            .unwrap();

        let WaitResult::Matched(outcome) = result else {
            panic!("expected a match");
        };
        assert_eq!(outcome.hit.text(), "Router>");
        assert_eq!(&outcome.before[..], b"show ver\r\nCisco IOS Software\r\n");
        assert!(outcome.error_hits.is_empty());
    }

    #[tokio::test]
    async fn test_chunking_does_not_change_the_outcome() {
        let stream = b"show ver\r\nCisco IOS Software\r\nRouter>".to_vec();

        let one_shot = {
            let mut eng = engine(vec![Script::Data(stream.clone())], 5);
            eng.await_match(&[literal("Router>")], Duration::from_secs(5))
                .await
                .unwrap()
        };
        let dribbled = {
            let script = stream
                .chunks(3)
                .map(|c| Script::Data(c.to_vec()))
                .collect::<Vec<_>>();
            let mut eng = engine(script, 5);
            eng.await_match(&[literal("Router>")], Duration::from_secs(5))
                .await
                .unwrap()
        };

        let (WaitResult::Matched(a), WaitResult::Matched(b)) = (one_shot, dribbled) else {
            panic!("expected matches");
        };
        assert_eq!(a.before, b.before);
        assert_eq!(a.hit, b.hit);
    }

    #[tokio::test]
    async fn test_residue_survives_into_the_next_wait() {
        let mut eng = engine(
            vec![
                Script::data("out\r\nRouter>\r\n"),
                Script::data("%SYS-5-CONFIG_I: drift\r\nRouter>"),
            ],
            5,
        );

        let first = eng
            .await_match(&[literal("Router>")], Duration::from_secs(5))
            .await
            .unwrap();
        let WaitResult::Matched(_) = first else {
            panic!("expected a match");
        };
        // Trailing newline after the prompt stays buffered.
        assert_eq!(eng.buffered(), b"\r\n");

        let second = eng
            .await_match(&[literal("Router>")], Duration::from_secs(5))
            .await
            .unwrap();
        let WaitResult::Matched(outcome) = second else {
            panic!("expected a match");
        };
        assert_eq!(&outcome.before[..], b"\r\n%SYS-5-CONFIG_I: drift\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_window_resets_on_arrival() {
        let gap = Duration::from_secs(4);
        let mut eng = engine(
            vec![
                Script::delayed(gap, "part one "),
                Script::delayed(gap, "part two\r\n"),
                Script::delayed(gap, "Router>"),
            ],
            5,
        );

        // Total wait is 12s against a 5s idle window; every arrival
        // resets the window so the wait still completes.
        let result = eng
            .await_match(&[literal("Router>")], Duration::from_secs(5))
            .await
            .unwrap();
        let WaitResult::Matched(outcome) = result else {
            panic!("expected a match");
        };
        assert!(outcome.elapsed >= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_expires_the_window() {
        let mut eng = engine(vec![], 5);
        let result = eng
            .await_match(&[literal("Router>")], Duration::from_secs(5))
            .await
            .unwrap();

        let WaitResult::TimedOut { waited, .. } = result else {
            panic!("expected a timeout");
        };
        assert!(waited >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_cap_stops_a_babbling_device() {
        let drip = (0..20)
            .map(|_| Script::delayed(Duration::from_secs(1), "noise\r\n"))
            .collect::<Vec<_>>();
        let config = EngineConfig {
            idle_window: Duration::from_secs(2),
            overall_cap: 3,
            ..Default::default()
        };
        let mut eng = ExpectEngine::new(MockTransport::new(drip), config);

        let result = eng
            .await_match(&[literal("Router>")], Duration::from_secs(2))
            .await
            .unwrap();
        let WaitResult::TimedOut { waited, .. } = result else {
            panic!("expected a timeout");
        };
        // Capped at 3x the window even though data kept arriving.
        assert!(waited >= Duration::from_secs(6));
        assert!(waited < Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_error_hits_record_without_ending_the_wait() {
        let mut eng = engine(
            vec![Script::data(
                "bad\r\n% Invalid input detected at '^' marker.\r\nRouter#",
            )],
            5,
        );
        let candidates = [
            literal("Router#"),
            Expectation::error("invalid input", r"(?m)^% Invalid input").unwrap(),
        ];

        let result = eng
            .await_match(&candidates, Duration::from_secs(5))
            .await
            .unwrap();
        let WaitResult::Matched(outcome) = result else {
            panic!("expected a match");
        };
        assert_eq!(outcome.hit.text(), "Router#");
        assert_eq!(outcome.error_hits.len(), 1);
        assert_eq!(outcome.error_hits[0].name, "invalid input");
    }

    #[tokio::test]
    async fn test_continuation_answers_pagination() {
        let mut eng = engine(
            vec![
                Script::data("page one\r\n --More-- "),
                Script::data("\rpage two\r\nRouter>"),
            ],
            5,
        );
        let candidates = [
            literal("Router>"),
            Expectation::continuation(r"--More--", " ").unwrap(),
        ];

        let result = eng
            .await_match(&candidates, Duration::from_secs(5))
            .await
            .unwrap();
        let WaitResult::Matched(outcome) = result else {
            panic!("expected a match");
        };

        let before = String::from_utf8_lossy(&outcome.before);
        assert!(before.contains("page one"));
        assert!(before.contains("page two"));
        assert!(!before.contains("--More--"));

        let (transport, _) = eng.into_parts();
        assert_eq!(transport.written(), " ");
    }

    #[tokio::test]
    async fn test_shape_outranks_generic_and_carries_mode() {
        let shape = PromptPattern::new(PromptMode::ConfigGlobal, r"[\w.\-]+\(config\)#").unwrap();
        let candidates = [
            Expectation::Generic(generic_prompt()),
            Expectation::Prompt(shape),
        ];

        let mut eng = engine(vec![Script::data("set\r\nRouter(config)#")], 5);
        let result = eng
            .await_match(&candidates, Duration::from_secs(5))
            .await
            .unwrap();
        let WaitResult::Matched(outcome) = result else {
            panic!("expected a match");
        };
        assert_eq!(outcome.hit.mode(), Some(PromptMode::ConfigGlobal));
        assert_eq!(outcome.hit.text(), "Router(config)#");
    }

    #[tokio::test]
    async fn test_disconnect_propagates_as_error() {
        let mut eng = engine(vec![Script::Disconnect], 5);
        let err = eng
            .await_match(&[literal("Router>")], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Transport(crate::error::TransportError::Disconnected)
        ));
    }
}
