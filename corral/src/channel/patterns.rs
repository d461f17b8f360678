//! Expect candidates and prompt matching discipline.
//!
//! A wait is driven by a set of [`Expectation`]s tried in fixed priority
//! order: the literal current prompt and auto-answered continuations first,
//! error signatures next, mode-tagged prompt shapes, and the generic
//! any-vendor prompt shape last. Prompt matches must sit at the tail of the
//! buffer (only trailing whitespace after them) and start at a line
//! boundary, which keeps prompt-looking text inside command output from
//! ending a wait early.

use memchr::memrchr;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

/// Session mode a prompt shape testifies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// Login shell without privileged access (`Router>`).
    Unprivileged,
    /// Privileged shell (`Router#`).
    Privileged,
    /// Global configuration context (`Router(config)#`).
    ConfigGlobal,
    /// Nested configuration context (`Router(config-if)#`).
    ConfigSub,
}

/// A compiled prompt shape with a mode tag and negative matches.
#[derive(Debug, Clone)]
pub struct PromptPattern {
    mode: PromptMode,
    pattern: Regex,
    /// Strings that must NOT appear in the matched line.
    not_contains: Vec<String>,
}

impl PromptPattern {
    /// Compile a prompt shape, auto-anchoring it to the end of input.
    pub fn new(mode: PromptMode, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            mode,
            pattern: compile_prompt_pattern(pattern)?,
            not_contains: Vec::new(),
        })
    }

    /// Add a negative match checked against the matched line.
    pub fn not_contains(mut self, needle: impl Into<String>) -> Self {
        self.not_contains.push(needle.into());
        self
    }

    /// The mode this shape testifies to.
    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    /// Get a reference to the underlying regex.
    pub fn regex(&self) -> &Regex {
        &self.pattern
    }

    /// Find the tail-anchored match of this shape in `hay`.
    pub fn find(&self, hay: &[u8]) -> Option<(usize, usize)> {
        let (start, end) = find_tail_anchored(&self.pattern, hay)?;
        if !self.not_contains.is_empty() {
            let line = matched_line(hay, start, end);
            for nc in &self.not_contains {
                if line.contains(nc.as_str()) {
                    return None;
                }
            }
        }
        Some((start, end))
    }
}

/// One candidate in an expect wait.
#[derive(Debug, Clone)]
pub enum Expectation {
    /// Exact text of the last observed prompt, matched at the buffer tail.
    Literal(String),

    /// Auto-answered pagination or confirmation prompt. The reply is
    /// written verbatim (no newline added). The matched fragment is
    /// excised from the buffer, both to keep it out of command output and
    /// so the same pause is never answered twice.
    Continuation { pattern: Regex, reply: Vec<u8> },

    /// An authentication challenge (`Password:`) or other mid-line marker
    /// the caller answers itself. Completes the wait so the caller can
    /// respond and keep count of attempts.
    Challenge(Regex),

    /// Known device error signature. Recording one does not end the wait;
    /// the device still prints its prompt after the error text.
    Error { name: String, pattern: Regex },

    /// Mode-tagged prompt shape from the active catalog.
    Prompt(PromptPattern),

    /// Generic any-vendor prompt shape, the identification fallback.
    Generic(Regex),
}

impl Expectation {
    /// Build an error-signature candidate.
    pub fn error(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Error {
            name: name.into(),
            pattern: Regex::new(pattern)?,
        })
    }

    /// Build a continuation candidate.
    pub fn continuation(pattern: &str, reply: impl Into<Vec<u8>>) -> Result<Self, regex::Error> {
        Ok(Self::Continuation {
            pattern: Regex::new(pattern)?,
            reply: reply.into(),
        })
    }

    /// Candidate priority; lower is tried first.
    pub fn priority(&self) -> u8 {
        match self {
            Expectation::Literal(_) => 0,
            Expectation::Continuation { .. } => 1,
            Expectation::Challenge(_) => 2,
            Expectation::Error { .. } => 3,
            Expectation::Prompt(_) => 4,
            Expectation::Generic(_) => 5,
        }
    }
}

/// Compile a prompt pattern string into a regex.
///
/// Anchors the pattern to the end of input unless it already carries an
/// explicit anchor.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let pattern = if pattern.ends_with('$') {
        pattern.to_string()
    } else {
        format!("{}\\s*$", pattern)
    };

    Regex::new(&pattern)
}

/// The generic prompt shape: a short line ending in a common prompt
/// delimiter. Used before identification and as the no-catalog fallback.
pub fn generic_prompt() -> Regex {
    Regex::new(r"(?m)^[\w.\-@()/:~ ]{0,63}[>#%$\]]\s*$").expect("generic prompt pattern compiles")
}

/// Default password challenge shape (`Password:`, `password for admin:`).
pub fn password_prompt() -> Regex {
    Regex::new(r"(?i)password[^\r\n]*:\s*$").expect("password prompt pattern compiles")
}

/// Bytes tolerated after a prompt match at the buffer tail.
fn is_trailing_noise(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x00)
}

/// Whether `pos` sits at the start of a line (or of the buffer).
fn line_start(hay: &[u8], pos: usize) -> bool {
    pos == 0 || matches!(hay[pos - 1], b'\n' | b'\r' | 0x00)
}

/// The line containing a match span, as lossy UTF-8.
fn matched_line(hay: &[u8], start: usize, end: usize) -> String {
    let begin = memrchr(b'\n', &hay[..start]).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&hay[begin..end]).into_owned()
}

/// Find the last match of `pattern` that starts at a line boundary and is
/// followed only by trailing noise. Returns absolute offsets into `hay`.
pub fn find_tail_anchored(pattern: &Regex, hay: &[u8]) -> Option<(usize, usize)> {
    pattern
        .find_iter(hay)
        .filter(|m| line_start(hay, m.start()))
        .filter(|m| hay[m.end()..].iter().all(|&b| is_trailing_noise(b)))
        .map(|m| (m.start(), m.end()))
        .last()
}

/// Find `literal` at the very tail of `hay` (trailing noise tolerated),
/// starting at a line boundary.
pub fn find_tail_literal(literal: &str, hay: &[u8]) -> Option<(usize, usize)> {
    let lit = literal.as_bytes();
    if lit.is_empty() {
        return None;
    }
    let mut end = hay.len();
    while end > 0 && is_trailing_noise(hay[end - 1]) {
        end -= 1;
    }
    let start = end.checked_sub(lit.len())?;
    if &hay[start..end] == lit && line_start(hay, start) {
        Some((start, end))
    } else {
        None
    }
}
