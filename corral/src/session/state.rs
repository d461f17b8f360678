//! Session mode tracking driven by prompt evidence.
//!
//! The session never infers its mode from the commands it sends. Every mode
//! change is backed by a prompt the device actually printed: an exec prompt
//! clears the configuration stack, a global configuration prompt resets it
//! to one level, and a sub-context prompt either pushes a new level or
//! unwinds back to the level that printed the same text before.

use std::fmt;

use crate::channel::PromptMode;
use crate::error::StateViolation;

/// Where the session currently sits on the device CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    /// Connected, login not finished.
    Unauthenticated,

    /// Exec prompt without privileged access (`Router>`).
    Unprivileged,

    /// Privileged exec prompt (`Router#`).
    Privileged,

    /// Global configuration context (`Router(config)#`).
    ConfigGlobal,

    /// Nested configuration context (`Router(config-if)#`).
    ConfigSub,

    /// The transport was handed to the caller; terminal.
    InteractiveHandoff,

    /// The session was closed; terminal.
    Closed,
}

impl SessionMode {
    /// True for modes that accept no further operations.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionMode::InteractiveHandoff | SessionMode::Closed)
    }

    /// True when the session sits in any configuration context.
    pub fn in_config(self) -> bool {
        matches!(self, SessionMode::ConfigGlobal | SessionMode::ConfigSub)
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionMode::Unauthenticated => "unauthenticated",
            SessionMode::Unprivileged => "unprivileged",
            SessionMode::Privileged => "privileged",
            SessionMode::ConfigGlobal => "configuration",
            SessionMode::ConfigSub => "sub-configuration",
            SessionMode::InteractiveHandoff => "interactive",
            SessionMode::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Derive the stable prefix of a prompt, usually the device hostname.
///
/// Drops trailing whitespace, one trailing delimiter character, and one
/// trailing parenthesized context, so `switch(config-if)#`, `switch#`
/// and `switch>` all reduce to `switch`.
pub fn prompt_prefix(prompt: &str) -> String {
    let mut text = prompt.trim();
    if let Some(stripped) =
        text.strip_suffix(|c: char| matches!(c, '>' | '#' | '%' | '$' | ']' | ':'))
    {
        text = stripped.trim_end();
    }
    if text.ends_with(')') {
        let mut depth = 0usize;
        for (i, c) in text.char_indices().rev() {
            match c {
                ')' => depth += 1,
                '(' => {
                    depth -= 1;
                    if depth == 0 {
                        text = &text[..i];
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    text.trim_end().to_string()
}

/// Evidence-driven mode and configuration-depth tracking.
///
/// The configuration stack holds the prompt text of each nested context,
/// outermost first; its length is the configuration depth. Prompt evidence
/// can never drive the depth negative, and the pop primitive reports
/// [`StateViolation::ConfigUnderflow`] instead of saturating silently.
#[derive(Debug)]
pub(crate) struct ModeTracker {
    mode: SessionMode,
    config_stack: Vec<String>,
}

impl ModeTracker {
    pub(crate) fn new(initial: SessionMode) -> Self {
        Self {
            mode: initial,
            config_stack: Vec::new(),
        }
    }

    pub(crate) fn mode(&self) -> SessionMode {
        self.mode
    }

    pub(crate) fn depth(&self) -> usize {
        self.config_stack.len()
    }

    /// Force a mode outside the configuration stack (close, handoff,
    /// connect classification). Leaving config drops the stack.
    pub(crate) fn set_mode(&mut self, mode: SessionMode) {
        if !mode.in_config() {
            self.config_stack.clear();
        }
        self.mode = mode;
    }

    /// Fold a classified prompt into the mode and the configuration stack.
    pub(crate) fn observe(
        &mut self,
        evidence: PromptMode,
        prompt: &str,
    ) -> Result<(), StateViolation> {
        match evidence {
            PromptMode::Unprivileged => self.set_mode(SessionMode::Unprivileged),
            PromptMode::Privileged => self.set_mode(SessionMode::Privileged),
            PromptMode::ConfigGlobal => {
                self.config_stack.clear();
                self.config_stack.push(prompt.to_string());
                self.mode = SessionMode::ConfigGlobal;
            }
            PromptMode::ConfigSub => {
                if let Some(at) = self.config_stack.iter().position(|p| p == prompt) {
                    // Unwound back to a context seen before.
                    while self.config_stack.len() > at + 1 {
                        self.exit_one()?;
                    }
                } else {
                    self.config_stack.push(prompt.to_string());
                }
                self.mode = SessionMode::ConfigSub;
            }
        }
        Ok(())
    }

    /// Leave one configuration level.
    pub(crate) fn exit_one(&mut self) -> Result<(), StateViolation> {
        if self.config_stack.pop().is_none() {
            return Err(StateViolation::ConfigUnderflow);
        }
        self.mode = match self.config_stack.len() {
            0 => SessionMode::Privileged,
            1 => SessionMode::ConfigGlobal,
            _ => SessionMode::ConfigSub,
        };
        Ok(())
    }
}
