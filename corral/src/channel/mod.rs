//! Expect layer: output accumulation, candidate matching, and cleaning.
//!
//! This module owns the read loop between the transport and the session.
//! [`ExpectEngine`] accumulates raw bytes, scans the buffer tail against a
//! prioritized candidate list, and hands back a [`MatchOutcome`] that splits
//! the buffer at the match so nothing after the prompt is lost.
//! [`clean_output`] turns the raw capture into display text.

mod buffer;
mod cleaner;
mod expect;
mod patterns;

pub use buffer::ExpectBuffer;
pub use cleaner::{clean_output, strip_controls};
pub use expect::{
    EngineConfig, ErrorHit, ExpectEngine, MatchOutcome, MatchedPattern, WaitResult,
};
pub use patterns::{
    compile_prompt_pattern, generic_prompt, password_prompt, Expectation, PromptMode,
    PromptPattern,
};
