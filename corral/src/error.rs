//! Error types for corral.

use std::time::Duration;

use thiserror::Error;

use crate::session::SessionMode;

/// Main error type for corral operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Expect-loop errors (pattern waits, compilation)
    #[error("Expect error: {0}")]
    Expect(#[from] ExpectError),

    /// Session-level errors (device rejections, state violations)
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Catalog definition and registry errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl From<StateViolation> for Error {
    fn from(violation: StateViolation) -> Self {
        Error::Session(SessionError::State(violation))
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: russh::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Builder finished without a username
    #[error("No username configured for host {host}")]
    MissingUsername { host: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key changed since it was recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged {
        host: String,
        port: u16,
        line: usize,
    },

    /// Host key not present in known_hosts under strict verification
    #[error("Unknown host key for {host}:{port}")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts file could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Connection attempt timed out
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),
}

/// Expect layer errors (waiting for prompts and patterns).
#[derive(Error, Debug)]
pub enum ExpectError {
    /// No candidate pattern matched within the window.
    ///
    /// `buffered` carries whatever output accumulated during the wait so
    /// callers can see how far the device got. The session remains usable;
    /// late bytes land in the residue of the next wait.
    #[error("No pattern matched after {waited:?} (idle window {window:?})")]
    Timeout {
        waited: Duration,
        window: Duration,
        buffered: String,
    },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session layer errors (command execution, mode handling).
#[derive(Error, Debug)]
pub enum SessionError {
    /// The device rejected a command (an error signature matched).
    ///
    /// Raised by `send`; the graceful variant reports the failure in the
    /// `Response` instead.
    #[error("Device rejected '{command}': {signature}")]
    Device {
        command: String,
        signature: String,
        output: String,
    },

    /// Privilege escalation failed
    #[error("Enable failed: {message}")]
    EnableFailed { message: String },

    /// The active device profile carries no catalog support for this operation
    #[error("No catalog support for '{operation}' on this device")]
    Unsupported { operation: &'static str },

    /// An operation violated the session state machine
    #[error("State violation: {0}")]
    State(#[from] StateViolation),
}

/// Violations of the session state machine.
#[derive(Error, Debug)]
pub enum StateViolation {
    /// Operation not valid in the current mode
    #[error("'{operation}' is not valid in {mode} mode")]
    InvalidOperation {
        operation: &'static str,
        mode: SessionMode,
    },

    /// The observed prompt no longer extends the session's prompt prefix.
    ///
    /// Treated as a possible wrong-device or corrupted-session condition;
    /// the session is poisoned and must be closed.
    #[error("Prompt '{observed}' does not extend session prefix '{prefix}'")]
    PromptDesync { prefix: String, observed: String },

    /// Config-mode exit requested at depth zero
    #[error("Config exit requested at depth zero")]
    ConfigUnderflow,

    /// The session hit a fatal error earlier and only `close` is allowed
    #[error("Session is poisoned by an earlier fatal error")]
    Poisoned,
}

/// Catalog definition and registry errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A catalog with this name is already registered
    #[error("Catalog '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// No catalog registered under this name
    #[error("Unknown catalog '{name}'")]
    Unknown { name: String },

    /// Invalid catalog definition
    #[error("Invalid catalog definition: {message}")]
    InvalidDefinition { message: String },
}

/// Result type alias using corral's Error.
pub type Result<T> = std::result::Result<T, Error>;
