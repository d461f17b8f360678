//! # Corral
//!
//! Async session automation for network device CLIs over SSH.
//!
//! Corral drives the interactive command line of routers, switches, and
//! firewalls the way a human operator does: it sends a command, watches the
//! byte stream for the device's prompt, and hands back clean output. Device
//! families are described by catalogs (prompt shapes, error signatures,
//! command vocabulary), and the connected device is identified automatically
//! from its version output.
//!
//! ## Features
//!
//! - Async SSH transport via russh, with password and key authentication
//! - Prompt-anchored expect matching with adaptive timeouts
//! - Automatic device identification against registered catalogs
//! - Mode tracking (exec, privileged, configuration depth) from prompt
//!   evidence alone
//! - Device error signatures surfaced as typed errors
//! - Inline handling of pagination pauses and save confirmations
//! - Output cleaning: command echo, ANSI sequences, and the prompt removed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use corral::SessionBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), corral::Error> {
//!     let mut session = SessionBuilder::new("192.0.2.10")
//!         .username("admin")
//!         .password("secret")
//!         .connect()
//!         .await?;
//!
//!     let version = session.send("show version").await?;
//!     println!("{}", version.output);
//!
//!     session.enable("enable-secret").await?;
//!     session.apply_config(&["ntp server 10.0.0.1"]).await?;
//!     session.write_config().await?;
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod channel;
pub mod error;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use catalog::{CatalogRegistry, CatalogSpec, DeviceCatalog, DeviceProfile};
pub use channel::{PromptMode, PromptPattern};
pub use error::{Error, Result};
pub use session::{Handoff, Response, Session, SessionBuilder, SessionMode, SessionOptions};
pub use transport::{
    AuthMethod, HostKeyVerification, ReadEvent, SshConfig, SshTransport, Transport,
};
