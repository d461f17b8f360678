//! Fluent construction of SSH-backed sessions.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::catalog::{CatalogRegistry, DeviceCatalog};
use crate::error::{CatalogError, Result, TransportError};
use crate::session::{Session, SessionOptions};
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig, SshTransport};

/// Builder for a [`Session`] over SSH.
///
/// Collects connection settings, authentication, and session options, then
/// [`connect`](SessionBuilder::connect)s and runs the session through its
/// connect sequence (prompt discovery, identification, pagination disable).
///
/// ```rust,no_run
/// use corral::SessionBuilder;
///
/// # async fn run() -> corral::Result<()> {
/// let mut session = SessionBuilder::new("192.0.2.10")
///     .username("admin")
///     .password("secret")
///     .connect()
///     .await?;
///
/// let version = session.send("show version").await?;
/// println!("{version}");
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    connect_timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    catalog: Option<String>,
    options: SessionOptions,
}

impl SessionBuilder {
    /// Start building a session to `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            auth: AuthMethod::None,
            connect_timeout: Duration::from_secs(30),
            // Wide enough that long command echoes do not wrap, which
            // would defeat echo stripping.
            terminal_width: 256,
            terminal_height: 100,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            catalog: None,
            options: SessionOptions::default(),
        }
    }

    /// SSH port. Defaults to 22.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Username to authenticate as. Required.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Authenticate with a password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    /// Authenticate with a private key file.
    pub fn private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: path.into(),
            passphrase: None,
        };
        self
    }

    /// Authenticate with an encrypted private key file.
    pub fn private_key_with_passphrase(
        mut self,
        path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// TCP connect and SSH handshake timeout. Defaults to 30 seconds.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// PTY dimensions requested from the server.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Host key verification mode. Defaults to accept-new.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Path to the known_hosts file. Defaults to `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Pin the device to a registered catalog instead of scoring the
    /// probe output against the registry.
    pub fn catalog(mut self, name: impl Into<String>) -> Self {
        self.catalog = Some(name.into());
        self
    }

    /// Replace the session options wholesale.
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Idle window for one command wait. Shortcut into the options.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.options.command_timeout = timeout;
        self
    }

    /// Mirror everything received to stdout. Shortcut into the options.
    pub fn echo(mut self, echo: bool) -> Self {
        self.options.echo = echo;
        self
    }

    /// Connect, authenticate, and run the connect sequence.
    ///
    /// A pinned catalog name is resolved against the global registry
    /// before any network traffic, so a typo fails fast.
    pub async fn connect(self) -> Result<Session<SshTransport>> {
        let username = self
            .username
            .ok_or_else(|| TransportError::MissingUsername {
                host: self.host.clone(),
            })?;

        let pinned: Option<DeviceCatalog> = match &self.catalog {
            Some(name) => {
                let registry = CatalogRegistry::global().read().map_err(|_| {
                    CatalogError::InvalidDefinition {
                        message: "catalog registry lock poisoned".to_string(),
                    }
                })?;
                Some(
                    registry
                        .get(name)
                        .cloned()
                        .ok_or_else(|| CatalogError::Unknown { name: name.clone() })?,
                )
            }
            None => None,
        };

        let config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.connect_timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        let transport = SshTransport::connect(&config).await?;
        Session::open(transport, self.options, pinned).await
    }
}
