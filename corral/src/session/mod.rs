//! The session layer: a stateful request/response API over a device CLI.
//!
//! [`Session`] owns the expect engine and the mode tracker. Every public
//! operation is a sequence of writes and prompt waits; mode changes come
//! from prompt evidence alone, never from the commands that were sent.
//! Sessions are built by [`SessionBuilder`] over SSH, or by [`Session::open`]
//! over any [`Transport`] once a connection is established.
//!
//! A session is single-flight by construction: every operation takes
//! `&mut self`, so one command is on the wire at a time and the response
//! always belongs to the command that asked for it.

mod builder;
mod options;
mod probe;
mod response;
mod state;

pub use builder::SessionBuilder;
pub use options::SessionOptions;
pub use response::Response;
pub use state::{SessionMode, prompt_prefix};

use bytes::Bytes;
use indexmap::IndexSet;
use log::{debug, warn};
use regex::bytes::Regex;

use crate::catalog::{CatalogRegistry, DeviceCatalog, DeviceProfile};
use crate::channel::{
    Expectation, ExpectEngine, MatchedPattern, WaitResult, clean_output, generic_prompt,
    strip_controls,
};
use crate::error::{CatalogError, ExpectError, Result, SessionError, StateViolation};
use crate::transport::Transport;
use state::ModeTracker;

/// Marker typed after a newline to pin down the prompt at connect time.
/// Unusual enough not to occur in banners, and erased with backspaces
/// before the first real command.
const SENTINEL: &str = "ZQZQ";

/// What `interactive` hands back: the raw transport and everything the
/// session had buffered but not consumed.
///
/// From here the caller owns the byte stream; the session that produced
/// the handoff is gone and cannot be resumed.
#[derive(Debug)]
pub struct Handoff<T> {
    /// The underlying transport, still connected.
    pub transport: T,

    /// Bytes received but not consumed by any match.
    pub residue: Bytes,

    /// The last prompt the session observed.
    pub prompt: String,

    /// Always [`SessionMode::InteractiveHandoff`].
    pub mode: SessionMode,
}

/// An interactive session with a network device.
///
/// Wraps a transport in an expect loop and exposes command round-trips:
/// write a line, wait for the device's prompt, hand back cleaned output.
/// The session discovers the prompt at connect time, identifies the device
/// against the catalog registry, and from then on tracks privilege and
/// configuration depth from the prompts the device prints.
///
/// Fatal conditions (transport failures, a prompt that stops extending the
/// connect-time prefix) poison the session: every operation except `close`
/// then reports [`StateViolation::Poisoned`]. Expect timeouts and device
/// rejections are not fatal.
pub struct Session<T: Transport> {
    engine: ExpectEngine<T>,
    options: SessionOptions,
    tracker: ModeTracker,

    /// Fallback prompt shape, compiled once.
    generic: Regex,

    /// Last observed prompt text.
    prompt: String,

    /// Stable prompt prefix captured at connect; every later prompt must
    /// extend it.
    prefix: String,

    /// Whether the last round-trip changed the prompt text.
    prompt_changed: bool,

    /// Whether privileged mode has been reached.
    enabled: bool,

    /// Last HA verdict: `Some(true)` active, `Some(false)` standby,
    /// `None` unknown.
    changeable: Option<bool>,

    /// Identification outcome, pinned at connect.
    profile: DeviceProfile,

    last_output: String,
    last_output_raw: String,

    poisoned: bool,
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("prompt", &self.prompt)
            .field("prefix", &self.prefix)
            .field("prompt_changed", &self.prompt_changed)
            .field("enabled", &self.enabled)
            .field("changeable", &self.changeable)
            .field("profile", &self.profile)
            .field("poisoned", &self.poisoned)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Session<T> {
    /// Run the connect sequence over an established transport: discover
    /// the prompt, identify the device, disable pagination.
    ///
    /// `catalog` pins identification to a known catalog instead of scoring
    /// the registry. Most callers connect through [`SessionBuilder`]; this
    /// entry point exists for custom transports.
    pub async fn open(
        transport: T,
        options: SessionOptions,
        catalog: Option<DeviceCatalog>,
    ) -> Result<Self> {
        let engine = ExpectEngine::new(transport, options.engine());
        let mut session = Self {
            engine,
            options,
            tracker: ModeTracker::new(SessionMode::Unauthenticated),
            generic: generic_prompt(),
            prompt: String::new(),
            prefix: String::new(),
            prompt_changed: false,
            enabled: false,
            changeable: None,
            profile: DeviceProfile::generic(),
            last_output: String::new(),
            last_output_raw: String::new(),
            poisoned: false,
        };

        if let Err(err) = session.initialize(catalog).await {
            let _ = session.close().await;
            return Err(err);
        }

        debug!(
            "session ready: prompt '{}', mode {}, catalog {:?}",
            session.prompt,
            session.mode(),
            session.profile.catalog
        );
        Ok(session)
    }

    async fn initialize(&mut self, catalog: Option<DeviceCatalog>) -> Result<()> {
        self.discover_prompt().await?;
        self.identify(catalog).await?;
        self.disable_pagination().await?;
        Ok(())
    }

    /// Pin down the prompt: send a newline so the device reprints it, type
    /// the sentinel with no terminator, and take the last line before the
    /// sentinel echo as the prompt. The sentinel is then erased with
    /// backspaces so it never reaches the command line.
    async fn discover_prompt(&mut self) -> Result<()> {
        self.transport_write(&[self.options.newline]).await?;
        self.transport_write(SENTINEL.as_bytes()).await?;

        let marker =
            [Expectation::Challenge(Regex::new(SENTINEL).expect("sentinel pattern compiles"))];
        let outcome = self
            .wait_for(&marker)
            .await?
            .into_matched(self.options.command_timeout)?;

        let erase = vec![self.options.backspace; SENTINEL.len()];
        self.transport_write(&erase).await?;

        let text = strip_controls(&outcome.before);
        let prompt = text
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim()
            .to_string();

        self.prefix = prompt_prefix(&prompt);
        self.prompt = prompt;

        // Before identification the delimiter is the only mode evidence.
        let mode = if self.prompt.ends_with('#') {
            SessionMode::Privileged
        } else {
            SessionMode::Unprivileged
        };
        self.tracker.set_mode(mode);
        self.enabled = mode == SessionMode::Privileged;

        debug!("discovered prompt '{}' ({})", self.prompt, mode);
        Ok(())
    }

    /// Run the probe commands and resolve the device profile. Pagination
    /// guards are active during the probe because no catalog is yet.
    async fn identify(&mut self, pinned: Option<DeviceCatalog>) -> Result<()> {
        let mut combined = String::new();
        for command in probe::PROBE_COMMANDS {
            let response = self
                .send_inner(command, true, probe::pagination_guards())
                .await?;
            combined.push_str(&response.output_raw);
            combined.push('\n');
        }

        self.profile = match pinned {
            Some(catalog) => probe::pin_profile(catalog, &combined),
            None => {
                let registry = CatalogRegistry::global().read().map_err(|_| {
                    CatalogError::InvalidDefinition {
                        message: "catalog registry lock poisoned".to_string(),
                    }
                })?;
                probe::select_profile(&combined, &registry)
            }
        };

        if self.profile.is_identified() {
            debug!(
                "identified as {:?} via {:?}",
                self.profile.catalog, self.profile.identifiers
            );
        } else {
            warn!(
                "no catalog matched the probe output; falling back to generic prompt \
                 matching (no pagination handling, no error detection)"
            );
        }

        // Re-classify the connect prompt now that shapes are available.
        let evidence = self.profile.active().and_then(|catalog| {
            catalog
                .prompts
                .iter()
                .find(|shape| shape.find(self.prompt.as_bytes()).is_some())
                .map(|shape| shape.mode())
        });
        if let Some(mode) = evidence {
            let prompt = self.prompt.clone();
            self.tracker.observe(mode, &prompt)?;
            self.enabled = self.tracker.mode() == SessionMode::Privileged;
        }
        Ok(())
    }

    /// Send the catalog's pagination-disable command, if it has one. A
    /// rejection is logged, not fatal: the continuation candidate still
    /// covers paginated output.
    async fn disable_pagination(&mut self) -> Result<()> {
        let Some(command) = self
            .profile
            .active()
            .and_then(|c| c.pagination_disable.clone())
        else {
            return Ok(());
        };
        let response = self.send_inner(&command, true, Vec::new()).await?;
        if !response.is_success() {
            warn!("pagination disable '{}' was rejected", command);
        }
        Ok(())
    }

    /// Send a command and wait for the prompt.
    ///
    /// Output comes back cleaned (echo, control sequences, and the prompt
    /// removed) with the raw capture alongside. A matched error signature
    /// fails the call with [`SessionError::Device`]; use [`send_graceful`]
    /// when rejected commands are part of the plan.
    ///
    /// [`send_graceful`]: Session::send_graceful
    pub async fn send(&mut self, command: &str) -> Result<Response> {
        self.send_inner(command, false, Vec::new()).await
    }

    /// Like [`send`](Session::send), but a matched error signature is
    /// reported in [`Response::failure`] instead of failing the call.
    pub async fn send_graceful(&mut self, command: &str) -> Result<Response> {
        self.send_inner(command, true, Vec::new()).await
    }

    /// Send a command and return the raw capture for the round-trip:
    /// echo, control bytes, and prompt included. Device rejections do not
    /// fail the call.
    pub async fn send_raw(&mut self, command: &str) -> Result<String> {
        let response = self.send_inner(command, true, Vec::new()).await?;
        Ok(response.output_raw)
    }

    /// Send commands in order, stopping at the first failure.
    pub async fn send_all(&mut self, commands: &[&str]) -> Result<Vec<Response>> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.send(command).await?);
        }
        Ok(responses)
    }

    /// Write a single byte with no terminator and no response wait. For
    /// single-keystroke interaction such as answering a pause by hand.
    pub async fn send_char(&mut self, byte: u8) -> Result<()> {
        self.ensure_usable("send_char")?;
        self.transport_write(&[byte]).await
    }

    /// Escalate to privileged mode.
    ///
    /// Only valid from [`SessionMode::Unprivileged`]. Sends the catalog's
    /// enable command, answers the password challenge, and verifies the
    /// resulting prompt is privileged. A repeated challenge is retried
    /// once when the catalog marks the re-prompt recoverable; otherwise
    /// it fails as [`SessionError::EnableFailed`] and the session stays
    /// unprivileged.
    pub async fn enable(&mut self, password: &str) -> Result<()> {
        self.ensure_usable("enable")?;
        if self.mode() != SessionMode::Unprivileged {
            return Err(StateViolation::InvalidOperation {
                operation: "enable",
                mode: self.mode(),
            }
            .into());
        }

        let spec = self
            .profile
            .active()
            .map(|c| c.enable.clone())
            .unwrap_or_default();

        self.transport_write_line(&spec.command).await?;

        let mut candidates = self.candidates();
        candidates.push(Expectation::Challenge(spec.password_prompt.clone()));

        let window = self.options.command_timeout;
        let mut outcome = self.wait_for(&candidates).await?.into_matched(window)?;

        if matches!(outcome.hit, MatchedPattern::Challenge { .. }) {
            let mut retried = false;
            loop {
                self.transport_write_line(password).await?;
                outcome = self.wait_for(&candidates).await?.into_matched(window)?;
                match outcome.hit {
                    MatchedPattern::Challenge { .. } => {
                        if spec.recoverable_reprompt && !retried {
                            debug!("enable password re-prompt; retrying once");
                            retried = true;
                            continue;
                        }
                        return Err(SessionError::EnableFailed {
                            message: "password rejected".to_string(),
                        }
                        .into());
                    }
                    _ => break,
                }
            }
        }

        self.note_prompt(&outcome.hit)?;

        // Without a catalog shape to testify, the delimiter is the only
        // privileged-mode evidence.
        if self.mode() != SessionMode::Privileged && self.prompt.ends_with('#') {
            self.tracker.set_mode(SessionMode::Privileged);
        }

        if self.mode() == SessionMode::Privileged {
            self.enabled = true;
            debug!("enable succeeded; prompt '{}'", self.prompt);
            Ok(())
        } else {
            Err(SessionError::EnableFailed {
                message: format!("prompt '{}' is not privileged", self.prompt),
            }
            .into())
        }
    }

    /// Enter configuration mode, apply each line, and leave again.
    ///
    /// On a device rejection the remaining lines are skipped, configuration
    /// mode is exited best-effort, and the rejection propagates. Valid from
    /// privileged mode, or from global configuration when the caller is
    /// already there (then the enter/exit commands are skipped).
    pub async fn apply_config(&mut self, lines: &[&str]) -> Result<Vec<Response>> {
        self.ensure_usable("apply_config")?;
        match self.mode() {
            SessionMode::Privileged | SessionMode::ConfigGlobal => {}
            mode => {
                return Err(StateViolation::InvalidOperation {
                    operation: "apply_config",
                    mode,
                }
                .into());
            }
        }

        let config = self
            .profile
            .active()
            .map(|c| c.config.clone())
            .unwrap_or_default();
        let entered_here = self.mode() == SessionMode::Privileged;

        if entered_here {
            self.send(&config.enter).await?;
        }

        let mut responses = Vec::with_capacity(lines.len());
        for line in lines {
            match self.send(line).await {
                Ok(response) => responses.push(response),
                Err(err) => {
                    if entered_here && self.mode().in_config() {
                        let _ = self.send_inner(&config.exit, true, Vec::new()).await;
                    }
                    return Err(err);
                }
            }
        }

        if entered_here {
            self.send(&config.exit).await?;
        }
        Ok(responses)
    }

    /// Persist the running configuration with the catalog's save command,
    /// answering its confirmation inline.
    ///
    /// Fails with [`SessionError::Unsupported`] when the active profile
    /// carries no save command.
    pub async fn write_config(&mut self) -> Result<Response> {
        self.ensure_usable("write_config")?;
        let Some(save) = self.profile.active().and_then(|c| c.save.clone()) else {
            return Err(SessionError::Unsupported {
                operation: "write_config",
            }
            .into());
        };

        let extra = save
            .confirm
            .map(|confirm| {
                vec![Expectation::Continuation {
                    pattern: confirm.pattern,
                    reply: confirm.reply.into_bytes(),
                }]
            })
            .unwrap_or_default();

        self.send_inner(&save.command, false, extra).await
    }

    /// Query high-availability status.
    ///
    /// `Some(true)` means this unit is active (changeable), `Some(false)`
    /// standby, `None` unknown: either the catalog has no HA query or the
    /// output matched neither verdict. The result is cached on the session
    /// as [`changeable`](Session::changeable).
    pub async fn check_ha_status(&mut self) -> Result<Option<bool>> {
        self.ensure_usable("check_ha_status")?;
        let Some(ha) = self.profile.active().and_then(|c| c.ha_status.clone()) else {
            self.changeable = None;
            return Ok(None);
        };

        let response = self.send_inner(&ha.command, true, Vec::new()).await?;
        let verdict = if ha.active.is_match(response.output.as_bytes()) {
            Some(true)
        } else if ha.standby.is_match(response.output.as_bytes()) {
            Some(false)
        } else {
            None
        };
        self.changeable = verdict;
        Ok(verdict)
    }

    /// End the session and hand the raw transport to the caller, along
    /// with any bytes received but not yet consumed.
    ///
    /// Consumes the session: prompt tracking, cleaning, and mode state end
    /// here. Meant for reload dialogs, image transfers, and other exchanges
    /// that need a human (or a different tool) on the wire.
    pub fn interactive(self) -> Handoff<T> {
        debug!("handing the transport to the caller; session ends");
        let Session { engine, prompt, .. } = self;
        let (transport, residue) = engine.into_parts();
        Handoff {
            transport,
            residue,
            prompt,
            mode: SessionMode::InteractiveHandoff,
        }
    }

    /// Close the session and the transport under it. Idempotent; also the
    /// only operation a poisoned session still accepts.
    pub async fn close(&mut self) -> Result<()> {
        if self.mode() == SessionMode::Closed {
            return Ok(());
        }
        self.tracker.set_mode(SessionMode::Closed);
        self.engine.close().await
    }

    /// Current session mode.
    pub fn mode(&self) -> SessionMode {
        self.tracker.mode()
    }

    /// Current configuration nesting depth; zero outside configuration.
    pub fn config_depth(&self) -> usize {
        self.tracker.depth()
    }

    /// Last observed prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Stable prompt prefix captured at connect.
    pub fn prompt_prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether the last round-trip changed the prompt text.
    pub fn prompt_changed(&self) -> bool {
        self.prompt_changed
    }

    /// Whether privileged mode has been reached.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Last HA verdict; see [`check_ha_status`](Session::check_ha_status).
    pub fn changeable(&self) -> Option<bool> {
        self.changeable
    }

    /// Identification tokens collected by the probe, in match order.
    pub fn identifiers(&self) -> &IndexSet<String> {
        &self.profile.identifiers
    }

    /// The identification outcome pinned at connect.
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Cleaned output of the most recent command.
    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    /// Raw capture of the most recent command.
    pub fn last_output_raw(&self) -> &str {
        &self.last_output_raw
    }

    /// The session options in effect.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    fn ensure_usable(&self, operation: &'static str) -> Result<()> {
        let mode = self.mode();
        if mode.is_terminal() {
            return Err(StateViolation::InvalidOperation { operation, mode }.into());
        }
        if self.poisoned {
            return Err(StateViolation::Poisoned.into());
        }
        Ok(())
    }

    /// The candidate set for a wait, derived from the active profile:
    /// the literal current prompt first, then the catalog's pagination
    /// continuation, error signatures, and prompt shapes, with the generic
    /// shape as the final fallback.
    fn candidates(&self) -> Vec<Expectation> {
        let mut list = Vec::new();
        if !self.prompt.is_empty() {
            list.push(Expectation::Literal(self.prompt.clone()));
        }
        if let Some(catalog) = self.profile.active() {
            if let Some(page) = &catalog.pagination_prompt {
                list.push(Expectation::Continuation {
                    pattern: page.pattern.clone(),
                    reply: page.reply.clone().into_bytes(),
                });
            }
            for signature in &catalog.error_signatures {
                list.push(Expectation::Error {
                    name: signature.name.clone(),
                    pattern: signature.pattern.clone(),
                });
            }
            for shape in &catalog.prompts {
                list.push(Expectation::Prompt(shape.clone()));
            }
        }
        list.push(Expectation::Generic(self.generic.clone()));
        list
    }

    /// Fold a completing match into prompt and mode state, enforcing the
    /// prefix invariant.
    fn note_prompt(&mut self, hit: &MatchedPattern) -> std::result::Result<(), StateViolation> {
        match hit {
            MatchedPattern::Literal { .. } => {
                self.prompt_changed = false;
            }
            MatchedPattern::Challenge { .. } => {
                // Not a prompt; the caller is mid-dialogue.
            }
            MatchedPattern::Prompt { mode, text } => {
                self.check_prefix(text)?;
                self.prompt_changed = self.prompt != *text;
                self.prompt = text.clone();
                self.tracker.observe(*mode, text)?;
            }
            MatchedPattern::Generic { text } => {
                self.check_prefix(text)?;
                self.prompt_changed = self.prompt != *text;
                self.prompt = text.clone();
                // Generic matches carry no mode evidence.
            }
        }
        Ok(())
    }

    fn check_prefix(&mut self, observed: &str) -> std::result::Result<(), StateViolation> {
        if !self.prefix.is_empty() && !observed.starts_with(&self.prefix) {
            self.poisoned = true;
            warn!(
                "prompt '{}' does not extend prefix '{}'; poisoning session",
                observed, self.prefix
            );
            return Err(StateViolation::PromptDesync {
                prefix: self.prefix.clone(),
                observed: observed.to_string(),
            });
        }
        Ok(())
    }

    /// One command round-trip: write, wait, classify, clean.
    async fn send_inner(
        &mut self,
        command: &str,
        graceful: bool,
        extra: Vec<Expectation>,
    ) -> Result<Response> {
        self.ensure_usable("send")?;
        debug!("sending '{}'", command);

        self.transport_write_line(command).await?;
        if !self.options.settle.is_zero() {
            tokio::time::sleep(self.options.settle).await;
        }

        let mut candidates = self.candidates();
        candidates.extend(extra);

        let window = self.options.command_timeout;
        let outcome = match self.wait_for(&candidates).await? {
            WaitResult::Matched(outcome) => outcome,
            WaitResult::TimedOut {
                waited,
                buffered,
                error_hits,
            } => {
                // A recorded rejection with no prompt after it is the
                // device's answer, not silence.
                if let Some(hit) = error_hits.into_iter().next() {
                    let output = clean_output(buffered.as_bytes(), Some(command), None);
                    if graceful {
                        self.last_output = output.clone();
                        self.last_output_raw = buffered.clone();
                        return Ok(Response {
                            command: command.to_string(),
                            output,
                            output_raw: buffered,
                            prompt: self.prompt.clone(),
                            mode: self.mode(),
                            elapsed: waited,
                            failure: Some(hit.matched),
                        });
                    }
                    return Err(SessionError::Device {
                        command: command.to_string(),
                        signature: hit.name,
                        output,
                    }
                    .into());
                }
                return Err(ExpectError::Timeout {
                    waited,
                    window,
                    buffered,
                }
                .into());
            }
        };

        self.note_prompt(&outcome.hit)?;

        let output = clean_output(&outcome.before, Some(command), Some(&self.prompt));
        let mut output_raw = String::from_utf8_lossy(&outcome.before).into_owned();
        output_raw.push_str(&String::from_utf8_lossy(&outcome.matched));

        let mut signature = None;
        let mut failure = None;
        if let Some(hit) = outcome.error_hits.into_iter().next() {
            signature = Some(hit.name);
            failure = Some(hit.matched);
        } else if let Some(catalog) = self.profile.active() {
            // The engine only watches the buffer tail while waiting; long
            // output can scroll a rejection past it.
            for sig in &catalog.error_signatures {
                if let Some(m) = sig.pattern.find(output.as_bytes()) {
                    signature = Some(sig.name.clone());
                    failure = Some(String::from_utf8_lossy(m.as_bytes()).into_owned());
                    break;
                }
            }
        }

        self.last_output = output.clone();
        self.last_output_raw = output_raw.clone();

        if !graceful && let Some(signature) = signature {
            return Err(SessionError::Device {
                command: command.to_string(),
                signature,
                output,
            }
            .into());
        }

        Ok(Response {
            command: command.to_string(),
            output,
            output_raw,
            prompt: self.prompt.clone(),
            mode: self.mode(),
            elapsed: outcome.elapsed,
            failure,
        })
    }

    async fn transport_write_line(&mut self, line: &str) -> Result<()> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(self.options.newline);
        self.transport_write(&bytes).await
    }

    /// Write through the engine; a failed write poisons the session.
    async fn transport_write(&mut self, data: &[u8]) -> Result<()> {
        match self.engine.write(data).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.poisoned = true;
                Err(err)
            }
        }
    }

    /// Wait through the engine; a transport failure poisons the session.
    /// Timeouts come back as `Ok(TimedOut)` and do not poison.
    async fn wait_for(&mut self, candidates: &[Expectation]) -> Result<WaitResult> {
        match self
            .engine
            .await_match(candidates, self.options.command_timeout)
            .await
        {
            Ok(result) => Ok(result),
            Err(err) => {
                self.poisoned = true;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, TransportError};
    use crate::transport::mock::{MockTransport, Script};

    /// The standard connect exchange for a Cisco IOS device sitting at an
    /// unprivileged prompt: sentinel discovery, the identification probe,
    /// and the pagination disable.
    fn ios_preamble() -> Vec<Script> {
        vec![
            Script::data("\r\nRouter>ZQZQ"),
            Script::data("show version\r\nCisco IOS Software, Version 15.2(4)M7\r\nRouter>"),
            Script::data("terminal length 0\r\nRouter>"),
        ]
    }

    async fn ios_session(extra: Vec<Script>) -> Session<MockTransport> {
        let mut script = ios_preamble();
        script.extend(extra);
        Session::open(MockTransport::new(script), SessionOptions::default(), None)
            .await
            .unwrap()
    }

    /// Connect exchange for a device no catalog recognizes. No pagination
    /// disable is sent because no catalog is active.
    async fn generic_session(extra: Vec<Script>) -> Session<MockTransport> {
        let mut script = vec![
            Script::data("\r\nfrob-sw7>ZQZQ"),
            Script::data("show version\r\nFrobOS v1.0, all rights reserved\r\nfrob-sw7>"),
        ];
        script.extend(extra);
        Session::open(MockTransport::new(script), SessionOptions::default(), None)
            .await
            .unwrap()
    }

    fn enable_ok() -> Vec<Script> {
        vec![
            Script::data("enable\r\nPassword: "),
            Script::data("\r\nRouter#"),
        ]
    }

    #[tokio::test]
    async fn test_connect_discovers_prompt_and_identity() {
        let session = ios_session(vec![]).await;

        assert_eq!(session.prompt(), "Router>");
        assert_eq!(session.prompt_prefix(), "Router");
        assert_eq!(session.mode(), SessionMode::Unprivileged);
        assert!(!session.enabled());
        assert_eq!(session.profile().catalog.as_deref(), Some("cisco_ios"));

        let tokens: Vec<&str> = session.identifiers().iter().map(|s| s.as_str()).collect();
        assert_eq!(tokens, ["Cisco", "IOS"]);
    }

    #[tokio::test]
    async fn test_connect_without_identification_warns_and_degrades() {
        let session = generic_session(vec![]).await;

        assert_eq!(session.prompt(), "frob-sw7>");
        assert!(!session.profile().is_identified());
        assert!(session.identifiers().is_empty());
        assert_eq!(session.mode(), SessionMode::Unprivileged);
    }

    #[tokio::test]
    async fn test_connect_at_privileged_prompt_sets_enabled() {
        let script = vec![
            Script::data("\r\nRouter#ZQZQ"),
            Script::data("show version\r\nCisco IOS Software, Version 15.2\r\nRouter#"),
            Script::data("terminal length 0\r\nRouter#"),
        ];
        let session = Session::open(MockTransport::new(script), SessionOptions::default(), None)
            .await
            .unwrap();

        assert_eq!(session.mode(), SessionMode::Privileged);
        assert!(session.enabled());
    }

    #[tokio::test]
    async fn test_send_cleans_echo_and_prompt_out_of_output() {
        let mut session = ios_session(vec![Script::data(
            "show clock\r\n10:02:11.419 UTC Tue Aug 26 2025\r\nRouter>",
        )])
        .await;

        let response = session.send("show clock").await.unwrap();
        assert_eq!(response.output, "10:02:11.419 UTC Tue Aug 26 2025");
        assert!(!response.output.contains("show clock"));
        assert!(!response.output.contains("Router>"));

        // The raw capture keeps everything.
        assert!(response.output_raw.contains("show clock"));
        assert!(response.output_raw.contains("Router>"));

        assert_eq!(response.prompt, "Router>");
        assert_eq!(response.mode, SessionMode::Unprivileged);
        assert!(response.is_success());
        assert!(!session.prompt_changed());
        assert_eq!(session.last_output(), "10:02:11.419 UTC Tue Aug 26 2025");
    }

    #[tokio::test]
    async fn test_send_raw_keeps_the_whole_capture() {
        let mut session =
            ios_session(vec![Script::data("show boot\r\nBOOT path: flash:\r\nRouter>")]).await;

        let raw = session.send_raw("show boot").await.unwrap();
        assert!(raw.contains("show boot"));
        assert!(raw.contains("BOOT path: flash:"));
        assert!(raw.ends_with("Router>"));
    }

    #[tokio::test]
    async fn test_enable_answers_the_password_challenge() {
        let mut session = ios_session(enable_ok()).await;

        session.enable("sekrit").await.unwrap();
        assert!(session.enabled());
        assert_eq!(session.mode(), SessionMode::Privileged);
        assert_eq!(session.prompt(), "Router#");
        assert!(session.prompt_changed());

        let transport = session.interactive().transport;
        assert!(transport.written().contains("enable\r"));
        assert!(transport.written().contains("sekrit\r"));
    }

    #[tokio::test]
    async fn test_enable_is_rejected_outside_unprivileged_mode() {
        let mut session = ios_session(enable_ok()).await;
        session.enable("sekrit").await.unwrap();

        let err = session.enable("sekrit").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::State(StateViolation::InvalidOperation {
                operation: "enable",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_enable_retries_once_then_fails() {
        let mut session = ios_session(vec![
            Script::data("enable\r\nPassword: "),
            Script::data("\r\nPassword: "),
            Script::data("\r\nPassword: "),
        ])
        .await;

        let err = session.enable("wrong").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::EnableFailed { .. })
        ));
        assert!(!session.enabled());
        assert_eq!(session.mode(), SessionMode::Unprivileged);

        // The password went out exactly twice: the attempt and one retry.
        let transport = session.interactive().transport;
        assert_eq!(transport.written().matches("wrong\r").count(), 2);
    }

    #[tokio::test]
    async fn test_enable_retry_can_succeed() {
        let mut session = ios_session(vec![
            Script::data("enable\r\nPassword: "),
            Script::data("\r\nPassword: "),
            Script::data("\r\nRouter#"),
        ])
        .await;

        session.enable("sekrit").await.unwrap();
        assert!(session.enabled());
    }

    #[tokio::test]
    async fn test_enable_fails_when_prompt_stays_unprivileged() {
        // Three rejections end with IOS printing the exec prompt again.
        let mut session = ios_session(vec![
            Script::data("enable\r\nPassword: "),
            Script::data("\r\n% Bad secrets\r\nRouter>"),
        ])
        .await;

        let err = session.enable("wrong").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::EnableFailed { .. })
        ));
        assert_eq!(session.mode(), SessionMode::Unprivileged);
    }

    #[tokio::test]
    async fn test_graceful_send_reports_rejection_in_the_response() {
        let mut session = ios_session(vec![
            Script::data("show run\r\n% Invalid input detected at '^' marker.\r\nRouter>"),
            Script::data("show clock\r\n10:02:11\r\nRouter>"),
        ])
        .await;

        let response = session.send_graceful("show run").await.unwrap();
        assert!(!response.is_success());
        assert!(response.failure.as_deref().unwrap().contains("% Invalid input"));
        // The rejection text is part of the output, verbatim.
        assert!(response.output.contains("% Invalid input detected at '^' marker."));

        // The session carries on.
        let next = session.send("show clock").await.unwrap();
        assert_eq!(next.output, "10:02:11");
    }

    #[tokio::test]
    async fn test_send_surfaces_rejection_as_device_error() {
        let mut session = ios_session(vec![Script::data(
            "show run\r\n% Invalid input detected at '^' marker.\r\nRouter>",
        )])
        .await;

        let err = session.send("show run").await.unwrap_err();
        let Error::Session(SessionError::Device {
            command, signature, ..
        }) = err
        else {
            panic!("expected a device error");
        };
        assert_eq!(command, "show run");
        assert_eq!(signature, "invalid input");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_leaves_the_session_usable() {
        let mut session = ios_session(vec![]).await;

        let err = session.send("show clock").await.unwrap_err();
        assert!(matches!(err, Error::Expect(ExpectError::Timeout { .. })));

        // Not poisoned: the next attempt waits again instead of refusing.
        let err = session.send("show clock").await.unwrap_err();
        assert!(matches!(err, Error::Expect(ExpectError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_without_prompt_is_a_device_error_not_a_timeout() {
        let mut session = ios_session(vec![Script::data(
            "copy flash: tftp:\r\n% Invalid input detected at '^' marker.\r\n",
        )])
        .await;

        let err = session.send("copy flash: tftp:").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::Device { .. })
        ));
    }

    #[tokio::test]
    async fn test_config_depth_follows_prompt_evidence() {
        let mut extra = enable_ok();
        extra.extend([
            Script::data("configure terminal\r\nEnter configuration commands, one per line.\r\nRouter(config)#"),
            Script::data("interface GigabitEthernet0/1\r\nRouter(config-if)#"),
            Script::data("exit\r\nRouter(config)#"),
            Script::data("end\r\nRouter#"),
        ]);
        let mut session = ios_session(extra).await;
        session.enable("sekrit").await.unwrap();

        session.send("configure terminal").await.unwrap();
        assert_eq!(session.mode(), SessionMode::ConfigGlobal);
        assert_eq!(session.config_depth(), 1);

        session.send("interface GigabitEthernet0/1").await.unwrap();
        assert_eq!(session.mode(), SessionMode::ConfigSub);
        assert_eq!(session.config_depth(), 2);

        session.send("exit").await.unwrap();
        assert_eq!(session.mode(), SessionMode::ConfigGlobal);
        assert_eq!(session.config_depth(), 1);

        session.send("end").await.unwrap();
        assert_eq!(session.mode(), SessionMode::Privileged);
        assert_eq!(session.config_depth(), 0);
    }

    #[tokio::test]
    async fn test_apply_config_enters_applies_and_exits() {
        let mut extra = enable_ok();
        extra.extend([
            Script::data("configure terminal\r\nRouter(config)#"),
            Script::data("ntp server 10.0.0.1\r\nRouter(config)#"),
            Script::data("logging host 10.0.0.9\r\nRouter(config)#"),
            Script::data("end\r\nRouter#"),
        ]);
        let mut session = ios_session(extra).await;
        session.enable("sekrit").await.unwrap();

        let responses = session
            .apply_config(&["ntp server 10.0.0.1", "logging host 10.0.0.9"])
            .await
            .unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(session.mode(), SessionMode::Privileged);
        assert_eq!(session.config_depth(), 0);
    }

    #[tokio::test]
    async fn test_apply_config_aborts_and_exits_on_rejection() {
        let mut extra = enable_ok();
        extra.extend([
            Script::data("configure terminal\r\nRouter(config)#"),
            Script::data("frobnicate now\r\n% Invalid input detected at '^' marker.\r\nRouter(config)#"),
            Script::data("end\r\nRouter#"),
        ]);
        let mut session = ios_session(extra).await;
        session.enable("sekrit").await.unwrap();

        let err = session
            .apply_config(&["frobnicate now", "never sent"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::Device { .. })));
        assert_eq!(session.mode(), SessionMode::Privileged);
        assert_eq!(session.config_depth(), 0);

        let transport = session.interactive().transport;
        assert!(!transport.written().contains("never sent"));
        assert!(transport.written().contains("end\r"));
    }

    #[tokio::test]
    async fn test_apply_config_requires_privileged_mode() {
        let mut session = ios_session(vec![]).await;

        let err = session.apply_config(&["ntp server 10.0.0.1"]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::State(StateViolation::InvalidOperation {
                operation: "apply_config",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_write_config_answers_the_save_confirmation() {
        let mut extra = enable_ok();
        extra.extend([
            Script::data("copy running-config startup-config\r\nDestination filename [startup-config]? "),
            Script::data("\r\nBuilding configuration...\r\n[OK]\r\nRouter#"),
        ]);
        let mut session = ios_session(extra).await;
        session.enable("sekrit").await.unwrap();

        let response = session.write_config().await.unwrap();
        assert!(response.output.contains("[OK]"));
        // The confirmation fragment is excised, not part of the output.
        assert!(!response.output.contains("Destination filename"));
    }

    #[tokio::test]
    async fn test_write_config_without_catalog_support_is_unsupported() {
        let mut session = generic_session(vec![]).await;

        let err = session.write_config().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::Unsupported {
                operation: "write_config"
            })
        ));
    }

    #[tokio::test]
    async fn test_check_ha_status_classifies_the_verdict() {
        let mut session = ios_session(vec![Script::data(
            "show redundancy\r\n    Current Software state = ACTIVE\r\nRouter>",
        )])
        .await;

        assert_eq!(session.check_ha_status().await.unwrap(), Some(true));
        assert_eq!(session.changeable(), Some(true));
    }

    #[tokio::test]
    async fn test_check_ha_status_detects_standby() {
        let mut session = ios_session(vec![Script::data(
            "show redundancy\r\n    Current Software state = STANDBY HOT\r\nRouter>",
        )])
        .await;

        assert_eq!(session.check_ha_status().await.unwrap(), Some(false));
        assert_eq!(session.changeable(), Some(false));
    }

    #[tokio::test]
    async fn test_check_ha_status_unknown_without_catalog_support() {
        let mut session = generic_session(vec![]).await;

        // No command goes out; the verdict is simply unknown.
        assert_eq!(session.check_ha_status().await.unwrap(), None);
        assert_eq!(session.changeable(), None);
    }

    #[tokio::test]
    async fn test_foreign_prompt_poisons_the_session() {
        let mut session = ios_session(vec![Script::data("show clock\r\nSwitch55>")]).await;

        let err = session.send("show clock").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::State(StateViolation::PromptDesync { .. }))
        ));
        // The stored prompt was not clobbered by the desynced one.
        assert_eq!(session.prompt(), "Router>");

        let err = session.send("show clock").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::State(StateViolation::Poisoned))
        ));

        // Close is still allowed.
        session.close().await.unwrap();
        assert_eq!(session.mode(), SessionMode::Closed);
    }

    #[tokio::test]
    async fn test_hostname_drift_within_the_prefix_is_tolerated() {
        // Config prompts extend the prefix rather than replacing it.
        let mut extra = enable_ok();
        extra.push(Script::data("configure terminal\r\nRouter(config)#"));
        let mut session = ios_session(extra).await;
        session.enable("sekrit").await.unwrap();

        session.send("configure terminal").await.unwrap();
        assert_eq!(session.prompt(), "Router(config)#");
        assert!(session.prompt_changed());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_terminal() {
        let mut session = ios_session(vec![]).await;

        session.close().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(session.mode(), SessionMode::Closed);

        let err = session.send("show clock").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::State(StateViolation::InvalidOperation {
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_interactive_hands_back_transport_and_residue() {
        let session = ios_session(vec![]).await;
        let handoff = session.interactive();

        assert_eq!(handoff.mode, SessionMode::InteractiveHandoff);
        assert_eq!(handoff.prompt, "Router>");
        assert!(handoff.residue.is_empty());

        let written = handoff.transport.written();
        assert!(written.contains("ZQZQ"));
        assert!(written.contains("\u{8}\u{8}\u{8}\u{8}"));
        assert!(written.contains("show version\r"));
        assert!(written.contains("terminal length 0\r"));
    }

    #[tokio::test]
    async fn test_pagination_is_answered_during_the_probe() {
        let script = vec![
            Script::data("\r\nRouter>ZQZQ"),
            Script::data("show version\r\nCisco IOS Software --More-- "),
            Script::data("\r\nVersion 15.2(4)M7\r\nRouter>"),
            Script::data("terminal length 0\r\nRouter>"),
        ];
        let session = Session::open(MockTransport::new(script), SessionOptions::default(), None)
            .await
            .unwrap();

        assert_eq!(session.profile().catalog.as_deref(), Some("cisco_ios"));

        // The guard's space reply went out right after the probe command.
        let written = session.interactive().transport.written();
        assert!(written.contains("show version\r "));
    }

    #[tokio::test]
    async fn test_pinned_catalog_skips_scoring() {
        let pinned = {
            let registry = CatalogRegistry::global().read().unwrap();
            registry.get("arista_eos").unwrap().clone()
        };
        // Probe output that would otherwise score cisco_ios.
        let script = vec![
            Script::data("\r\nswitch>ZQZQ"),
            Script::data("show version\r\nCisco IOS Software, Version 15.2\r\nswitch>"),
            Script::data("terminal length 0\r\nswitch>"),
        ];
        let session = Session::open(
            MockTransport::new(script),
            SessionOptions::default(),
            Some(pinned),
        )
        .await
        .unwrap();

        assert_eq!(session.profile().catalog.as_deref(), Some("arista_eos"));
    }

    #[tokio::test]
    async fn test_send_all_stops_at_the_first_failure() {
        let mut session = ios_session(vec![
            Script::data("show clock\r\n10:02:11\r\nRouter>"),
            Script::data("frob\r\n% Invalid input detected at '^' marker.\r\nRouter>"),
        ])
        .await;

        let err = session
            .send_all(&["show clock", "frob", "show version"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::Device { .. })));

        let written = session.interactive().transport.written();
        assert_eq!(written.matches("show version\r").count(), 1); // probe only
    }

    #[tokio::test]
    async fn test_send_char_writes_one_byte_without_waiting() {
        let mut session = ios_session(vec![]).await;
        session.send_char(b'q').await.unwrap();

        let written = session.interactive().transport.written();
        assert!(written.ends_with('q'));
    }

    #[tokio::test]
    async fn test_disconnect_mid_command_poisons_the_session() {
        let mut session = ios_session(vec![Script::Disconnect]).await;

        let err = session.send("show clock").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Disconnected)
        ));

        let err = session.send("show clock").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::State(StateViolation::Poisoned))
        ));
    }
}
