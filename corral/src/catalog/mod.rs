//! Device catalogs: per-family prompt shapes, identification patterns,
//! and command vocabulary.
//!
//! A [`DeviceCatalog`] tells the session what a family's prompts look
//! like, how to recognize the family in version output, which command
//! turns pagination off, what its error messages look like, and which
//! commands enter configuration mode, persist configuration, and query
//! HA status. Built-in catalogs live in [`vendors`]; callers can register
//! their own, either built in code or compiled from a data file through
//! [`CatalogSpec`].

mod profile;
mod registry;
mod spec;
pub mod vendors;

pub use profile::DeviceProfile;
pub use registry::CatalogRegistry;
pub use spec::{
    CatalogSpec, ConfigDef, ConfirmDef, EnableDef, HaDef, IdentifyDef, PromptDef, SaveDef,
    SignatureDef,
};

use regex::bytes::Regex;

use crate::channel::{password_prompt, PromptPattern};

/// One identification pattern: a regex searched in probe output and the
/// token it contributes to the session's identifier list.
#[derive(Debug, Clone)]
pub struct IdentifyPattern {
    pub pattern: Regex,
    pub token: String,
}

impl IdentifyPattern {
    pub fn new(pattern: &str, token: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            token: token.into(),
        })
    }
}

/// A device error signature searched in command output.
#[derive(Debug, Clone)]
pub struct ErrorSignature {
    pub name: String,
    pub pattern: Regex,
}

impl ErrorSignature {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
        })
    }
}

/// A scripted answer to a pause the device expects input for, such as a
/// pagination stop or a save confirmation. The reply is written verbatim.
#[derive(Debug, Clone)]
pub struct ConfirmSpec {
    pub pattern: Regex,
    pub reply: String,
}

impl ConfirmSpec {
    pub fn new(pattern: &str, reply: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            reply: reply.into(),
        })
    }
}

/// How privileged mode is reached.
#[derive(Debug, Clone)]
pub struct EnableSpec {
    /// Command that requests privileged mode.
    pub command: String,

    /// Password challenge shape.
    pub password_prompt: Regex,

    /// Whether a repeated challenge after a wrong password is worth one
    /// more attempt before failing.
    pub recoverable_reprompt: bool,
}

impl Default for EnableSpec {
    fn default() -> Self {
        Self {
            command: "enable".to_string(),
            password_prompt: password_prompt(),
            recoverable_reprompt: false,
        }
    }
}

/// How configuration mode is entered and left.
#[derive(Debug, Clone)]
pub struct ConfigSpec {
    pub enter: String,
    pub exit: String,
}

impl Default for ConfigSpec {
    fn default() -> Self {
        Self {
            enter: "configure terminal".to_string(),
            exit: "end".to_string(),
        }
    }
}

/// How running configuration is persisted.
#[derive(Debug, Clone)]
pub struct SaveSpec {
    pub command: String,

    /// Confirmation the save command may ask for, answered inline.
    pub confirm: Option<ConfirmSpec>,
}

/// How high-availability status is queried.
#[derive(Debug, Clone)]
pub struct HaSpec {
    pub command: String,
    pub active: Regex,
    pub standby: Regex,
}

impl HaSpec {
    pub fn new(command: impl Into<String>, active: &str, standby: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            command: command.into(),
            active: Regex::new(active)?,
            standby: Regex::new(standby)?,
        })
    }
}

/// Everything the session needs to know about one device family.
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    /// Catalog name (e.g. "cisco_ios", "arista_eos").
    pub name: String,

    /// Mode-tagged prompt shapes, most specific first.
    pub prompts: Vec<PromptPattern>,

    /// Identification patterns, in declaration order.
    pub identify: Vec<IdentifyPattern>,

    /// Command that turns pagination off, sent once after identification.
    pub pagination_disable: Option<String>,

    /// Pagination pause answered inline while a command runs.
    pub pagination_prompt: Option<ConfirmSpec>,

    /// Error signatures searched in command output.
    pub error_signatures: Vec<ErrorSignature>,

    /// How privileged mode is reached.
    pub enable: EnableSpec,

    /// How configuration mode is entered and left.
    pub config: ConfigSpec,

    /// How configuration is persisted, when the family supports it.
    pub save: Option<SaveSpec>,

    /// How HA status is queried, when the family supports it.
    pub ha_status: Option<HaSpec>,
}

impl DeviceCatalog {
    /// Create a catalog with default enable and config commands and
    /// nothing else.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompts: Vec::new(),
            identify: Vec::new(),
            pagination_disable: None,
            pagination_prompt: None,
            error_signatures: Vec::new(),
            enable: EnableSpec::default(),
            config: ConfigSpec::default(),
            save: None,
            ha_status: None,
        }
    }

    /// Add a prompt shape. Declaration order is the match order, so add
    /// the most specific shapes first.
    pub fn with_prompt(mut self, prompt: PromptPattern) -> Self {
        self.prompts.push(prompt);
        self
    }

    /// Add an identification pattern.
    pub fn with_identify(mut self, pattern: IdentifyPattern) -> Self {
        self.identify.push(pattern);
        self
    }

    /// Set the pagination-disable command.
    pub fn with_pagination_disable(mut self, command: impl Into<String>) -> Self {
        self.pagination_disable = Some(command.into());
        self
    }

    /// Set the pagination pause and its answer.
    pub fn with_pagination_prompt(mut self, confirm: ConfirmSpec) -> Self {
        self.pagination_prompt = Some(confirm);
        self
    }

    /// Add an error signature.
    pub fn with_error(mut self, signature: ErrorSignature) -> Self {
        self.error_signatures.push(signature);
        self
    }

    /// Set how privileged mode is reached.
    pub fn with_enable(mut self, enable: EnableSpec) -> Self {
        self.enable = enable;
        self
    }

    /// Set how configuration mode is entered and left.
    pub fn with_config(mut self, config: ConfigSpec) -> Self {
        self.config = config;
        self
    }

    /// Set how configuration is persisted.
    pub fn with_save(mut self, save: SaveSpec) -> Self {
        self.save = Some(save);
        self
    }

    /// Set how HA status is queried.
    pub fn with_ha_status(mut self, ha: HaSpec) -> Self {
        self.ha_status = Some(ha);
        self
    }
}
