//! Plain-data catalog definitions, for loading from JSON or YAML.
//!
//! [`CatalogSpec`] mirrors [`DeviceCatalog`] with every pattern held as a
//! string. `compile` turns a deserialized spec into a usable catalog,
//! reporting the first bad pattern instead of panicking, so catalogs can
//! come from files the crate never saw at build time.

use serde::{Deserialize, Serialize};

use super::{
    ConfigSpec, ConfirmSpec, DeviceCatalog, EnableSpec, ErrorSignature, HaSpec, IdentifyPattern,
    SaveSpec,
};
use crate::channel::{PromptMode, PromptPattern};
use crate::error::{CatalogError, Result};

/// Serializable mirror of [`DeviceCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSpec {
    pub name: String,
    #[serde(default)]
    pub prompts: Vec<PromptDef>,
    #[serde(default)]
    pub identify: Vec<IdentifyDef>,
    #[serde(default)]
    pub pagination_disable: Option<String>,
    #[serde(default)]
    pub pagination_prompt: Option<ConfirmDef>,
    #[serde(default)]
    pub error_signatures: Vec<SignatureDef>,
    #[serde(default)]
    pub enable: Option<EnableDef>,
    #[serde(default)]
    pub config: Option<ConfigDef>,
    #[serde(default)]
    pub save: Option<SaveDef>,
    #[serde(default)]
    pub ha_status: Option<HaDef>,
}

/// One prompt shape: a mode tag, a pattern, and negative matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDef {
    pub mode: PromptMode,
    pub pattern: String,
    #[serde(default)]
    pub not_contains: Vec<String>,
}

/// One identification pattern and the token it contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyDef {
    pub pattern: String,
    pub token: String,
}

/// A scripted answer to a pagination or confirmation pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmDef {
    pub pattern: String,
    pub reply: String,
}

/// A named device error signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureDef {
    pub name: String,
    pub pattern: String,
}

/// Enable command and challenge handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnableDef {
    pub command: String,
    /// Password challenge pattern; the built-in shape when omitted.
    #[serde(default)]
    pub password_prompt: Option<String>,
    #[serde(default)]
    pub recoverable_reprompt: bool,
}

/// Configuration mode entry and exit commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDef {
    pub enter: String,
    pub exit: String,
}

/// Save command with an optional scripted confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDef {
    pub command: String,
    #[serde(default)]
    pub confirm: Option<ConfirmDef>,
}

/// HA status command and the patterns that decide the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaDef {
    pub command: String,
    pub active: String,
    pub standby: String,
}

impl CatalogSpec {
    /// Compile the string patterns into a [`DeviceCatalog`].
    pub fn compile(&self) -> Result<DeviceCatalog> {
        let mut catalog = DeviceCatalog::new(&self.name);

        for def in &self.prompts {
            let mut prompt = PromptPattern::new(def.mode, &def.pattern)
                .map_err(|e| bad(&self.name, "prompt", &def.pattern, e))?;
            for needle in &def.not_contains {
                prompt = prompt.not_contains(needle);
            }
            catalog.prompts.push(prompt);
        }

        for def in &self.identify {
            catalog.identify.push(
                IdentifyPattern::new(&def.pattern, &def.token)
                    .map_err(|e| bad(&self.name, "identify", &def.pattern, e))?,
            );
        }

        catalog.pagination_disable = self.pagination_disable.clone();
        if let Some(def) = &self.pagination_prompt {
            catalog.pagination_prompt = Some(
                ConfirmSpec::new(&def.pattern, &def.reply)
                    .map_err(|e| bad(&self.name, "pagination", &def.pattern, e))?,
            );
        }

        for def in &self.error_signatures {
            catalog.error_signatures.push(
                ErrorSignature::new(&def.name, &def.pattern)
                    .map_err(|e| bad(&self.name, "error signature", &def.pattern, e))?,
            );
        }

        if let Some(def) = &self.enable {
            let mut enable = EnableSpec {
                command: def.command.clone(),
                recoverable_reprompt: def.recoverable_reprompt,
                ..EnableSpec::default()
            };
            if let Some(pattern) = &def.password_prompt {
                enable.password_prompt = regex::bytes::Regex::new(pattern)
                    .map_err(|e| bad(&self.name, "enable", pattern, e))?;
            }
            catalog.enable = enable;
        }

        if let Some(def) = &self.config {
            catalog.config = ConfigSpec {
                enter: def.enter.clone(),
                exit: def.exit.clone(),
            };
        }

        if let Some(def) = &self.save {
            let confirm = match &def.confirm {
                Some(c) => Some(
                    ConfirmSpec::new(&c.pattern, &c.reply)
                        .map_err(|e| bad(&self.name, "save confirm", &c.pattern, e))?,
                ),
                None => None,
            };
            catalog.save = Some(SaveSpec {
                command: def.command.clone(),
                confirm,
            });
        }

        if let Some(def) = &self.ha_status {
            catalog.ha_status = Some(
                HaSpec::new(&def.command, &def.active, &def.standby)
                    .map_err(|e| bad(&self.name, "ha_status", &def.active, e))?,
            );
        }

        Ok(catalog)
    }
}

fn bad(catalog: &str, field: &str, pattern: &str, err: regex::Error) -> crate::error::Error {
    CatalogError::InvalidDefinition {
        message: format!("{catalog}: {field} pattern '{pattern}': {err}"),
    }
    .into()
}
