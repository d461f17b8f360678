//! Cisco IOS and IOS-XE device catalog.
//!
//! Covers classic IOS routers and switches (and IOS-XE, which keeps the
//! same CLI surface).
//!
//! # Prompt Examples
//!
//! ```text
//! Router>                    unprivileged exec
//! Router#                    privileged exec
//! Router(config)#            global configuration
//! Router(config-if)#         configuration sub-mode (interface)
//! ```

use crate::catalog::{
    ConfirmSpec, DeviceCatalog, EnableSpec, ErrorSignature, HaSpec, IdentifyPattern, SaveSpec,
};
use crate::channel::{PromptMode, PromptPattern};

/// Create the Cisco IOS catalog.
pub fn catalog() -> DeviceCatalog {
    // Most specific shapes first: declaration order is match order.
    let config_sub = PromptPattern::new(
        PromptMode::ConfigSub,
        r"[\w.\-@/: ]{1,63}\(config-[\w.\-@/:+]{0,63}\)#",
    )
    .unwrap();

    let config = PromptPattern::new(PromptMode::ConfigGlobal, r"[\w.\-@/: ]{1,63}\(config\)#")
        .unwrap();

    let privileged = PromptPattern::new(PromptMode::Privileged, r"[\w.\-@()/: ]{1,63}#")
        .unwrap()
        .not_contains("(config");

    let unprivileged = PromptPattern::new(PromptMode::Unprivileged, r"[\w.\-@()/: ]{1,63}>")
        .unwrap();

    DeviceCatalog::new("cisco_ios")
        .with_prompt(config_sub)
        .with_prompt(config)
        .with_prompt(privileged)
        .with_prompt(unprivileged)
        .with_identify(IdentifyPattern::new(r"(?i)cisco ", "Cisco").unwrap())
        .with_identify(IdentifyPattern::new(r" IOS ", "IOS").unwrap())
        .with_identify(IdentifyPattern::new(r"IOS[ -]XE", "IOS-XE").unwrap())
        .with_identify(IdentifyPattern::new(r" C3750 ", "C3750").unwrap())
        .with_pagination_disable("terminal length 0")
        .with_pagination_prompt(ConfirmSpec::new(r"--More--", " ").unwrap())
        .with_error(ErrorSignature::new("invalid input", r"(?m)^% Invalid input").unwrap())
        .with_error(ErrorSignature::new("incomplete command", r"(?m)^% Incomplete command").unwrap())
        .with_error(ErrorSignature::new("ambiguous command", r"(?m)^% Ambiguous command").unwrap())
        .with_error(
            ErrorSignature::new("authorization failed", r"Command authorization failed").unwrap(),
        )
        .with_enable(EnableSpec {
            // IOS reprompts `Password:` after a bad enable password, so one
            // retry is worth attempting.
            recoverable_reprompt: true,
            ..EnableSpec::default()
        })
        .with_save(SaveSpec {
            command: "copy running-config startup-config".to_string(),
            confirm: Some(
                ConfirmSpec::new(r"Destination filename \[startup-config\]\?", "\r").unwrap(),
            ),
        })
        .with_ha_status(
            HaSpec::new(
                "show redundancy",
                r"Current Software state = ACTIVE",
                r"Current Software state = STANDBY",
            )
            .unwrap(),
        )
}
