//! Cisco ASA device catalog.
//!
//! ASA firewalls page output with `<--- More --->` instead of `--More--`
//! and disable it with `terminal pager 0`. On a failover pair the standby
//! unit rejects configuration with `Cannot make changes on the standby
//! unit`, which is surfaced as an error signature; `show failover` drives
//! the HA status check.

use crate::catalog::{
    ConfirmSpec, DeviceCatalog, EnableSpec, ErrorSignature, HaSpec, IdentifyPattern, SaveSpec,
};
use crate::channel::{PromptMode, PromptPattern};

/// Create the Cisco ASA catalog.
pub fn catalog() -> DeviceCatalog {
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

    DeviceCatalog::new("cisco_asa")
        .with_prompt(config_sub)
        .with_prompt(config)
        .with_prompt(privileged)
        .with_prompt(unprivileged)
        .with_identify(IdentifyPattern::new(r"(?i)cisco ", "Cisco").unwrap())
        .with_identify(IdentifyPattern::new(r"Adaptive Security Appliance", "ASA").unwrap())
        .with_identify(IdentifyPattern::new(r"\bASA\b", "ASA").unwrap())
        .with_pagination_disable("terminal pager 0")
        .with_pagination_prompt(ConfirmSpec::new(r"<--- More --->", " ").unwrap())
        .with_error(ErrorSignature::new("error", r"(?m)^ERROR: ").unwrap())
        .with_error(ErrorSignature::new("invalid input", r"(?m)^% Invalid input").unwrap())
        .with_error(
            ErrorSignature::new("standby unit", r"(?m)^Cannot make changes").unwrap(),
        )
        .with_enable(EnableSpec {
            recoverable_reprompt: true,
            ..EnableSpec::default()
        })
        .with_save(SaveSpec {
            command: "write memory".to_string(),
            confirm: None,
        })
        .with_ha_status(
            HaSpec::new(
                "show failover",
                r"This host: \w+ - Active",
                r"This host: \w+ - Standby",
            )
            .unwrap(),
        )
}
