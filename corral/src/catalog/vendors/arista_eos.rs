//! Arista EOS device catalog.

use crate::catalog::{
    ConfirmSpec, DeviceCatalog, EnableSpec, ErrorSignature, IdentifyPattern, SaveSpec,
};
use crate::channel::{PromptMode, PromptPattern};

/// Create the Arista EOS catalog.
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

    DeviceCatalog::new("arista_eos")
        .with_prompt(config_sub)
        .with_prompt(config)
        .with_prompt(privileged)
        .with_prompt(unprivileged)
        .with_identify(IdentifyPattern::new(r"Arista", "Arista").unwrap())
        .with_identify(IdentifyPattern::new(r"vEOS", "vEOS").unwrap())
        .with_identify(IdentifyPattern::new(r"\bEOS\b", "EOS").unwrap())
        .with_pagination_disable("terminal length 0")
        .with_pagination_prompt(ConfirmSpec::new(r"--More--", " ").unwrap())
        .with_error(ErrorSignature::new("invalid input", r"(?m)^% Invalid input").unwrap())
        .with_error(
            ErrorSignature::new("authorization denied", r"(?m)^% Authorization denied").unwrap(),
        )
        .with_enable(EnableSpec {
            recoverable_reprompt: true,
            ..EnableSpec::default()
        })
        .with_save(SaveSpec {
            command: "write memory".to_string(),
            confirm: None,
        })
}
