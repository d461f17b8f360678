//! Cisco NX-OS (Nexus) device catalog.
//!
//! NX-OS shares the IOS prompt shapes but reports errors and redundancy
//! state with its own wording.

use crate::catalog::{DeviceCatalog, ErrorSignature, HaSpec, IdentifyPattern, SaveSpec};
use crate::channel::{PromptMode, PromptPattern};

/// Create the Cisco NX-OS catalog.
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

    DeviceCatalog::new("cisco_nxos")
        .with_prompt(config_sub)
        .with_prompt(config)
        .with_prompt(privileged)
        .with_prompt(unprivileged)
        .with_identify(IdentifyPattern::new(r"(?i)cisco ", "Cisco").unwrap())
        .with_identify(IdentifyPattern::new(r"NX-OS", "NX-OS").unwrap())
        .with_identify(IdentifyPattern::new(r"Nexus", "Nexus").unwrap())
        .with_pagination_disable("terminal length 0")
        .with_error(ErrorSignature::new("invalid command", r"(?m)^% Invalid command").unwrap())
        .with_error(ErrorSignature::new("permission denied", r"(?m)^% Permission denied").unwrap())
        .with_save(SaveSpec {
            command: "copy running-config startup-config".to_string(),
            confirm: None,
        })
        .with_ha_status(
            HaSpec::new(
                "show system redundancy status",
                r"Redundancy state:\s+Active",
                r"Redundancy state:\s+Standby",
            )
            .unwrap(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cisco_nxos_catalog() {
        let catalog = catalog();
        assert_eq!(catalog.name, "cisco_nxos");
        assert_eq!(catalog.prompts.len(), 4);
        assert!(catalog.save.is_some());
        assert!(catalog.pagination_prompt.is_none());
    }

    #[test]
    fn test_identify_patterns_match_nexus_banner() {
        let banner = b"Cisco Nexus Operating System (NX-OS) Software";
        let catalog = catalog();

        let tokens: Vec<&str> = catalog
            .identify
            .iter()
            .filter(|id| id.pattern.is_match(banner))
            .map(|id| id.token.as_str())
            .collect();

        assert_eq!(tokens, vec!["Cisco", "NX-OS", "Nexus"]);
    }

    #[test]
    fn test_ha_patterns_read_redundancy_output() {
        let catalog = catalog();
        let ha = catalog.ha_status.as_ref().unwrap();

        assert!(ha.active.is_match(b"Redundancy state:   Active"));
        assert!(ha.standby.is_match(b"Redundancy state:   Standby"));
        assert!(!ha.active.is_match(b"Redundancy state:   Standby"));
    }
}
