//! Device identification: score catalogs against probe command output.
//!
//! Identification runs right after the prompt is discovered and before
//! pagination is disabled, because the pagination-disable command is itself
//! vendor specific. The probe commands therefore run with a built-in set of
//! pagination guards so a paging device cannot wedge the probe.

use indexmap::IndexSet;

use crate::catalog::{CatalogRegistry, DeviceCatalog, DeviceProfile};
use crate::channel::Expectation;

/// Diagnostic commands whose combined raw output is scanned for
/// identification patterns.
pub(crate) const PROBE_COMMANDS: &[&str] = &["show version"];

/// Pagination pauses answered inline while the probe runs, before any
/// catalog is active. Covers the common IOS-style and ASA-style banners.
pub(crate) fn pagination_guards() -> Vec<Expectation> {
    [r"--More--", r"<--- More --->"]
        .iter()
        .map(|pattern| {
            Expectation::continuation(pattern, " ").expect("builtin pagination pattern compiles")
        })
        .collect()
}

/// Score every catalog against combined probe output and build the profile.
///
/// One point per distinct identification token that matched; the highest
/// score wins and ties go to the earlier registration. No points at all
/// means the generic fallback profile.
pub(crate) fn select_profile(output: &str, registry: &CatalogRegistry) -> DeviceProfile {
    let mut best: Option<(DeviceCatalog, IndexSet<String>)> = None;
    let mut best_score = 0;

    for catalog in registry.iter() {
        let tokens = matching_tokens(catalog, output);
        if tokens.len() > best_score {
            best_score = tokens.len();
            best = Some((catalog.clone(), tokens));
        }
    }

    match best {
        Some((catalog, identifiers)) => DeviceProfile::identified(catalog, identifiers),
        None => DeviceProfile::generic(),
    }
}

/// Build a profile for an explicitly pinned catalog. Scoring is skipped;
/// the probe output still contributes whatever tokens it matched.
pub(crate) fn pin_profile(catalog: DeviceCatalog, output: &str) -> DeviceProfile {
    let identifiers = matching_tokens(&catalog, output);
    DeviceProfile::identified(catalog, identifiers)
}

/// Distinct tokens whose patterns match `output`, in declaration order.
fn matching_tokens(catalog: &DeviceCatalog, output: &str) -> IndexSet<String> {
    catalog
        .identify
        .iter()
        .filter(|p| p.pattern.is_match(output.as_bytes()))
        .map(|p| p.token.clone())
        .collect()
}
