//! Section Target Resolution
//!
//! Decides which document sections a change touches, either from changed
//! paths or from a `SECTION_TARGETS:` line emitted by the model.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::constants::markers;
use crate::types::{SectionKey, TargetSource};

/// Sections to regenerate this cycle
///
/// Always contains `changelog`; `architecture` always brings `overview`
/// and `diagram` with it. Iterates in canonical section order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TargetSectionSet(BTreeSet<SectionKey>);

impl TargetSectionSet {
    pub fn from_keys<I: IntoIterator<Item = SectionKey>>(keys: I) -> Self {
        let mut set: BTreeSet<SectionKey> = keys.into_iter().collect();
        if set.contains(&SectionKey::Architecture) {
            set.insert(SectionKey::Overview);
            set.insert(SectionKey::Diagram);
        }
        set.insert(SectionKey::Changelog);
        Self(set)
    }

    pub fn contains(&self, key: SectionKey) -> bool {
        self.0.contains(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = SectionKey> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> Vec<SectionKey> {
        self.iter().collect()
    }
}

impl Default for TargetSectionSet {
    fn default() -> Self {
        Self::from_keys([])
    }
}

impl std::fmt::Display for TargetSectionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(|k| k.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

/// Target set plus where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTargets {
    pub sections: TargetSectionSet,
    pub source: TargetSource,
}

// =============================================================================
// Heuristic
// =============================================================================

/// Sections implied by changed paths
pub fn heuristic_targets<S: AsRef<str>>(paths: &[S]) -> TargetSectionSet {
    let mut keys = Vec::new();

    for path in paths {
        let lower = path.as_ref().to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["main", "app", "config"]) {
            keys.push(SectionKey::Overview);
        }
        if has(&["router", "endpoint", "controller"]) {
            keys.extend([SectionKey::Architecture, SectionKey::Diagram, SectionKey::Modules]);
        }
        if has(&["model", "schema", "entity", "service", "handler"]) {
            keys.push(SectionKey::Modules);
        }
        // test/spec paths only touch the changelog, which is always present
    }

    TargetSectionSet::from_keys(keys)
}

// =============================================================================
// Model Marker
// =============================================================================

/// Text after `SECTION_TARGETS:` when `line` is a marker line
fn marker_payload(line: &str) -> Option<&str> {
    let line = line
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '>') || c.is_whitespace())
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace());

    let prefix = markers::SECTION_TARGETS;
    if line.len() < prefix.len() || !line.is_char_boundary(prefix.len()) {
        return None;
    }
    let (head, rest) = line.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    // Emphasis may close right after the colon: "**SECTION_TARGETS:** a,b"
    Some(rest.trim_start_matches('*').trim())
}

/// Parse the first `SECTION_TARGETS:` line in `text`.
///
/// Returns `None` when no marker line exists. Unknown names are skipped.
pub fn parse_target_marker(text: &str) -> Option<Vec<SectionKey>> {
    let payload = text.lines().find_map(marker_payload)?;

    let mut keys = Vec::new();
    for name in payload
        .split([',', ';'])
        .map(|n| n.trim().trim_matches(['`', '"', '\'', '*']).trim())
        .filter(|n| !n.is_empty())
    {
        match name.parse::<SectionKey>() {
            Ok(key) if !keys.contains(&key) => keys.push(key),
            Ok(_) => {}
            Err(_) => warn!("Ignoring unknown section target from model: {}", name),
        }
    }
    Some(keys)
}

/// Remove marker lines so the analysis text reads cleanly downstream
pub fn strip_target_marker(text: &str) -> String {
    text.lines()
        .filter(|line| marker_payload(line).is_none())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}

// =============================================================================
// Resolution
// =============================================================================

/// Model targets win when non-empty, otherwise fall back to path heuristics
pub fn resolve<S: AsRef<str>>(paths: &[S], model_targets: Option<&[SectionKey]>) -> ResolvedTargets {
    let resolved = match model_targets {
        Some(keys) if !keys.is_empty() => ResolvedTargets {
            sections: TargetSectionSet::from_keys(keys.iter().copied()),
            source: TargetSource::Model,
        },
        _ => ResolvedTargets {
            sections: heuristic_targets(paths),
            source: TargetSource::Heuristic,
        },
    };

    debug!(
        "Resolved targets [{}] from {:?}",
        resolved.sections, resolved.source
    );
    resolved
}
