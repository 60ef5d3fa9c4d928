//! Evidence identity: canonicalize a source reference, then hash it.
//!
//! `EvidenceId` must be stable across processes, so it is computed with a fixed,
//! non-randomized hash (FNV-1a) rather than `std::collections::hash_map::DefaultHasher`,
//! whose seed is randomized per-process and would make two runs disagree on the id of
//! identical evidence.

use crate::ids::EvidenceId;
use serde::{Deserialize, Serialize};

/// Where a piece of evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Log,
    Code,
    Domain,
    Metric,
    Change,
    Runbook,
    Trace,
}

/// How strongly this evidence supports the claim it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

/// A fact with a citeable source; identity is a content hash of its canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: EvidenceId,
    pub source_kind: SourceKind,
    pub source_ref: String,
    pub description: String,
    pub strength: Strength,
    pub producing_agent: String,
}

/// Canonicalize a source reference so that trivially-different spellings of the same
/// source (trailing slash, mixed case scheme, incidental whitespace) collapse to one
/// evidence id. This intentionally does *not* normalize line numbers or offsets within
/// the reference — `log.txt:42` and `log.txt:57` are genuinely different citations.
pub fn canonicalize_source_ref(source_ref: &str) -> String {
    source_ref.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// Compute the stable evidence id for a (source_kind, canonical source_ref,
/// description) triple. Two specialists citing the same source with the same
/// description collapse to the same id; a different description against the same
/// source_ref is treated as distinct evidence since it documents a different claim.
pub fn evidence_id_for(source_kind: SourceKind, source_ref: &str, description: &str) -> EvidenceId {
    let canonical_ref = canonicalize_source_ref(source_ref);
    let mut key = String::with_capacity(canonical_ref.len() + description.len() + 16);
    key.push_str(&format!("{source_kind:?}"));
    key.push('\0');
    key.push_str(&canonical_ref);
    key.push('\0');
    key.push_str(description.trim());
    EvidenceId(crate::hash::fnv1a_64(key.as_bytes()))
}

impl Evidence {
    /// Build an `Evidence` record, deriving its id from the canonicalized source_ref.
    pub fn new(
        source_kind: SourceKind,
        source_ref: impl Into<String>,
        description: impl Into<String>,
        strength: Strength,
        producing_agent: impl Into<String>,
    ) -> Self {
        let source_ref = source_ref.into();
        let description = description.into();
        let evidence_id = evidence_id_for(source_kind, &source_ref, &description);
        Self {
            evidence_id,
            source_kind,
            source_ref: canonicalize_source_ref(&source_ref),
            description,
            strength,
            producing_agent: producing_agent.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_collapses_trivial_variants() {
        assert_eq!(
            canonicalize_source_ref("HTTP://Host/path/"),
            canonicalize_source_ref("http://host/path")
        );
        assert_eq!(canonicalize_source_ref("  file.log  "), "file.log");
    }

    #[test]
    fn identical_source_and_description_dedupe() {
        let a = evidence_id_for(SourceKind::Log, "host/app.log:12", "nil pointer panic");
        let b = evidence_id_for(SourceKind::Log, "HOST/app.log:12/", "nil pointer panic");
        assert_eq!(a, b);
    }

    #[test]
    fn different_line_offsets_are_distinct() {
        let a = evidence_id_for(SourceKind::Log, "app.log:12", "panic");
        let b = evidence_id_for(SourceKind::Log, "app.log:57", "panic");
        assert_ne!(a, b);
    }

    #[test]
    fn different_source_kind_is_distinct_even_with_same_ref() {
        let a = evidence_id_for(SourceKind::Log, "ref", "desc");
        let b = evidence_id_for(SourceKind::Code, "ref", "desc");
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_deterministic() {
        let a = evidence_id_for(SourceKind::Metric, "cpu.p99", "spike");
        let b = evidence_id_for(SourceKind::Metric, "cpu.p99", "spike");
        assert_eq!(a, b);
    }
}
