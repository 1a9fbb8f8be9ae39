//! Reference Resolution statistics

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    /// FOR-clause assignments
    pub bindings: usize,
    /// Reference nodes reached from the roots and resolved
    pub references_resolved: usize,
    /// Bound nodes reached through more than one reference
    pub shared_targets: usize,
    /// Bindings never reached from the select list or the WHERE root
    pub unused_bindings: usize,
    /// Longest `$a := $b := ...` chain followed
    pub max_alias_chain: usize,
}

impl ResolutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether aliasing produced shared sub-expressions
    pub fn has_sharing(&self) -> bool {
        self.shared_targets > 0
    }

    /// Create summary string for logging and reporting
    pub fn summary(&self) -> String {
        format!(
            "Resolution: {} references, {} bindings ({} unused), {} shared",
            self.references_resolved, self.bindings, self.unused_bindings, self.shared_targets
        )
    }
}
