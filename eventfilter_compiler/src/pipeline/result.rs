use crate::assembly::{AssemblyStats, EventFilter};
use crate::reference_resolution::ResolutionStats;
use serde::Serialize;
use std::time::Duration;

/// Per-pass counts for one compilation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompileStats {
    pub input_bytes: usize,
    pub operand_nodes: usize,
    pub bindings: usize,
    pub resolution: ResolutionStats,
    pub assembly: AssemblyStats,
    pub duration: Duration,
}

/// Compiled filter plus statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResult {
    pub filter: EventFilter,
    pub stats: CompileStats,
}

impl CompileResult {
    pub fn new(filter: EventFilter, stats: CompileStats) -> Self {
        Self { filter, stats }
    }

    pub fn log_success(&self) {
        crate::log_success!(
            crate::logging::codes::success::COMPILATION_COMPLETE,
            "Event filter compilation succeeded",
            "select_entries" => self.filter.select.len(),
            "elements" => self.filter.elements.len(),
            "operand_nodes" => self.stats.operand_nodes,
            "duration_ms" => format!("{:.3}", self.stats.duration.as_secs_f64() * 1000.0)
        );
    }
}
