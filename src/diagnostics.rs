//! Per-pass collection diagnostics
//!
//! Records how well each fallback chain did and which probes faulted during
//! one snapshot pass. Diagnostics never feed back into the record; they are
//! logged by the orchestrator and printed by `--diagnose`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chains::AttemptResult;

/// Quality tier at which an attribute was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ServiceLevel {
    /// Primary source answered
    Full = 3,
    /// A secondary source answered
    Fallback = 2,
    /// Gated off (missing capability or trust)
    Gated = 1,
    /// No source answered
    #[default]
    Unavailable = 0,
}

impl ServiceLevel {
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Full | Self::Fallback)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Full => "✅",
            Self::Fallback => "🔄",
            Self::Gated => "⛔",
            Self::Unavailable => "❌",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Fallback => "Fallback",
            Self::Gated => "Gated",
            Self::Unavailable => "Unavailable",
        }
    }
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.emoji(), self.name())
    }
}

/// Logical attribute served by a fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainKind {
    Location,
    Geocoding,
    LocalAddress,
    IspEnrichment,
    CellularId,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// How one chain fared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainReport {
    pub chain: ChainKind,
    pub service_level: ServiceLevel,
    /// Source that produced the value
    pub source: Option<String>,
    /// Why the chain was gated or came up empty
    pub note: Option<String>,
    pub attempts: Vec<AttemptResult>,
}

impl ChainReport {
    pub fn gated(chain: ChainKind, note: impl Into<String>) -> Self {
        Self {
            chain,
            service_level: ServiceLevel::Gated,
            source: None,
            note: Some(note.into()),
            attempts: Vec::new(),
        }
    }
}

/// A probe that fell back to its default value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFault {
    /// Record field (or group of fields) affected
    pub field: String,
    pub reason: String,
}

/// Everything observed during one pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionDiagnostics {
    pub chains: Vec<ChainReport>,
    pub probe_faults: Vec<ProbeFault>,
}

impl CollectionDiagnostics {
    pub fn chain(&self, kind: ChainKind) -> Option<&ChainReport> {
        self.chains.iter().find(|c| c.chain == kind)
    }

    pub fn has_fault(&self, field: &str) -> bool {
        self.probe_faults.iter().any(|f| f.field == field)
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let operational = self
            .chains
            .iter()
            .filter(|c| c.service_level.is_operational())
            .count();
        format!(
            "{}/{} chains operational, {} probe fault(s)",
            operational,
            self.chains.len(),
            self.probe_faults.len()
        )
    }

    pub fn format_text(&self) -> String {
        let mut output = String::new();

        output.push_str("\n=== Fallback Chains ===\n\n");
        for report in &self.chains {
            output.push_str(&format!("{} - {}\n", report.chain, report.service_level));
            if let Some(source) = &report.source {
                output.push_str(&format!("   Source: {source}\n"));
            }
            if let Some(note) = &report.note {
                output.push_str(&format!("   Note: {note}\n"));
            }
            for attempt in &report.attempts {
                let status = if attempt.success { "✅" } else { "❌" };
                output.push_str(&format!(
                    "     {} {} ({}ms)\n",
                    status, attempt.source_name, attempt.duration_ms
                ));
                if let Some(err) = &attempt.error {
                    output.push_str(&format!("        Error: {err}\n"));
                }
            }
        }

        if !self.probe_faults.is_empty() {
            output.push_str("\n=== Probe Faults ===\n\n");
            for fault in &self.probe_faults {
                output.push_str(&format!("  ⚠️  {} - {}\n", fault.field, fault.reason));
            }
        }

        output
    }
}
