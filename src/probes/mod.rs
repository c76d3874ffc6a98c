//! Capability probes
//!
//! Synchronous best-effort reads of single platform attributes, grouped by
//! concern. A probe never fails: every [`ProbeError`] is logged, recorded in
//! the pass's [`FaultLog`] and replaced with the field's null or placeholder
//! value.

pub mod connectivity;
pub mod hardware;
pub mod identity;
pub mod security;
pub mod system;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
    assembler::CollectorSettings,
    diagnostics::ProbeFault,
    permissions::{Capability, CapabilitySet},
    platform::{BuildInfo, DevicePlatform, ProbeError, ProcessIdentity},
};

/// Lowercase hex SHA-256 of `input`
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Non-blank string or `None`
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Probe faults seen during one pass
#[derive(Debug, Default)]
pub struct FaultLog {
    faults: Vec<ProbeFault>,
}

impl FaultLog {
    /// Unwrap a read, recording the fault under `field` on error
    pub fn read<T>(&mut self, field: &str, result: Result<T, ProbeError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(field, "Probe fell back to default: {e}");
                self.faults.push(ProbeFault {
                    field: field.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    pub fn read_or<T>(&mut self, field: &str, result: Result<T, ProbeError>, default: T) -> T {
        self.read(field, result).unwrap_or(default)
    }

    pub fn into_faults(self) -> Vec<ProbeFault> {
        self.faults
    }
}

/// Everything a probe group needs for one pass
pub struct ProbeContext<'a> {
    pub platform: &'a dyn DevicePlatform,
    pub granted: &'a CapabilitySet,
    pub settings: &'a CollectorSettings,
    /// Read once per pass; several groups derive fields from it
    pub build: BuildInfo,
    pub process: Option<ProcessIdentity>,
    pub faults: FaultLog,
}

impl<'a> ProbeContext<'a> {
    pub fn new(
        platform: &'a dyn DevicePlatform,
        granted: &'a CapabilitySet,
        settings: &'a CollectorSettings,
    ) -> Self {
        let mut faults = FaultLog::default();
        let build = faults
            .read("build", platform.build_info())
            .unwrap_or_default();
        let process = faults.read("process", platform.process_identity());

        Self {
            platform,
            granted,
            settings,
            build,
            process,
            faults,
        }
    }

    pub fn is_granted(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }
}
