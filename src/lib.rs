//! # device-snapshot
//!
//! Permission-gated device attribute collection.
//!
//! A caller asks for one snapshot of the device. The crate classifies the
//! capabilities the requested enrichments need, requests the missing ones at
//! most once, assembles a fixed-shape attribute record from best-effort
//! probes and provider fallback chains, and hands back a base64-encoded JSON
//! payload through a one-shot success callback.
//!
//! # Architecture
//!
//! ```text
//! device-snapshot
//!   ├─> CollectionOrchestrator (classify → request → collect → callbacks)
//!   │     ├─> PermissionGate (host authorization store)
//!   │     └─> SettingsPrompt (settings redirect on permanent denial)
//!   └─> SnapshotAssembler (one pass, on worker tasks)
//!         ├─> Probes: hardware, system, connectivity, security, identity
//!         ├─> Chains: location (+ reverse geocoding), cellular id, network
//!         └─> Encoder (JSON envelope → base64)
//! ```
//!
//! # Data Flow
//!
//! **Baseline:** flags → classify → nothing missing → one pass → success
//!
//! **Enriched:** flags → classify → request missing → denial callback and
//! remediation prompt if needed → one pass → success
//!
//! Every platform read goes through [`platform::DevicePlatform`]; the
//! [`platform::linux`] module provides a host implementation for the CLI.

#![warn(clippy::all)]

/// Snapshot assembly from probes and chains
pub mod assembler;

/// Provider fallback chains: location, cellular identity, network
pub mod chains;

/// TOML configuration
pub mod config;

/// Per-pass service levels and probe faults
pub mod diagnostics;

/// Payload encoding and decoding
pub mod encoder;

/// Permission-gated collection flow
pub mod orchestrator;

/// Capabilities, grant states and the permission gate
pub mod permissions;

/// Host platform traits and the Linux host
pub mod platform;

/// Best-effort attribute probes
pub mod probes;

/// The attribute record and its enums
pub mod record;

#[cfg(test)]
pub(crate) mod testing;

pub use assembler::{AssemblyError, CollectorSettings, SnapshotAssembler};
pub use diagnostics::{CollectionDiagnostics, ServiceLevel};
pub use orchestrator::{
    CollectCallbacks, CollectionOrchestrator, CollectionSummary, EnrichmentFlags, PassKind,
};
pub use permissions::{Capability, CapabilitySet, GrantState, PermissionGate};
pub use platform::DevicePlatform;
pub use record::AttributeRecord;
