//! Collection orchestrator
//!
//! Drives one `collect()` call from the caller's enrichment flags to the
//! success callback:
//!
//! ```text
//! Idle ─▶ Classifying ─┬─ nothing missing ─────────────────▶ Collecting (baseline) ─▶ Done
//!                      └─ missing ─▶ Requesting ─▶ denial callback / remediation
//!                                                 └─────────▶ Collecting (enriched) ─▶ Done
//! ```
//!
//! The success callback fires exactly once per call and the snapshot runs at
//! most twice. Callbacks are invoked from the task that awaits `collect()`,
//! never from the worker that assembles the record. Calls on one orchestrator
//! are serialised, so at most one permission request is ever outstanding.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    assembler::{AssemblyError, SnapshotAssembler},
    diagnostics::CollectionDiagnostics,
    encoder,
    permissions::{
        Capability, CapabilitySet, PermissionClassification, PermissionGate, RemediationChoice,
        SettingsPrompt,
    },
};

/// Which optional data the caller wants, and whether to guide the user to settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentFlags {
    /// Precise location and Wi-Fi SSID; needs fine location
    pub location_enrichment: bool,
    /// Call state and cellular identity; needs phone state
    pub telephony_enrichment: bool,
    /// Show the settings-redirect prompt on permanent denial
    pub guided_remediation: bool,
}

impl EnrichmentFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, enabled: bool) -> Self {
        self.location_enrichment = enabled;
        self
    }

    pub fn with_telephony(mut self, enabled: bool) -> Self {
        self.telephony_enrichment = enabled;
        self
    }

    pub fn with_guided_remediation(mut self, enabled: bool) -> Self {
        self.guided_remediation = enabled;
        self
    }

    /// Capabilities implied by the enabled enrichments
    pub fn required_capabilities(&self) -> CapabilitySet {
        let mut required = CapabilitySet::new();
        if self.location_enrichment {
            required.insert(Capability::FineLocation);
        }
        if self.telephony_enrichment {
            required.insert(Capability::PhoneState);
        }
        required
    }
}

pub type SuccessCallback = Box<dyn FnOnce(String) + Send>;
pub type DenialCallback = Box<dyn FnOnce(Vec<Capability>, Vec<Capability>) + Send>;

/// Completion hooks for one `collect()` call
///
/// Both are `FnOnce`; the orchestrator consumes them, so neither can fire
/// twice.
pub struct CollectCallbacks {
    on_success: SuccessCallback,
    on_denied: Option<DenialCallback>,
}

impl CollectCallbacks {
    pub fn new(on_success: impl FnOnce(String) + Send + 'static) -> Self {
        Self {
            on_success: Box::new(on_success),
            on_denied: None,
        }
    }

    /// Receive `(denied, permanently_denied)` when a request leaves gaps
    pub fn on_denied(
        mut self,
        on_denied: impl FnOnce(Vec<Capability>, Vec<Capability>) + Send + 'static,
    ) -> Self {
        self.on_denied = Some(Box::new(on_denied));
        self
    }
}

/// Which snapshot pass produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassKind {
    /// Everything requested was already granted
    Baseline,
    /// Collected after the permission request resolved
    Enriched,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::Enriched => f.write_str("enriched"),
        }
    }
}

/// What happened during one `collect()` call
#[derive(Debug)]
pub struct CollectionSummary {
    pub pass: PassKind,
    /// Classification before any request
    pub initial: PermissionClassification,
    /// Classification after the request, if one was made
    pub after_request: Option<PermissionClassification>,
    /// `None` when the pass fell back to an empty payload
    pub diagnostics: Option<CollectionDiagnostics>,
    pub payload_len: usize,
    /// Settings-redirect prompt, still running in the background
    pub remediation: Option<JoinHandle<RemediationChoice>>,
}

/// Coordinates the permission gate, the assembler and the callbacks
pub struct CollectionOrchestrator {
    gate: Arc<dyn PermissionGate>,
    assembler: Arc<SnapshotAssembler>,
    settings_prompt: Option<Arc<dyn SettingsPrompt>>,
    in_flight: Mutex<()>,
}

impl CollectionOrchestrator {
    pub fn new(gate: Arc<dyn PermissionGate>, assembler: SnapshotAssembler) -> Self {
        Self {
            gate,
            assembler: Arc::new(assembler),
            settings_prompt: None,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_settings_prompt(mut self, prompt: Arc<dyn SettingsPrompt>) -> Self {
        self.settings_prompt = Some(prompt);
        self
    }

    pub fn assembler(&self) -> &SnapshotAssembler {
        &self.assembler
    }

    /// Collect one snapshot and hand it to `callbacks`
    ///
    /// Runs to completion once started. A second call on the same
    /// orchestrator waits until this one has finished.
    pub async fn collect(
        &self,
        flags: EnrichmentFlags,
        callbacks: CollectCallbacks,
    ) -> CollectionSummary {
        let _flight = self.in_flight.lock().await;
        let CollectCallbacks {
            on_success,
            on_denied,
        } = callbacks;

        let required = flags.required_capabilities();
        let initial = self.gate.classify(&required);
        debug!(
            "Classified {} capability(ies): {} granted, {} denied, {} permanently denied",
            required.len(),
            initial.granted.len(),
            initial.denied.len(),
            initial.permanently_denied.len()
        );

        let missing = initial.missing();
        if missing.is_empty() {
            let (payload, diagnostics) = self.run_pass(PassKind::Baseline).await;
            let payload_len = payload.len();
            on_success(payload);
            return CollectionSummary {
                pass: PassKind::Baseline,
                initial,
                after_request: None,
                diagnostics,
                payload_len,
                remediation: None,
            };
        }

        info!("Requesting missing capabilities: {:?}", missing);
        let after = self.gate.request_missing(&missing).await;

        let denied: Vec<Capability> = after.denied.iter().copied().collect();
        let permanently_denied: Vec<Capability> =
            after.permanently_denied.iter().copied().collect();

        if !denied.is_empty() || !permanently_denied.is_empty() {
            warn!(
                "Capabilities still missing after request: denied={:?}, permanently_denied={:?}",
                denied, permanently_denied
            );
            if let Some(on_denied) = on_denied {
                on_denied(denied, permanently_denied.clone());
            }
        }

        let remediation = if flags.guided_remediation && !permanently_denied.is_empty() {
            self.spawn_remediation(permanently_denied)
        } else {
            None
        };

        let (payload, diagnostics) = self.run_pass(PassKind::Enriched).await;
        let payload_len = payload.len();
        on_success(payload);

        CollectionSummary {
            pass: PassKind::Enriched,
            initial,
            after_request: Some(after),
            diagnostics,
            payload_len,
            remediation,
        }
    }

    fn spawn_remediation(
        &self,
        permanently_denied: Vec<Capability>,
    ) -> Option<JoinHandle<RemediationChoice>> {
        let Some(prompt) = self.settings_prompt.clone() else {
            debug!("Guided remediation requested but no settings prompt registered");
            return None;
        };

        Some(tokio::spawn(async move {
            let choice = prompt.prompt_open_settings(&permanently_denied).await;
            if choice == RemediationChoice::OpenSettings {
                info!("Opening app settings");
                prompt.open_app_settings();
            }
            choice
        }))
    }

    /// Capabilities granted right now, whether or not they were requested
    fn granted_now(&self) -> CapabilitySet {
        Capability::ALL
            .into_iter()
            .filter(|c| self.gate.is_granted(*c))
            .collect()
    }

    fn payload_logging_enabled(&self) -> bool {
        self.assembler
            .platform()
            .process_identity()
            .map(|p| p.debuggable)
            .unwrap_or(false)
    }

    /// One snapshot pass on a worker task; faults become an empty payload
    async fn run_pass(&self, pass: PassKind) -> (String, Option<CollectionDiagnostics>) {
        let granted = self.granted_now();
        let assembler = Arc::clone(&self.assembler);
        let worker = tokio::spawn(async move { assembler.assemble_report(&granted).await });

        let assembly = match worker.await.map_err(AssemblyError::from) {
            Ok(Ok(assembly)) => assembly,
            Ok(Err(e)) | Err(e) => {
                warn!("{pass} snapshot failed, sending empty payload: {e}");
                return (String::new(), None);
            }
        };

        let payload = encoder::encode_string(&assembly.record);
        if self.payload_logging_enabled() {
            if let Ok(json) = encoder::to_json(&assembly.record) {
                debug!("{pass} payload: {json}");
            }
        }
        info!("{pass} payload ready ({} bytes)", payload.len());

        (payload, Some(assembly.diagnostics))
    }
}
