//! Cellular identity chain
//!
//! Hardware identifiers are only read with the phone-state capability, and on
//! newer platform levels only when the app holds elevated telephony trust
//! (carrier privileges, default dialer or default SMS role). The identifiers
//! never leave this module in raw form: the chain yields a SHA-256 of all
//! identifiers joined by `|`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Enrichment, FallbackChain, FallbackSource, SourceError};
use crate::{
    diagnostics::{ChainKind, ChainReport, ServiceLevel},
    permissions::{Capability, CapabilitySet},
    platform::{api, DevicePlatform, ProbeError, Telephony},
    probes::{non_blank, sha256_hex},
};

fn telephony(platform: &dyn DevicePlatform) -> Result<&dyn Telephony, SourceError> {
    platform
        .telephony()
        .ok_or_else(|| SourceError::Absent("telephony".into()))
}

/// IMEI and MEID of every radio slot
struct SlotIdentifiers {
    platform: Arc<dyn DevicePlatform>,
    sdk_int: u32,
}

#[async_trait]
impl FallbackSource<Vec<String>> for SlotIdentifiers {
    fn name(&self) -> &str {
        "slot-identifiers"
    }

    fn is_candidate(&self) -> bool {
        self.sdk_int >= api::O
    }

    async fn attempt(&self) -> Result<Option<Vec<String>>, SourceError> {
        let tm = telephony(self.platform.as_ref())?;
        let slots = tm.modem_count().unwrap_or(1);

        let mut ids = Vec::new();
        for slot in 0..slots {
            // A refused read ends the source; other faults only lose that slot.
            let imei = match tm.imei(slot) {
                Err(e @ ProbeError::PermissionDenied(_)) => return Err(e.into()),
                other => other.ok().flatten(),
            };
            let meid = match tm.meid(slot) {
                Err(e @ ProbeError::PermissionDenied(_)) => return Err(e.into()),
                other => other.ok().flatten(),
            };
            ids.extend(non_blank(imei));
            ids.extend(non_blank(meid));
        }

        Ok((!ids.is_empty()).then_some(ids))
    }

    fn service_level(&self) -> ServiceLevel {
        ServiceLevel::Full
    }
}

/// Single pre-slot device identifier
struct LegacyIdentifier {
    platform: Arc<dyn DevicePlatform>,
}

#[async_trait]
impl FallbackSource<Vec<String>> for LegacyIdentifier {
    fn name(&self) -> &str {
        "legacy-device-id"
    }

    async fn attempt(&self) -> Result<Option<Vec<String>>, SourceError> {
        let tm = telephony(self.platform.as_ref())?;
        Ok(non_blank(tm.legacy_device_id()?).map(|id| vec![id]))
    }

    fn service_level(&self) -> ServiceLevel {
        ServiceLevel::Fallback
    }
}

/// Resolves `device_cellular_id`
pub struct CellularChain {
    platform: Arc<dyn DevicePlatform>,
}

impl CellularChain {
    pub fn new(platform: Arc<dyn DevicePlatform>) -> Self {
        Self { platform }
    }

    /// Whether this app may read hardware identifiers at `sdk_int`
    fn has_elevated_trust(&self, tm: &dyn Telephony, sdk_int: u32) -> bool {
        if sdk_int < api::Q {
            return true;
        }

        let package = match self.platform.process_identity() {
            Ok(identity) => identity.package_name,
            Err(e) => {
                debug!("Process identity unavailable: {e}");
                String::new()
            }
        };
        let holds_role = |role: Result<Option<String>, ProbeError>| {
            !package.is_empty()
                && role
                    .ok()
                    .flatten()
                    .is_some_and(|p| p.eq_ignore_ascii_case(&package))
        };

        tm.has_carrier_privileges().unwrap_or(false)
            || holds_role(tm.default_dialer_package())
            || holds_role(tm.default_sms_package())
    }

    pub async fn resolve(&self, granted: &CapabilitySet) -> (Enrichment<String>, ChainReport) {
        if !granted.contains(&Capability::PhoneState) {
            return (
                Enrichment::NotAvailable,
                ChainReport::gated(ChainKind::CellularId, "phone-state not granted"),
            );
        }

        let Some(tm) = self.platform.telephony() else {
            return (
                Enrichment::NotAvailable,
                ChainReport::gated(ChainKind::CellularId, "no telephony service"),
            );
        };

        let sdk_int = self.platform.build_info().map(|b| b.sdk_int).unwrap_or(0);
        if !self.has_elevated_trust(tm, sdk_int) {
            return (
                Enrichment::NotAvailable,
                ChainReport::gated(
                    ChainKind::CellularId,
                    "no carrier privileges, dialer or SMS role",
                ),
            );
        }

        let mut chain = FallbackChain::new()
            .add(SlotIdentifiers {
                platform: Arc::clone(&self.platform),
                sdk_int,
            })
            .add(LegacyIdentifier {
                platform: Arc::clone(&self.platform),
            });

        match chain.execute().await {
            Ok((ids, level)) => {
                let report = ChainReport {
                    chain: ChainKind::CellularId,
                    service_level: level,
                    source: chain.selected_name().map(String::from),
                    note: None,
                    attempts: chain.attempts().to_vec(),
                };
                (Enrichment::Found(sha256_hex(&ids.join("|"))), report)
            }
            Err(exhausted) => (
                Enrichment::NotAvailable,
                ChainReport {
                    chain: ChainKind::CellularId,
                    service_level: ServiceLevel::Unavailable,
                    source: None,
                    note: None,
                    attempts: exhausted.attempts,
                },
            ),
        }
    }
}
