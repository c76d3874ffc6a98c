//! Network address and ISP enrichment chain
//!
//! The local address and DNS resolver come straight from the platform. ISP,
//! country and region are left to an optional [`NetworkEnricher`] supplied by
//! the host; this module never opens a connection itself.

use std::{net::Ipv4Addr, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Enrichment, FallbackChain, FallbackSource, SourceError};
use crate::{
    diagnostics::{ChainKind, ChainReport, ServiceLevel},
    platform::{DevicePlatform, ProbeError},
};

/// What the platform reported about the active network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedNetwork {
    pub local_ip: Option<String>,
    pub dns_ip: Option<String>,
}

/// Fields an external resolver can fill in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpEnrichment {
    pub country_code: Option<String>,
    pub isp: Option<String>,
    pub region: Option<String>,
    pub dns_country: Option<String>,
    pub dns_isp: Option<String>,
}

/// Host-supplied ISP/geo lookup
///
/// Called at most once per pass. Errors and `Ok(None)` both leave the
/// enrichment fields null.
#[async_trait]
pub trait NetworkEnricher: Send + Sync {
    async fn enrich(&self, observed: &ObservedNetwork) -> Result<Option<IpEnrichment>, ProbeError>;
}

/// Packed little-endian IPv4 to dotted form
pub fn ipv4_from_le(packed: u32) -> Option<String> {
    (packed != 0).then(|| Ipv4Addr::from(packed.to_le_bytes()).to_string())
}

struct LinkAddress(Arc<dyn DevicePlatform>);

#[async_trait]
impl FallbackSource<String> for LinkAddress {
    fn name(&self) -> &str {
        "link-properties"
    }

    async fn attempt(&self) -> Result<Option<String>, SourceError> {
        let link = self
            .0
            .active_link()?
            .ok_or_else(|| SourceError::Absent("active network".into()))?;
        Ok(link
            .addresses
            .into_iter()
            .find(|a| !a.trim().is_empty()))
    }

    fn service_level(&self) -> ServiceLevel {
        ServiceLevel::Full
    }
}

struct WifiAddress(Arc<dyn DevicePlatform>);

#[async_trait]
impl FallbackSource<String> for WifiAddress {
    fn name(&self) -> &str {
        "wifi-info"
    }

    async fn attempt(&self) -> Result<Option<String>, SourceError> {
        Ok(ipv4_from_le(self.0.wifi()?.ipv4))
    }

    fn service_level(&self) -> ServiceLevel {
        ServiceLevel::Fallback
    }
}

/// Network fields for one pass
#[derive(Debug, Clone)]
pub struct NetworkOutcome {
    pub observed: ObservedNetwork,
    pub enrichment: Enrichment<IpEnrichment>,
    pub reports: Vec<ChainReport>,
}

pub struct NetworkChain {
    platform: Arc<dyn DevicePlatform>,
    enricher: Option<Arc<dyn NetworkEnricher>>,
}

impl NetworkChain {
    pub fn new(platform: Arc<dyn DevicePlatform>, enricher: Option<Arc<dyn NetworkEnricher>>) -> Self {
        Self { platform, enricher }
    }

    fn dns_ip(&self) -> Option<String> {
        match self.platform.active_link() {
            Ok(link) => link.and_then(|l| l.dns_servers.into_iter().next()),
            Err(e) => {
                debug!("DNS servers unavailable: {e}");
                None
            }
        }
    }

    pub async fn resolve(&self) -> NetworkOutcome {
        let mut chain = FallbackChain::new()
            .add(LinkAddress(Arc::clone(&self.platform)))
            .add(WifiAddress(Arc::clone(&self.platform)));

        let (local_ip, address_report) = match chain.execute().await {
            Ok((ip, level)) => (
                Some(ip),
                ChainReport {
                    chain: ChainKind::LocalAddress,
                    service_level: level,
                    source: chain.selected_name().map(String::from),
                    note: None,
                    attempts: chain.attempts().to_vec(),
                },
            ),
            Err(exhausted) => (
                None,
                ChainReport {
                    chain: ChainKind::LocalAddress,
                    service_level: ServiceLevel::Unavailable,
                    source: None,
                    note: None,
                    attempts: exhausted.attempts,
                },
            ),
        };

        let observed = ObservedNetwork {
            local_ip,
            dns_ip: self.dns_ip(),
        };

        let (enrichment, enrichment_report) = self.enrich(&observed).await;

        NetworkOutcome {
            observed,
            enrichment,
            reports: vec![address_report, enrichment_report],
        }
    }

    async fn enrich(&self, observed: &ObservedNetwork) -> (Enrichment<IpEnrichment>, ChainReport) {
        let Some(enricher) = &self.enricher else {
            return (
                Enrichment::NotAvailable,
                ChainReport::gated(ChainKind::IspEnrichment, "no resolver registered"),
            );
        };

        let mut report = ChainReport {
            chain: ChainKind::IspEnrichment,
            service_level: ServiceLevel::Unavailable,
            source: None,
            note: None,
            attempts: Vec::new(),
        };

        match enricher.enrich(observed).await {
            Ok(Some(found)) => {
                report.service_level = ServiceLevel::Full;
                report.source = Some("resolver".into());
                (Enrichment::Found(found), report)
            }
            Ok(None) => {
                report.note = Some("resolver had no answer".into());
                (Enrichment::NotAvailable, report)
            }
            Err(e) => {
                debug!("ISP resolver failed: {e}");
                report.note = Some(e.to_string());
                (Enrichment::NotAvailable, report)
            }
        }
    }
}
