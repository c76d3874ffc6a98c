//! Location fallback chain
//!
//! 1. No location capability granted → `NO_PERMISSION`.
//! 2. External high-accuracy provider, when the host registered one.
//! 3. Built-in location manager: newest last-known fix across enabled providers.
//! 4. Nothing found → `UNAVAILABLE`.
//! 5. Otherwise `SUCCESS`, plus reverse geocoding bounded by a timeout.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{FallbackChain, FallbackSource, SourceError};
use crate::{
    diagnostics::{ChainKind, ChainReport, ServiceLevel},
    permissions::{Capability, CapabilitySet},
    platform::{Address, DevicePlatform, LocationFix, ProbeError},
    record::{LocationRecord, LocationStatus},
};

/// Default bound on reverse geocoding
pub const DEFAULT_GEOCODE_TIMEOUT: Duration = Duration::from_secs(2);

/// Optional location provider plugged in by the host (e.g. a fused provider)
#[async_trait]
pub trait LocationSource: Send + Sync {
    fn name(&self) -> &str;

    async fn last_location(&self) -> Result<Option<LocationFix>, ProbeError>;
}

struct ExternalSource(Arc<dyn LocationSource>);

#[async_trait]
impl FallbackSource<LocationFix> for ExternalSource {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn attempt(&self) -> Result<Option<LocationFix>, SourceError> {
        Ok(self.0.last_location().await?)
    }

    fn service_level(&self) -> ServiceLevel {
        ServiceLevel::Full
    }
}

/// Built-in location manager
struct ManagerSource(Arc<dyn DevicePlatform>);

impl ManagerSource {
    /// Most recent fix across all enabled providers
    fn newest_fix(&self) -> Result<Option<LocationFix>, SourceError> {
        let manager = self
            .0
            .location_manager()
            .ok_or_else(|| SourceError::Absent("location manager".into()))?;

        let providers = manager.enabled_providers().unwrap_or_else(|e| {
            debug!("Listing location providers failed: {e}");
            Vec::new()
        });

        let mut best: Option<LocationFix> = None;
        for provider in &providers {
            let fix = match manager.last_known_location(provider) {
                Ok(fix) => fix,
                Err(e) => {
                    debug!("Provider {provider} failed: {e}");
                    None
                }
            };
            if let Some(fix) = fix {
                if best.as_ref().map_or(true, |b| fix.time_ms > b.time_ms) {
                    best = Some(fix);
                }
            }
        }
        Ok(best)
    }
}

#[async_trait]
impl FallbackSource<LocationFix> for ManagerSource {
    fn name(&self) -> &str {
        "location-manager"
    }

    fn is_candidate(&self) -> bool {
        self.0.location_manager().is_some()
    }

    async fn attempt(&self) -> Result<Option<LocationFix>, SourceError> {
        self.newest_fix()
    }

    fn service_level(&self) -> ServiceLevel {
        ServiceLevel::Fallback
    }
}

/// Location record plus what the chain observed
#[derive(Debug, Clone)]
pub struct LocationOutcome {
    pub record: LocationRecord,
    pub reports: Vec<ChainReport>,
}

impl LocationOutcome {
    pub fn status(&self) -> LocationStatus {
        self.record.status
    }
}

/// Resolves the device location for one pass
pub struct LocationChain {
    platform: Arc<dyn DevicePlatform>,
    external: Option<Arc<dyn LocationSource>>,
    geocode_timeout: Duration,
}

impl LocationChain {
    pub fn new(
        platform: Arc<dyn DevicePlatform>,
        external: Option<Arc<dyn LocationSource>>,
        geocode_timeout: Duration,
    ) -> Self {
        Self {
            platform,
            external,
            geocode_timeout,
        }
    }

    pub async fn resolve(&self, granted: &CapabilitySet) -> LocationOutcome {
        if !granted.contains(&Capability::FineLocation)
            && !granted.contains(&Capability::CoarseLocation)
        {
            return LocationOutcome {
                record: LocationRecord::without_fix(LocationStatus::NoPermission),
                reports: vec![ChainReport::gated(
                    ChainKind::Location,
                    "no location capability granted",
                )],
            };
        }

        let mut chain = FallbackChain::new()
            .add_optional(
                self.external
                    .clone()
                    .map(|s| Box::new(ExternalSource(s)) as Box<dyn FallbackSource<LocationFix>>),
            )
            .add(ManagerSource(Arc::clone(&self.platform)));

        let (fix, level) = match chain.execute().await {
            Ok(found) => found,
            Err(exhausted) => {
                info!("No location fix from {} source(s)", exhausted.count);
                return LocationOutcome {
                    record: LocationRecord::without_fix(LocationStatus::Unavailable),
                    reports: vec![ChainReport {
                        chain: ChainKind::Location,
                        service_level: ServiceLevel::Unavailable,
                        source: None,
                        note: None,
                        attempts: exhausted.attempts,
                    }],
                };
            }
        };

        let location_report = ChainReport {
            chain: ChainKind::Location,
            service_level: level,
            source: chain.selected_name().map(String::from),
            note: None,
            attempts: chain.attempts().to_vec(),
        };

        let (address, geocode_report) = self.reverse_geocode(&fix).await;
        let address = address.unwrap_or_default();

        LocationOutcome {
            record: LocationRecord {
                accuracy: Some(fix.accuracy_m as i32),
                is_simulated: Some(fix.is_mock),
                latitude: Some(fix.latitude),
                longitude: Some(fix.longitude),
                status: LocationStatus::Success,
                zip: address.postal_code,
                city: address.locality.or(address.sub_admin_area),
                region: address.admin_area,
                country_code: address.country_code,
            },
            reports: vec![location_report, geocode_report],
        }
    }

    async fn reverse_geocode(&self, fix: &LocationFix) -> (Option<Address>, ChainReport) {
        let mut report = ChainReport {
            chain: ChainKind::Geocoding,
            service_level: ServiceLevel::Unavailable,
            source: None,
            note: None,
            attempts: Vec::new(),
        };

        let Some(geocoder) = self.platform.geocoder() else {
            report.note = Some("no geocoder on this host".into());
            return (None, report);
        };

        let lookup = geocoder.reverse_geocode(fix.latitude, fix.longitude);
        match tokio::time::timeout(self.geocode_timeout, lookup).await {
            Ok(Ok(Some(address))) => {
                report.service_level = ServiceLevel::Full;
                report.source = Some("geocoder".into());
                (Some(address), report)
            }
            Ok(Ok(None)) => {
                report.note = Some("no address for fix".into());
                (None, report)
            }
            Ok(Err(e)) => {
                debug!("Reverse geocoding failed: {e}");
                report.note = Some(e.to_string());
                (None, report)
            }
            Err(_) => {
                debug!(
                    "Reverse geocoding exceeded {}ms",
                    self.geocode_timeout.as_millis()
                );
                report.note = Some(format!(
                    "timed out after {}ms",
                    self.geocode_timeout.as_millis()
                ));
                (None, report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fix, FakeGeocoder, FakeLocationManager, FakePlatform};

    fn granted(caps: &[Capability]) -> CapabilitySet {
        caps.iter().copied().collect()
    }

    struct StaticExternal(Option<LocationFix>);

    #[async_trait]
    impl LocationSource for StaticExternal {
        fn name(&self) -> &str {
            "fused"
        }

        async fn last_location(&self) -> Result<Option<LocationFix>, ProbeError> {
            Ok(self.0.clone())
        }
    }

    struct FailingExternal;

    #[async_trait]
    impl LocationSource for FailingExternal {
        fn name(&self) -> &str {
            "fused"
        }

        async fn last_location(&self) -> Result<Option<LocationFix>, ProbeError> {
            Err(ProbeError::NotFound("play services".into()))
        }
    }

    fn chain(platform: FakePlatform, external: Option<Arc<dyn LocationSource>>) -> LocationChain {
        LocationChain::new(Arc::new(platform), external, DEFAULT_GEOCODE_TIMEOUT)
    }

    #[tokio::test]
    async fn test_no_permission_short_circuits() {
        let platform = FakePlatform::default().with_location_manager(FakeLocationManager::with(
            vec![("gps", Some(fix("gps", 1.0, 2.0, 100)))],
        ));
        let outcome = chain(platform, None)
            .resolve(&granted(&[Capability::PhoneState]))
            .await;

        assert_eq!(outcome.status(), LocationStatus::NoPermission);
        assert!(outcome.record.latitude.is_none());
        assert!(outcome.record.longitude.is_none());
        assert!(outcome.record.accuracy.is_none());
        assert_eq!(outcome.reports[0].service_level, ServiceLevel::Gated);
    }

    #[tokio::test]
    async fn test_coarse_alone_is_enough() {
        let platform = FakePlatform::default().with_location_manager(FakeLocationManager::with(
            vec![("network", Some(fix("network", 1.0, 2.0, 100)))],
        ));
        let outcome = chain(platform, None)
            .resolve(&granted(&[Capability::CoarseLocation]))
            .await;

        assert_eq!(outcome.status(), LocationStatus::Success);
    }

    #[tokio::test]
    async fn test_no_fix_is_unavailable() {
        let platform = FakePlatform::default().with_location_manager(FakeLocationManager::with(
            vec![("gps", None), ("network", None)],
        ));
        let outcome = chain(platform, None)
            .resolve(&granted(&[Capability::FineLocation]))
            .await;

        assert_eq!(outcome.status(), LocationStatus::Unavailable);
        assert!(outcome.record.latitude.is_none());
        assert_eq!(outcome.reports[0].service_level, ServiceLevel::Unavailable);
    }

    #[tokio::test]
    async fn test_no_location_manager_is_unavailable() {
        let outcome = chain(FakePlatform::default(), None)
            .resolve(&granted(&[Capability::FineLocation]))
            .await;
        assert_eq!(outcome.status(), LocationStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_newest_fix_wins() {
        let mut manager = FakeLocationManager::with(vec![
            ("gps", Some(fix("gps", 10.0, 10.0, 100))),
            ("network", Some(fix("network", 20.0, 20.0, 300))),
            ("passive", Some(fix("passive", 30.0, 30.0, 200))),
        ]);
        manager.failing.push("broken".into());
        manager.providers.push("broken".into());
        let platform = FakePlatform::default().with_location_manager(manager);

        let outcome = chain(platform, None)
            .resolve(&granted(&[Capability::FineLocation]))
            .await;

        assert_eq!(outcome.status(), LocationStatus::Success);
        assert_eq!(outcome.record.latitude, Some(20.0));
        assert_eq!(outcome.reports[0].service_level, ServiceLevel::Fallback);
    }

    #[tokio::test]
    async fn test_external_source_preferred() {
        let platform = FakePlatform::default().with_location_manager(FakeLocationManager::with(
            vec![("gps", Some(fix("gps", 10.0, 10.0, 999)))],
        ));
        let external: Arc<dyn LocationSource> =
            Arc::new(StaticExternal(Some(fix("fused", 5.0, 6.0, 1))));

        let outcome = chain(platform, Some(external))
            .resolve(&granted(&[Capability::FineLocation]))
            .await;

        assert_eq!(outcome.record.latitude, Some(5.0));
        assert_eq!(outcome.reports[0].service_level, ServiceLevel::Full);
        assert_eq!(outcome.reports[0].source.as_deref(), Some("fused"));
    }

    #[tokio::test]
    async fn test_failing_external_falls_through() {
        let platform = FakePlatform::default().with_location_manager(FakeLocationManager::with(
            vec![("gps", Some(fix("gps", 10.0, 11.0, 5)))],
        ));
        let outcome = chain(platform, Some(Arc::new(FailingExternal)))
            .resolve(&granted(&[Capability::FineLocation]))
            .await;

        assert_eq!(outcome.record.longitude, Some(11.0));
        assert_eq!(outcome.reports[0].attempts.len(), 2);
        assert!(!outcome.reports[0].attempts[0].success);
    }

    #[tokio::test]
    async fn test_mock_flag_and_address() {
        let mut mocked = fix("gps", 48.85, 2.35, 10);
        mocked.is_mock = true;
        mocked.accuracy_m = 12.7;
        let platform = FakePlatform::default()
            .with_location_manager(FakeLocationManager::with(vec![("gps", Some(mocked))]))
            .with_geocoder(FakeGeocoder::answering(Address {
                postal_code: Some("75001".into()),
                locality: None,
                sub_admin_area: Some("Paris".into()),
                admin_area: Some("Île-de-France".into()),
                country_code: Some("FR".into()),
            }));

        let outcome = chain(platform, None)
            .resolve(&granted(&[Capability::FineLocation]))
            .await;

        let record = outcome.record;
        assert_eq!(record.status, LocationStatus::Success);
        assert_eq!(record.is_simulated, Some(true));
        assert_eq!(record.accuracy, Some(12));
        assert_eq!(record.zip.as_deref(), Some("75001"));
        assert_eq!(record.city.as_deref(), Some("Paris"));
        assert_eq!(record.region.as_deref(), Some("Île-de-France"));
        assert_eq!(record.country_code.as_deref(), Some("FR"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_geocoder_keeps_coordinates() {
        let platform = FakePlatform::default()
            .with_location_manager(FakeLocationManager::with(vec![(
                "gps",
                Some(fix("gps", 1.5, 2.5, 10)),
            )]))
            .with_geocoder(FakeGeocoder::stalling(Duration::from_secs(60)));

        let outcome = chain(platform, None)
            .resolve(&granted(&[Capability::FineLocation]))
            .await;

        assert_eq!(outcome.status(), LocationStatus::Success);
        assert_eq!(outcome.record.latitude, Some(1.5));
        assert_eq!(outcome.record.longitude, Some(2.5));
        assert!(outcome.record.accuracy.is_some());
        assert!(outcome.record.zip.is_none());
        assert!(outcome.record.city.is_none());
        assert!(outcome.record.region.is_none());
        assert!(outcome.record.country_code.is_none());
        assert!(outcome.reports[1]
            .note
            .as_deref()
            .unwrap()
            .contains("timed out"));
    }

    #[tokio::test]
    async fn test_geocoder_error_keeps_coordinates() {
        let platform = FakePlatform::default()
            .with_location_manager(FakeLocationManager::with(vec![(
                "gps",
                Some(fix("gps", 1.0, 1.0, 10)),
            )]))
            .with_geocoder(FakeGeocoder::failing());

        let outcome = chain(platform, None)
            .resolve(&granted(&[Capability::FineLocation]))
            .await;

        assert_eq!(outcome.status(), LocationStatus::Success);
        assert!(outcome.record.city.is_none());
    }
}
