//! Snapshot assembler
//!
//! Runs every probe group and fallback chain for one pass and folds the
//! results into a single [`AttributeRecord`]. The synchronous probes run on
//! the blocking pool while the async chains run on the calling task; the
//! record is only built once all of them have finished.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info};

use crate::{
    chains::{
        cellular::CellularChain,
        location::{LocationChain, LocationOutcome, LocationSource, DEFAULT_GEOCODE_TIMEOUT},
        network::{NetworkChain, NetworkEnricher, NetworkOutcome},
        Enrichment,
    },
    diagnostics::{CollectionDiagnostics, ProbeFault},
    permissions::CapabilitySet,
    platform::DevicePlatform,
    probes::{
        connectivity::{self, ConnectivityFacts},
        hardware::{self, HardwareFacts},
        identity::{self, IdentityFacts},
        security::{self, SecurityFacts},
        system::{self, SystemFacts},
        ProbeContext,
    },
    record::AttributeRecord,
};

/// Packages of common app-cloning tools
pub const DEFAULT_CLONE_MANAGERS: &[&str] = &[
    "com.parallel.space",
    "com.parallel.space.lite",
    "com.lbe.parallel.intl",
    "com.dualspace.multid.accounts",
    "com.oem.cloneapp",
    "com.oplus.clonephone",
    "com.huawei.android.clone",
    "com.miui.securitycore",
];

/// Knobs the probes and chains read during a pass
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    /// Bound on reverse geocoding
    pub geocode_timeout: Duration,
    /// Reported in `interfering_apps` when installed
    pub interfering_packages: Vec<String>,
    pub click_automator_packages: Vec<String>,
    pub clone_manager_packages: Vec<String>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            geocode_timeout: DEFAULT_GEOCODE_TIMEOUT,
            interfering_packages: Vec::new(),
            click_automator_packages: Vec::new(),
            clone_manager_packages: DEFAULT_CLONE_MANAGERS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// A pass that could not produce a record at all
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Probe worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Probe worker was cancelled")]
    WorkerCancelled,
}

impl From<JoinError> for AssemblyError {
    fn from(err: JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Self::WorkerPanicked(message)
        } else {
            Self::WorkerCancelled
        }
    }
}

/// Record plus what was observed while building it
#[derive(Debug, Clone)]
pub struct Assembly {
    pub record: AttributeRecord,
    pub diagnostics: CollectionDiagnostics,
}

struct ProbeFacts {
    hardware: HardwareFacts,
    system: SystemFacts,
    connectivity: ConnectivityFacts,
    security: SecurityFacts,
    identity: IdentityFacts,
}

fn run_probes(
    platform: &dyn DevicePlatform,
    granted: &CapabilitySet,
    settings: &CollectorSettings,
) -> (ProbeFacts, Vec<ProbeFault>) {
    let mut ctx = ProbeContext::new(platform, granted, settings);
    let facts = ProbeFacts {
        hardware: hardware::collect(&mut ctx),
        system: system::collect(&mut ctx),
        connectivity: connectivity::collect(&mut ctx),
        security: security::collect(&mut ctx),
        identity: identity::collect(&mut ctx),
    };
    (facts, ctx.faults.into_faults())
}

/// Builds one [`AttributeRecord`] per call
pub struct SnapshotAssembler {
    platform: Arc<dyn DevicePlatform>,
    settings: Arc<CollectorSettings>,
    location_source: Option<Arc<dyn LocationSource>>,
    network_enricher: Option<Arc<dyn NetworkEnricher>>,
}

impl SnapshotAssembler {
    pub fn new(platform: Arc<dyn DevicePlatform>, settings: CollectorSettings) -> Self {
        Self {
            platform,
            settings: Arc::new(settings),
            location_source: None,
            network_enricher: None,
        }
    }

    /// Register a higher-accuracy location provider tried before the built-in one
    pub fn with_location_source(mut self, source: Arc<dyn LocationSource>) -> Self {
        self.location_source = Some(source);
        self
    }

    /// Register the ISP/geo resolver for the network chain
    pub fn with_network_enricher(mut self, enricher: Arc<dyn NetworkEnricher>) -> Self {
        self.network_enricher = Some(enricher);
        self
    }

    pub fn platform(&self) -> &Arc<dyn DevicePlatform> {
        &self.platform
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    pub async fn assemble(&self, granted: &CapabilitySet) -> Result<AttributeRecord, AssemblyError> {
        Ok(self.assemble_report(granted).await?.record)
    }

    pub async fn assemble_report(&self, granted: &CapabilitySet) -> Result<Assembly, AssemblyError> {
        debug!("Assembling snapshot with {} granted capabilities", granted.len());

        let probes = {
            let platform = Arc::clone(&self.platform);
            let settings = Arc::clone(&self.settings);
            let granted = granted.clone();
            tokio::task::spawn_blocking(move || run_probes(platform.as_ref(), &granted, &settings))
        };

        let location = LocationChain::new(
            Arc::clone(&self.platform),
            self.location_source.clone(),
            self.settings.geocode_timeout,
        );
        let network = NetworkChain::new(Arc::clone(&self.platform), self.network_enricher.clone());
        let cellular = CellularChain::new(Arc::clone(&self.platform));

        let (location, network, (cellular_id, cellular_report)) = tokio::join!(
            location.resolve(granted),
            network.resolve(),
            cellular.resolve(granted),
        );

        let (facts, probe_faults) = probes.await?;

        let mut chains = location.reports.clone();
        chains.extend(network.reports.iter().cloned());
        chains.push(cellular_report);
        let diagnostics = CollectionDiagnostics {
            chains,
            probe_faults,
        };

        info!("Snapshot assembled: {}", diagnostics.summary());

        Ok(Assembly {
            record: build_record(facts, location, network, cellular_id),
            diagnostics,
        })
    }
}

fn build_record(
    facts: ProbeFacts,
    location: LocationOutcome,
    network: NetworkOutcome,
    cellular_id: Enrichment<String>,
) -> AttributeRecord {
    let ProbeFacts {
        hardware: hw,
        system: sys,
        connectivity: net,
        security: sec,
        identity: id,
    } = facts;

    let mock_location = location.record.is_simulated == Some(true);
    let suspicious_flags = sec.suspicious_flags(mock_location);
    let isp = network.enrichment.into_option().unwrap_or_default();

    AttributeRecord {
        android_id: id.android_id,
        app_instance_id: id.app_instance_id,
        android_version: sys.android_version,
        app_guid: id.app_guid,
        audio_mute_status: hw.audio_mute_status,
        audio_volume_current: hw.audio_volume_current,
        battery_charging: hw.battery_charging,
        battery_health: hw.battery_health,
        battery_level: hw.battery_level,
        battery_temperature: hw.battery_temperature,
        battery_voltage: hw.battery_voltage,
        biometric_status: hw.biometric_status,
        bootloader_state: sec.bootloader_state,
        build_device: sys.build_device,
        build_id: sys.build_id,
        build_manufacturer: sys.build_manufacturer,
        build_model: sys.build_model,
        build_number: sys.build_number,
        build_time: sys.build_time,
        carrier_country: net.carrier_country,
        carrier_name: net.carrier_name,
        cpu_count: hw.cpu_count,
        cpu_hash: sys.cpu_hash,
        cpu_speed: hw.cpu_speed,
        cpu_type: sys.cpu_type,
        developer_options_state: sec.developer_options_state,
        device_cellular_id: cellular_id.into_option(),
        device_hash: id.device_hash,
        device_ip_address: network.observed.local_ip,
        device_ip_country: isp.country_code,
        device_ip_isp: isp.isp,
        device_ip_region: isp.region,
        device_name: sys.device_name,
        device_orientation: hw.device_orientation,
        dns_ip_country: isp.dns_country,
        dns_ip_isp: isp.dns_isp,
        dns_ip: network.observed.dns_ip,
        free_storage: hw.free_storage,
        gsf_id: id.gsf_id,
        has_proximity_sensor: hw.has_proximity_sensor,
        interfering_apps: sec.interfering_apps,
        is_click_automator_installed: sec.is_click_automator_installed,
        is_emulator: sec.is_emulator,
        is_keyguard_secure: sec.is_keyguard_secure,
        is_nfc_available: hw.is_nfc_available,
        is_nfc_enabled: hw.is_nfc_enabled,
        is_on_call: net.is_on_call,
        is_remote_control_connected: sec.is_remote_control_connected,
        is_rooted: sec.is_rooted,
        is_screen_being_mirrored: sec.is_screen_being_mirrored,
        kernel_arch: sys.kernel_arch,
        kernel_name: sys.kernel_name,
        kernel_version: sys.kernel_version,
        last_boot_time: sys.last_boot_time,
        network_config: net.network_config,
        pasteboard_hash: sec.pasteboard_hash,
        physical_memory: hw.physical_memory,
        region_country: sys.region_country,
        region_language: sys.region_language,
        region_timezone: sys.region_timezone,
        remote_control_provider: sec.remote_control_provider,
        screen_brightness: hw.screen_brightness,
        screen_height: hw.screen_height,
        screen_scale: hw.screen_scale,
        screen_width: hw.screen_width,
        sensor_hash: hw.sensor_hash,
        session_id: id.session_id,
        source: sys.source,
        system_uptime: sys.system_uptime,
        timezone_identifier: sys.timezone_identifier,
        total_storage: hw.total_storage,
        kind: sys.kind,
        usb_cable_state: sec.usb_cable_state,
        usb_debugging_state: sec.usb_debugging_state,
        wifi_mac_address: net.wifi_mac_address,
        wifi_ssid: net.wifi_ssid,
        first_api_level: sys.first_api_level,
        power_source: hw.power_source,
        proxy_address: net.proxy_address,
        proxy_state: net.proxy_state,
        vpn_state: net.vpn_state,
        suspicious_flags,
        true_device_id: id.true_device_id,
        system_integrity: sec.system_integrity,
        is_app_cloned: sec.is_app_cloned,
        device_location: Some(location.record),
    }
}
