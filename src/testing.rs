//! In-memory fakes for unit tests
//!
//! [`FakePlatform`] describes a healthy, unrooted phone by default; builders
//! override single facets, `fail` turns one facet into a probe error and
//! `panic_on` makes it panic inside the worker.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    permissions::{
        Capability, CapabilitySet, GrantState, PermissionClassification, PermissionGate,
        RemediationChoice, SettingsPrompt,
    },
    platform::{
        Address, AudioState, BatteryStatus, BuildInfo, CallState, ChargeStatus, DevicePlatform,
        DisplayMetrics, Geocoder, KernelInfo, KeyValueStore, LinkProperties, LocaleInfo,
        LocationFix, LocationManager, NetworkState, NfcState, PlugType, ProbeError,
        ProcessIdentity, RawBatteryHealth, RawBiometric, Rotation, SensorInfo, StorageStats,
        Telephony, TimezoneInfo, Transport, UsbState, WifiInfo, SENSOR_TYPE_PROXIMITY,
    },
    record::{
        AttributeRecord, BatteryHealth, BiometricStatus, BootloaderState, ConnectionState,
        DeveloperOptionsState, LocationRecord, LocationStatus, NetworkConfig, Orientation,
        PowerSource, SystemIntegrity, UsbStatus,
    },
};

pub struct FakePlatform {
    build: BuildInfo,
    process: ProcessIdentity,
    device_id: Option<String>,
    battery: BatteryStatus,
    network: NetworkState,
    link: Option<LinkProperties>,
    wifi: WifiInfo,
    uptime: Duration,
    timezone: TimezoneInfo,
    properties: HashMap<String, String>,
    paths: HashSet<String>,
    packages: HashSet<String>,
    virtualization: Option<String>,
    usb: Option<UsbState>,
    clipboard: Option<String>,
    remote_control: Option<String>,
    telephony: Option<FakeTelephony>,
    location_manager: Option<FakeLocationManager>,
    geocoder: Option<Arc<FakeGeocoder>>,
    store: Option<MemoryStore>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            build: Self::default_build(),
            process: Self::default_process(),
            device_id: Some("9774d56d682e549c".into()),
            battery: BatteryStatus {
                level: 80,
                scale: 100,
                status: ChargeStatus::Discharging,
                health: RawBatteryHealth::Good,
                temperature_tenths: 290,
                voltage_mv: 3900,
                plugged: PlugType::Unplugged,
            },
            network: NetworkState {
                transport: Transport::Wifi,
                vpn: false,
            },
            link: None,
            wifi: WifiInfo::default(),
            uptime: Duration::from_secs(7200),
            timezone: TimezoneInfo {
                id: "UTC".into(),
                raw_offset_ms: 0,
            },
            properties: HashMap::new(),
            paths: HashSet::new(),
            packages: HashSet::new(),
            virtualization: None,
            usb: None,
            clipboard: None,
            remote_control: None,
            telephony: None,
            location_manager: None,
            geocoder: None,
            store: None,
            failing: HashSet::new(),
            panicking: HashSet::new(),
        }
    }
}

impl FakePlatform {
    pub fn default_build() -> BuildInfo {
        BuildInfo {
            sdk_int: 34,
            release: Some("14".into()),
            device: "shiba".into(),
            id: "UD1A.230803.041".into(),
            manufacturer: "Google".into(),
            model: "Pixel 8".into(),
            brand: "google".into(),
            display: "UD1A.230803.041".into(),
            fingerprint: "google/shiba/shiba:14/UD1A.230803.041/10808477:user/release-keys"
                .into(),
            tags: Some("release-keys".into()),
            time_ms: 1_691_020_800_000,
            supported_abis: vec!["arm64-v8a".into(), "armeabi-v7a".into()],
        }
    }

    pub fn default_process() -> ProcessIdentity {
        ProcessIdentity {
            package_name: "com.example.app".into(),
            user_id: 0,
            data_dir: "/data/user/0/com.example.app".into(),
            code_path: "/data/app/com.example.app/base.apk".into(),
            process_name: Some("com.example.app".into()),
            debuggable: true,
        }
    }

    /// Make reads of `facet` return an error
    pub fn fail(&mut self, facet: &str) {
        self.failing.insert(facet.to_string());
    }

    /// Make reads of `facet` panic
    pub fn panic_on(&mut self, facet: &str) {
        self.panicking.insert(facet.to_string());
    }

    pub fn with_build(mut self, build: BuildInfo) -> Self {
        self.build = build;
        self
    }

    pub fn with_process(mut self, process: ProcessIdentity) -> Self {
        self.process = process;
        self
    }

    pub fn with_device_id(mut self, id: &str) -> Self {
        self.device_id = Some(id.into());
        self
    }

    pub fn with_battery(mut self, battery: BatteryStatus) -> Self {
        self.battery = battery;
        self
    }

    pub fn with_network(mut self, network: NetworkState) -> Self {
        self.network = network;
        self
    }

    pub fn with_link(mut self, link: Option<LinkProperties>) -> Self {
        self.link = link;
        self
    }

    pub fn with_wifi(mut self, wifi: WifiInfo) -> Self {
        self.wifi = wifi;
        self
    }

    pub fn with_uptime(mut self, uptime: Duration) -> Self {
        self.uptime = uptime;
        self
    }

    pub fn with_timezone(mut self, timezone: TimezoneInfo) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.paths.insert(path.into());
        self
    }

    pub fn with_package(mut self, package: &str) -> Self {
        self.packages.insert(package.into());
        self
    }

    pub fn with_virtualization(mut self, hint: &str) -> Self {
        self.virtualization = Some(hint.into());
        self
    }

    pub fn with_usb(mut self, usb: UsbState) -> Self {
        self.usb = Some(usb);
        self
    }

    pub fn with_clipboard(mut self, text: &str) -> Self {
        self.clipboard = Some(text.into());
        self
    }

    pub fn with_remote_control(mut self, provider: &str) -> Self {
        self.remote_control = Some(provider.into());
        self
    }

    pub fn with_telephony(mut self, telephony: FakeTelephony) -> Self {
        self.telephony = Some(telephony);
        self
    }

    pub fn with_location_manager(mut self, manager: FakeLocationManager) -> Self {
        self.location_manager = Some(manager);
        self
    }

    pub fn with_geocoder(mut self, geocoder: FakeGeocoder) -> Self {
        self.geocoder = Some(Arc::new(geocoder));
        self
    }

    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = Some(store);
        self
    }

    fn check(&self, facet: &str) -> Result<(), ProbeError> {
        if self.panicking.contains(facet) {
            panic!("{facet} probe panicked");
        }
        if self.failing.contains(facet) {
            return Err(ProbeError::Other(format!("{facet} unavailable")));
        }
        Ok(())
    }
}

impl DevicePlatform for FakePlatform {
    fn kind(&self) -> &'static str {
        "android"
    }

    fn build_info(&self) -> Result<BuildInfo, ProbeError> {
        self.check("build")?;
        Ok(self.build.clone())
    }

    fn kernel_info(&self) -> Result<KernelInfo, ProbeError> {
        self.check("kernel")?;
        Ok(KernelInfo {
            arch: "aarch64".into(),
            name: "Linux".into(),
            version: "5.15.110-android14-11".into(),
        })
    }

    fn platform_device_id(&self) -> Result<Option<String>, ProbeError> {
        self.check("device_id")?;
        Ok(self.device_id.clone())
    }

    fn audio(&self) -> Result<AudioState, ProbeError> {
        self.check("audio")?;
        Ok(AudioState {
            muted: false,
            volume: 7,
        })
    }

    fn battery(&self) -> Result<BatteryStatus, ProbeError> {
        self.check("battery")?;
        Ok(self.battery)
    }

    fn biometric(&self) -> Result<RawBiometric, ProbeError> {
        self.check("biometric")?;
        Ok(RawBiometric::Success)
    }

    fn developer_options_enabled(&self) -> Result<bool, ProbeError> {
        self.check("developer_options")?;
        Ok(false)
    }

    fn cpu_count(&self) -> Result<u32, ProbeError> {
        self.check("cpu_count")?;
        Ok(8)
    }

    fn cpu_max_freq_khz(&self) -> Result<Option<f64>, ProbeError> {
        self.check("cpu_freq")?;
        Ok(Some(2_400_000.0))
    }

    fn physical_memory_bytes(&self) -> Result<u64, ProbeError> {
        self.check("memory")?;
        Ok(8 * 1024 * 1024 * 1024)
    }

    fn storage(&self) -> Result<StorageStats, ProbeError> {
        self.check("storage")?;
        Ok(StorageStats {
            total_bytes: 128_000_000_000,
            free_bytes: 64_000_000_000,
        })
    }

    fn display(&self) -> Result<DisplayMetrics, ProbeError> {
        self.check("display")?;
        Ok(DisplayMetrics {
            width_px: 1080,
            height_px: 2400,
            density: 2.625,
            rotation: Some(Rotation::Deg0),
        })
    }

    fn screen_brightness_raw(&self) -> Result<i32, ProbeError> {
        self.check("brightness")?;
        Ok(128)
    }

    fn sensors(&self) -> Result<Vec<SensorInfo>, ProbeError> {
        self.check("sensors")?;
        Ok(vec![
            SensorInfo {
                kind: 1,
                name: "LSM6DSO Accelerometer".into(),
                vendor: "STMicro".into(),
            },
            SensorInfo {
                kind: SENSOR_TYPE_PROXIMITY,
                name: "TMD3702V Proximity".into(),
                vendor: "AMS".into(),
            },
        ])
    }

    fn network(&self) -> Result<NetworkState, ProbeError> {
        self.check("network")?;
        Ok(self.network)
    }

    fn active_link(&self) -> Result<Option<LinkProperties>, ProbeError> {
        self.check("link")?;
        Ok(self.link.clone())
    }

    fn wifi(&self) -> Result<WifiInfo, ProbeError> {
        self.check("wifi")?;
        Ok(self.wifi.clone())
    }

    fn nfc(&self) -> Result<Option<NfcState>, ProbeError> {
        self.check("nfc")?;
        Ok(Some(NfcState { enabled: true }))
    }

    fn keyguard_secure(&self) -> Result<bool, ProbeError> {
        self.check("keyguard")?;
        Ok(true)
    }

    fn system_property(&self, name: &str) -> Result<Option<String>, ProbeError> {
        self.check("properties")?;
        Ok(self.properties.get(name).cloned())
    }

    fn path_exists(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    fn is_package_installed(&self, package: &str) -> Result<bool, ProbeError> {
        self.check("packages")?;
        Ok(self.packages.contains(package))
    }

    fn process_identity(&self) -> Result<ProcessIdentity, ProbeError> {
        self.check("process")?;
        Ok(self.process.clone())
    }

    fn locale(&self) -> Result<LocaleInfo, ProbeError> {
        self.check("locale")?;
        Ok(LocaleInfo {
            language: "en".into(),
            country: "US".into(),
        })
    }

    fn timezone(&self) -> Result<TimezoneInfo, ProbeError> {
        self.check("timezone")?;
        Ok(self.timezone.clone())
    }

    fn uptime(&self) -> Result<Duration, ProbeError> {
        self.check("uptime")?;
        Ok(self.uptime)
    }

    fn clipboard_text(&self) -> Result<Option<String>, ProbeError> {
        self.check("clipboard")?;
        Ok(self.clipboard.clone())
    }

    fn remote_control_session(&self) -> Result<Option<String>, ProbeError> {
        Ok(self.remote_control.clone())
    }

    fn virtualization_hint(&self) -> Result<Option<String>, ProbeError> {
        Ok(self.virtualization.clone())
    }

    fn usb_state(&self) -> Result<UsbState, ProbeError> {
        self.usb
            .clone()
            .ok_or(ProbeError::Unsupported("usb state"))
    }

    fn telephony(&self) -> Option<&dyn Telephony> {
        self.telephony.as_ref().map(|t| t as &dyn Telephony)
    }

    fn location_manager(&self) -> Option<&dyn LocationManager> {
        self.location_manager
            .as_ref()
            .map(|m| m as &dyn LocationManager)
    }

    fn geocoder(&self) -> Option<Arc<dyn Geocoder>> {
        self.geocoder.clone().map(|g| g as Arc<dyn Geocoder>)
    }

    fn store(&self) -> Option<&dyn KeyValueStore> {
        self.store.as_ref().map(|s| s as &dyn KeyValueStore)
    }
}

pub struct FakeTelephony {
    pub modem_count: u32,
    pub imeis: Vec<Option<String>>,
    pub meids: Vec<Option<String>>,
    pub legacy_id: Option<String>,
    pub carrier_privileges: bool,
    pub default_dialer: Option<String>,
    pub default_sms: Option<String>,
    pub operator_name: Option<String>,
    pub country_iso: Option<String>,
    pub call_state: CallState,
}

impl Default for FakeTelephony {
    fn default() -> Self {
        Self {
            modem_count: 1,
            imeis: Vec::new(),
            meids: Vec::new(),
            legacy_id: None,
            carrier_privileges: false,
            default_dialer: None,
            default_sms: None,
            operator_name: None,
            country_iso: None,
            call_state: CallState::Idle,
        }
    }
}

impl Telephony for FakeTelephony {
    fn network_country_iso(&self) -> Result<Option<String>, ProbeError> {
        Ok(self.country_iso.clone())
    }

    fn network_operator_name(&self) -> Result<Option<String>, ProbeError> {
        Ok(self.operator_name.clone())
    }

    fn call_state(&self) -> Result<CallState, ProbeError> {
        Ok(self.call_state)
    }

    fn has_carrier_privileges(&self) -> Result<bool, ProbeError> {
        Ok(self.carrier_privileges)
    }

    fn default_dialer_package(&self) -> Result<Option<String>, ProbeError> {
        Ok(self.default_dialer.clone())
    }

    fn default_sms_package(&self) -> Result<Option<String>, ProbeError> {
        Ok(self.default_sms.clone())
    }

    fn modem_count(&self) -> Result<u32, ProbeError> {
        Ok(self.modem_count)
    }

    fn imei(&self, slot: u32) -> Result<Option<String>, ProbeError> {
        Ok(self.imeis.get(slot as usize).cloned().flatten())
    }

    fn meid(&self, slot: u32) -> Result<Option<String>, ProbeError> {
        Ok(self.meids.get(slot as usize).cloned().flatten())
    }

    fn legacy_device_id(&self) -> Result<Option<String>, ProbeError> {
        Ok(self.legacy_id.clone())
    }
}

/// Fix with 5 m accuracy and no mock flag
pub fn fix(provider: &str, latitude: f64, longitude: f64, time_ms: i64) -> LocationFix {
    LocationFix {
        provider: provider.into(),
        latitude,
        longitude,
        accuracy_m: 5.0,
        time_ms,
        is_mock: false,
    }
}

#[derive(Default)]
pub struct FakeLocationManager {
    pub providers: Vec<String>,
    pub fixes: HashMap<String, Option<LocationFix>>,
    /// Providers whose reads fail
    pub failing: Vec<String>,
}

impl FakeLocationManager {
    pub fn with(providers: Vec<(&str, Option<LocationFix>)>) -> Self {
        let mut manager = Self::default();
        for (name, fix) in providers {
            manager.providers.push(name.into());
            manager.fixes.insert(name.into(), fix);
        }
        manager
    }
}

impl LocationManager for FakeLocationManager {
    fn enabled_providers(&self) -> Result<Vec<String>, ProbeError> {
        Ok(self.providers.clone())
    }

    fn last_known_location(&self, provider: &str) -> Result<Option<LocationFix>, ProbeError> {
        if self.failing.iter().any(|p| p == provider) {
            return Err(ProbeError::Other(format!("{provider} provider crashed")));
        }
        Ok(self.fixes.get(provider).cloned().flatten())
    }
}

pub struct FakeGeocoder {
    answer: Option<Address>,
    delay: Option<Duration>,
    fail: bool,
}

impl FakeGeocoder {
    pub fn answering(address: Address) -> Self {
        Self {
            answer: Some(address),
            delay: None,
            fail: false,
        }
    }

    /// Answers nothing until `delay` has passed
    pub fn stalling(delay: Duration) -> Self {
        Self {
            answer: None,
            delay: Some(delay),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            delay: None,
            fail: true,
        }
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<Address>, ProbeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ProbeError::Other("geocoder offline".into()));
        }
        Ok(self.answer.clone())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    fail: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            values: Mutex::default(),
            fail: true,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProbeError> {
        if self.fail {
            return Err(ProbeError::Other("store locked".into()));
        }
        Ok(self.values.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), ProbeError> {
        if self.fail {
            return Err(ProbeError::Other("store locked".into()));
        }
        self.values.lock().insert(key.into(), value.into());
        Ok(())
    }
}

/// Permission gate driven by a script, recording every call
#[derive(Default)]
pub struct ScriptedGate {
    states: Mutex<HashMap<Capability, GrantState>>,
    after_request: HashMap<Capability, GrantState>,
    request_delay: Option<Duration>,
    classify_calls: Mutex<Vec<CapabilitySet>>,
    request_calls: Mutex<Vec<CapabilitySet>>,
    outstanding: AtomicUsize,
    max_outstanding: AtomicUsize,
}

impl ScriptedGate {
    pub fn granting(capabilities: &[Capability]) -> Self {
        let mut gate = Self::default();
        for &capability in capabilities {
            gate.states.get_mut().insert(capability, GrantState::Granted);
        }
        gate
    }

    pub fn with_state(mut self, capability: Capability, state: GrantState) -> Self {
        self.states.get_mut().insert(capability, state);
        self
    }

    /// State `capability` moves to once it has been requested
    pub fn after_request(mut self, capability: Capability, state: GrantState) -> Self {
        self.after_request.insert(capability, state);
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = Some(delay);
        self
    }

    pub fn classify_calls(&self) -> Vec<CapabilitySet> {
        self.classify_calls.lock().clone()
    }

    pub fn request_calls(&self) -> Vec<CapabilitySet> {
        self.request_calls.lock().clone()
    }

    /// Most requests ever in flight at once
    pub fn max_outstanding_requests(&self) -> usize {
        self.max_outstanding.load(Ordering::SeqCst)
    }

    fn snapshot(&self, capabilities: &CapabilitySet) -> PermissionClassification {
        PermissionClassification::from_states(capabilities, |c| self.grant_state(c))
    }
}

#[async_trait]
impl PermissionGate for ScriptedGate {
    fn grant_state(&self, capability: Capability) -> GrantState {
        self.states
            .lock()
            .get(&capability)
            .copied()
            .unwrap_or(GrantState::Denied)
    }

    fn classify(&self, requested: &CapabilitySet) -> PermissionClassification {
        self.classify_calls.lock().push(requested.clone());
        self.snapshot(requested)
    }

    async fn request_missing(&self, capabilities: &CapabilitySet) -> PermissionClassification {
        self.request_calls.lock().push(capabilities.clone());
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_outstanding.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.request_delay {
            tokio::time::sleep(delay).await;
        }
        {
            let mut states = self.states.lock();
            for capability in capabilities {
                if let Some(state) = self.after_request.get(capability) {
                    states.insert(*capability, *state);
                }
            }
        }

        self.outstanding.fetch_sub(1, Ordering::SeqCst);
        self.snapshot(capabilities)
    }
}

/// Settings prompt that answers with a fixed choice
pub struct RecordingPrompt {
    choice: RemediationChoice,
    prompted: Mutex<Vec<Vec<Capability>>>,
    opened: AtomicUsize,
}

impl RecordingPrompt {
    pub fn answering(choice: RemediationChoice) -> Self {
        Self {
            choice,
            prompted: Mutex::default(),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn prompted(&self) -> Vec<Vec<Capability>> {
        self.prompted.lock().clone()
    }

    pub fn settings_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsPrompt for RecordingPrompt {
    async fn prompt_open_settings(&self, permanently_denied: &[Capability]) -> RemediationChoice {
        self.prompted.lock().push(permanently_denied.to_vec());
        self.choice
    }

    fn open_app_settings(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fully populated record with a successful location
pub fn sample_record() -> AttributeRecord {
    AttributeRecord {
        android_id: Some("9774d56d682e549c".into()),
        app_instance_id: "5b1f0c9d3a2e4f60b7d8c9e0a1b2c3d4e5f60718293a4b5c6d7e8f9012345678".into(),
        android_version: "34 (14)".into(),
        app_guid: "0f8fad5b-d9cb-469f-a165-70867728950e".into(),
        audio_mute_status: false,
        audio_volume_current: 7,
        battery_charging: true,
        battery_health: BatteryHealth::Good,
        battery_level: Some(80),
        battery_temperature: 29.5,
        battery_voltage: 3900,
        biometric_status: BiometricStatus::Enrolled,
        bootloader_state: BootloaderState::Locked,
        build_device: "shiba".into(),
        build_id: "UD1A.230803.041".into(),
        build_manufacturer: "Google".into(),
        build_model: "Pixel 8".into(),
        build_number: "UD1A.230803.041".into(),
        build_time: 1_691_020_800,
        carrier_country: Some("US".into()),
        carrier_name: Some("Carrier".into()),
        cpu_count: 8,
        cpu_hash: "a3c1e8d2f4b6a8c0e2d4f6b8a0c2e4d6f8b0a2c4e6d8f0b2a4c6e8d0f2b4a6c8".into(),
        cpu_speed: 2400.0,
        cpu_type: "arm64-v8a".into(),
        developer_options_state: DeveloperOptionsState::Disabled,
        device_cellular_id: None,
        device_hash: "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00".into(),
        device_ip_address: Some("10.0.0.5".into()),
        device_ip_country: None,
        device_ip_isp: None,
        device_ip_region: None,
        device_name: "Google Pixel 8".into(),
        device_orientation: Some(Orientation::PortraitUp),
        dns_ip_country: None,
        dns_ip_isp: None,
        dns_ip: Some("1.1.1.1".into()),
        free_storage: 64_000_000_000,
        gsf_id: None,
        has_proximity_sensor: true,
        interfering_apps: Vec::new(),
        is_click_automator_installed: false,
        is_emulator: false,
        is_keyguard_secure: true,
        is_nfc_available: true,
        is_nfc_enabled: true,
        is_on_call: false,
        is_remote_control_connected: false,
        is_rooted: false,
        is_screen_being_mirrored: false,
        kernel_arch: "aarch64".into(),
        kernel_name: "Linux".into(),
        kernel_version: "5.15.110-android14-11".into(),
        last_boot_time: 1_760_000_000,
        network_config: NetworkConfig::Wifi,
        pasteboard_hash: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
            .into(),
        physical_memory: 8 * 1024 * 1024 * 1024,
        region_country: Some("US".into()),
        region_language: Some("en".into()),
        region_timezone: "+00:00".into(),
        remote_control_provider: None,
        screen_brightness: 50,
        screen_height: 2400,
        screen_scale: 2,
        screen_width: 1080,
        sensor_hash: "1b4f0e9851971998e732078544c96b36c3d01cedf7caa332359d6f1d83567014".into(),
        session_id: "7c9e6679-7425-40de-944b-e07fc1f90ae7".into(),
        source: "android-34.14".into(),
        system_uptime: 7200,
        timezone_identifier: "UTC".into(),
        total_storage: 128_000_000_000,
        kind: "android".into(),
        usb_cable_state: UsbStatus::Unknown,
        usb_debugging_state: UsbStatus::Unknown,
        wifi_mac_address: None,
        wifi_ssid: Some("HomeNet".into()),
        first_api_level: 34,
        power_source: PowerSource::Battery,
        proxy_address: None,
        proxy_state: ConnectionState::NotConnected,
        vpn_state: ConnectionState::NotConnected,
        suspicious_flags: Vec::new(),
        true_device_id: "16fd2706-8baf-433b-82eb-8c7fada847da".into(),
        system_integrity: SystemIntegrity::Ok,
        is_app_cloned: false,
        device_location: Some(LocationRecord {
            accuracy: Some(5),
            is_simulated: Some(false),
            latitude: Some(40.7128),
            longitude: Some(-74.006),
            status: LocationStatus::Success,
            zip: Some("10007".into()),
            city: Some("New York".into()),
            region: Some("New York".into()),
            country_code: Some("US".into()),
        }),
    }
}
