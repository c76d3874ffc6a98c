//! Host platform context
//!
//! Everything the collector knows about the device comes through the traits
//! in this module. A host application implements [`DevicePlatform`] (and the
//! optional [`Telephony`], [`LocationManager`], [`Geocoder`] and
//! [`KeyValueStore`] facets) on top of its native APIs; the core never talks
//! to the OS directly.
//!
//! Every read is fallible and every method has a default that reports
//! [`ProbeError::Unsupported`], so a host only implements what it can answer.
//! The probes turn each error into a null or placeholder value.

pub mod linux;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Platform API levels the collectors branch on
pub mod api {
    /// First level with per-slot IMEI/MEID accessors
    pub const O: u32 = 26;
    /// First level that restricts hardware identifiers to privileged callers
    pub const Q: u32 = 29;
}

/// Error from a single platform read
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The host does not expose this attribute
    #[error("Unsupported: {0}")]
    Unsupported(&'static str),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The platform refused the read (missing permission or privilege)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Value present but malformed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Timeout during probe
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Other error
    #[error("Other: {0}")]
    Other(String),
}

/// Build identification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub sdk_int: u32,
    pub release: Option<String>,
    pub device: String,
    pub id: String,
    pub manufacturer: String,
    pub model: String,
    pub brand: String,
    /// Human-readable build number
    pub display: String,
    pub fingerprint: String,
    pub tags: Option<String>,
    /// Build timestamp in milliseconds since the epoch
    pub time_ms: i64,
    /// Supported ABIs, most preferred first
    pub supported_abis: Vec<String>,
}

/// Kernel/runtime identification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelInfo {
    pub arch: String,
    pub name: String,
    pub version: String,
}

/// Music stream state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AudioState {
    pub muted: bool,
    pub volume: i32,
}

/// Raw battery charge state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChargeStatus {
    Charging,
    Full,
    Discharging,
    NotCharging,
    #[default]
    Unknown,
}

/// What the device is plugged into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlugType {
    Ac,
    Usb,
    Wireless,
    #[default]
    Unplugged,
}

/// Raw battery health as reported by the platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawBatteryHealth {
    Good,
    Cold,
    Dead,
    OverVoltage,
    Overheat,
    UnspecifiedFailure,
    #[default]
    Unknown,
}

/// Battery snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryStatus {
    /// Charge level in units of `scale`, negative if unknown
    pub level: i32,
    pub scale: i32,
    pub status: ChargeStatus,
    pub health: RawBatteryHealth,
    /// Temperature in tenths of a degree Celsius
    pub temperature_tenths: i32,
    pub voltage_mv: i32,
    pub plugged: PlugType,
}

/// Biometric enrollment as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawBiometric {
    Success,
    NoneEnrolled,
    NoHardware,
    HardwareUnavailable,
    Other,
}

/// Filesystem capacity of the app data volume
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Screen rotation relative to the natural orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// Current display geometry
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayMetrics {
    pub width_px: i32,
    pub height_px: i32,
    pub density: f32,
    pub rotation: Option<Rotation>,
}

/// Sensor type code for proximity sensors
pub const SENSOR_TYPE_PROXIMITY: i32 = 8;

/// One hardware sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorInfo {
    pub kind: i32,
    pub name: String,
    pub vendor: String,
}

/// Transport of the active network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    Wifi,
    Cellular,
    Ethernet,
    #[default]
    None,
}

/// Active network summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkState {
    pub transport: Transport,
    pub vpn: bool,
}

/// Addresses of the active network link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkProperties {
    pub addresses: Vec<String>,
    pub dns_servers: Vec<String>,
}

/// Wi-Fi connection details
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiInfo {
    /// SSID as reported, possibly quoted
    pub ssid: Option<String>,
    /// IPv4 address packed little-endian, 0 if none
    pub ipv4: u32,
}

/// NFC adapter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NfcState {
    pub enabled: bool,
}

/// Identity of the collecting process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub package_name: String,
    pub user_id: u32,
    pub data_dir: String,
    pub code_path: String,
    pub process_name: Option<String>,
    /// Host build allows debugging; gates payload logging
    pub debuggable: bool,
}

/// Default locale
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleInfo {
    pub language: String,
    pub country: String,
}

/// Default time zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimezoneInfo {
    pub id: String,
    /// Raw offset from UTC in milliseconds, without DST
    pub raw_offset_ms: i64,
}

/// USB states where the host can read them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbState {
    pub cable_connected: bool,
    pub debugging_enabled: bool,
}

/// Telephony call state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Ringing,
    OffHook,
}

/// A location fix from any provider
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub provider: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f32,
    /// Fix time in milliseconds since the epoch
    pub time_ms: i64,
    /// Platform-reported mock flag
    pub is_mock: bool,
}

/// Reverse-geocoded address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub postal_code: Option<String>,
    pub locality: Option<String>,
    pub sub_admin_area: Option<String>,
    pub admin_area: Option<String>,
    pub country_code: Option<String>,
}

/// The live host platform
pub trait DevicePlatform: Send + Sync {
    /// Platform family, e.g. `android`
    fn kind(&self) -> &'static str;

    fn build_info(&self) -> Result<BuildInfo, ProbeError> {
        Err(ProbeError::Unsupported("build info"))
    }

    fn kernel_info(&self) -> Result<KernelInfo, ProbeError> {
        Err(ProbeError::Unsupported("kernel info"))
    }

    /// Per-app device identifier assigned by the platform
    fn platform_device_id(&self) -> Result<Option<String>, ProbeError> {
        Err(ProbeError::Unsupported("platform device id"))
    }

    fn audio(&self) -> Result<AudioState, ProbeError> {
        Err(ProbeError::Unsupported("audio"))
    }

    fn battery(&self) -> Result<BatteryStatus, ProbeError> {
        Err(ProbeError::Unsupported("battery"))
    }

    fn biometric(&self) -> Result<RawBiometric, ProbeError> {
        Err(ProbeError::Unsupported("biometric"))
    }

    fn developer_options_enabled(&self) -> Result<bool, ProbeError> {
        Err(ProbeError::Unsupported("developer options"))
    }

    fn cpu_count(&self) -> Result<u32, ProbeError> {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .map_err(ProbeError::from)
    }

    fn cpu_max_freq_khz(&self) -> Result<Option<f64>, ProbeError> {
        Err(ProbeError::Unsupported("cpu frequency"))
    }

    fn physical_memory_bytes(&self) -> Result<u64, ProbeError> {
        Err(ProbeError::Unsupported("physical memory"))
    }

    fn storage(&self) -> Result<StorageStats, ProbeError> {
        Err(ProbeError::Unsupported("storage"))
    }

    fn display(&self) -> Result<DisplayMetrics, ProbeError> {
        Err(ProbeError::Unsupported("display"))
    }

    /// Screen brightness on the platform's 0..=255 scale
    fn screen_brightness_raw(&self) -> Result<i32, ProbeError> {
        Err(ProbeError::Unsupported("screen brightness"))
    }

    fn sensors(&self) -> Result<Vec<SensorInfo>, ProbeError> {
        Err(ProbeError::Unsupported("sensors"))
    }

    fn network(&self) -> Result<NetworkState, ProbeError> {
        Err(ProbeError::Unsupported("network"))
    }

    /// Link of the active network, `None` when offline
    fn active_link(&self) -> Result<Option<LinkProperties>, ProbeError> {
        Err(ProbeError::Unsupported("link properties"))
    }

    fn wifi(&self) -> Result<WifiInfo, ProbeError> {
        Err(ProbeError::Unsupported("wifi"))
    }

    /// NFC adapter, `None` when the device has none
    fn nfc(&self) -> Result<Option<NfcState>, ProbeError> {
        Err(ProbeError::Unsupported("nfc"))
    }

    fn keyguard_secure(&self) -> Result<bool, ProbeError> {
        Err(ProbeError::Unsupported("keyguard"))
    }

    /// System/runtime property lookup (`http.proxyHost`, `ro.product.first_api_level`, ...)
    fn system_property(&self, _name: &str) -> Result<Option<String>, ProbeError> {
        Err(ProbeError::Unsupported("system properties"))
    }

    fn path_exists(&self, path: &str) -> bool {
        std::path::Path::new(path).exists()
    }

    fn is_package_installed(&self, _package: &str) -> Result<bool, ProbeError> {
        Err(ProbeError::Unsupported("package manager"))
    }

    fn process_identity(&self) -> Result<ProcessIdentity, ProbeError> {
        Err(ProbeError::Unsupported("process identity"))
    }

    fn locale(&self) -> Result<LocaleInfo, ProbeError> {
        Err(ProbeError::Unsupported("locale"))
    }

    fn timezone(&self) -> Result<TimezoneInfo, ProbeError> {
        Err(ProbeError::Unsupported("timezone"))
    }

    /// Time since boot
    fn uptime(&self) -> Result<Duration, ProbeError> {
        Err(ProbeError::Unsupported("uptime"))
    }

    fn clipboard_text(&self) -> Result<Option<String>, ProbeError> {
        Err(ProbeError::Unsupported("clipboard"))
    }

    /// Provider name of an active remote-control session
    fn remote_control_session(&self) -> Result<Option<String>, ProbeError> {
        Ok(None)
    }

    fn screen_mirroring(&self) -> Result<bool, ProbeError> {
        Ok(false)
    }

    /// Hypervisor/container the host detected itself running in
    fn virtualization_hint(&self) -> Result<Option<String>, ProbeError> {
        Ok(None)
    }

    fn usb_state(&self) -> Result<UsbState, ProbeError> {
        Err(ProbeError::Unsupported("usb state"))
    }

    fn telephony(&self) -> Option<&dyn Telephony> {
        None
    }

    fn location_manager(&self) -> Option<&dyn LocationManager> {
        None
    }

    fn geocoder(&self) -> Option<Arc<dyn Geocoder>> {
        None
    }

    fn store(&self) -> Option<&dyn KeyValueStore> {
        None
    }
}

/// Telephony service
pub trait Telephony: Send + Sync {
    fn network_country_iso(&self) -> Result<Option<String>, ProbeError>;

    fn network_operator_name(&self) -> Result<Option<String>, ProbeError>;

    fn call_state(&self) -> Result<CallState, ProbeError>;

    fn has_carrier_privileges(&self) -> Result<bool, ProbeError>;

    fn default_dialer_package(&self) -> Result<Option<String>, ProbeError>;

    fn default_sms_package(&self) -> Result<Option<String>, ProbeError>;

    /// Number of radio slots
    fn modem_count(&self) -> Result<u32, ProbeError>;

    fn imei(&self, slot: u32) -> Result<Option<String>, ProbeError>;

    fn meid(&self, slot: u32) -> Result<Option<String>, ProbeError>;

    /// Single device identifier on platforms without per-slot accessors
    fn legacy_device_id(&self) -> Result<Option<String>, ProbeError>;
}

/// Built-in location manager
pub trait LocationManager: Send + Sync {
    /// Names of the currently enabled providers
    fn enabled_providers(&self) -> Result<Vec<String>, ProbeError>;

    /// Last cached fix of one provider
    fn last_known_location(&self, provider: &str) -> Result<Option<LocationFix>, ProbeError>;
}

/// Reverse geocoder; may be slow, callers bound the wait
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Address>, ProbeError>;
}

/// Small persistent string store owned by the host app
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ProbeError>;

    fn put(&self, key: &str, value: &str) -> Result<(), ProbeError>;
}
