//! Canonical attribute record
//!
//! One [`AttributeRecord`] is built per collection pass and never mutated
//! afterwards. Field order here is the field order of the encoded document.
//! Optional fields serialize as `null`; nothing is ever skipped.

use serde::{Deserialize, Serialize};

/// Outcome of the location chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationStatus {
    Success,
    Unavailable,
    NoPermission,
}

/// Nested location sub-record
///
/// Coordinates and accuracy are `None` unless `status` is `Success`; the
/// locality fields are best-effort even then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub accuracy: Option<i32>,
    pub is_simulated: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: LocationStatus,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country_code: Option<String>,
}

impl LocationRecord {
    /// Record for a non-success status
    pub fn without_fix(status: LocationStatus) -> Self {
        Self {
            accuracy: None,
            is_simulated: Some(false),
            latitude: None,
            longitude: None,
            status,
            zip: None,
            city: None,
            region: None,
            country_code: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatteryHealth {
    Good,
    Cold,
    Dead,
    OverVoltage,
    Overheat,
    UnspecifiedFailure,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiometricStatus {
    Enrolled,
    NotEnrolled,
    Unsupported,
    Unavailable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootloaderState {
    #[serde(rename = "BOOTLOADER_STATE_LOCKED")]
    Locked,
    #[serde(rename = "BOOTLOADER_STATE_UNLOCKED")]
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeveloperOptionsState {
    #[serde(rename = "DEV_OPTIONS_ENABLED")]
    Enabled,
    #[serde(rename = "DEV_OPTIONS_DISABLED")]
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    #[serde(rename = "Portrait Up")]
    PortraitUp,
    #[serde(rename = "Landscape Left")]
    LandscapeLeft,
    #[serde(rename = "Portrait Down")]
    PortraitDown,
    #[serde(rename = "Landscape Right")]
    LandscapeRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkConfig {
    Wifi,
    Cellular,
    Ethernet,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerSource {
    Ac,
    Usb,
    Wireless,
    Battery,
}

/// VPN/proxy connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Connected,
    NotConnected,
}

impl ConnectionState {
    pub fn from_bool(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::NotConnected
        }
    }
}

/// USB cable/debugging state; `Unknown` where the host cannot tell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsbStatus {
    Connected,
    Disconnected,
    Enabled,
    Disabled,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemIntegrity {
    Ok,
    Compromised,
}

/// Full device attribute record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRecord {
    pub android_id: Option<String>,
    pub app_instance_id: String,
    pub android_version: String,
    pub app_guid: String,
    pub audio_mute_status: bool,
    pub audio_volume_current: i32,
    pub battery_charging: bool,
    pub battery_health: BatteryHealth,
    pub battery_level: Option<i32>,
    pub battery_temperature: f64,
    pub battery_voltage: i32,
    pub biometric_status: BiometricStatus,
    pub bootloader_state: BootloaderState,
    pub build_device: String,
    pub build_id: String,
    pub build_manufacturer: String,
    pub build_model: String,
    pub build_number: String,
    /// Seconds since the epoch
    pub build_time: i64,
    pub carrier_country: Option<String>,
    pub carrier_name: Option<String>,
    pub cpu_count: u32,
    pub cpu_hash: String,
    /// MHz, -1.0 if unknown
    pub cpu_speed: f32,
    pub cpu_type: String,
    pub developer_options_state: DeveloperOptionsState,
    pub device_cellular_id: Option<String>,
    pub device_hash: String,
    pub device_ip_address: Option<String>,
    pub device_ip_country: Option<String>,
    pub device_ip_isp: Option<String>,
    pub device_ip_region: Option<String>,
    pub device_name: String,
    pub device_orientation: Option<Orientation>,
    pub dns_ip_country: Option<String>,
    pub dns_ip_isp: Option<String>,
    pub dns_ip: Option<String>,
    pub free_storage: u64,
    pub gsf_id: Option<String>,
    pub has_proximity_sensor: bool,
    pub interfering_apps: Vec<String>,
    pub is_click_automator_installed: bool,
    pub is_emulator: bool,
    pub is_keyguard_secure: bool,
    pub is_nfc_available: bool,
    pub is_nfc_enabled: bool,
    pub is_on_call: bool,
    pub is_remote_control_connected: bool,
    pub is_rooted: bool,
    pub is_screen_being_mirrored: bool,
    pub kernel_arch: String,
    pub kernel_name: String,
    pub kernel_version: String,
    pub last_boot_time: i64,
    pub network_config: NetworkConfig,
    pub pasteboard_hash: String,
    pub physical_memory: u64,
    pub region_country: Option<String>,
    pub region_language: Option<String>,
    pub region_timezone: String,
    pub remote_control_provider: Option<String>,
    /// 0..=100
    pub screen_brightness: i32,
    pub screen_height: i32,
    pub screen_scale: i32,
    pub screen_width: i32,
    pub sensor_hash: String,
    pub session_id: String,
    pub source: String,
    /// Seconds since boot
    pub system_uptime: i64,
    pub timezone_identifier: String,
    pub total_storage: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub usb_cable_state: UsbStatus,
    pub usb_debugging_state: UsbStatus,
    pub wifi_mac_address: Option<String>,
    pub wifi_ssid: Option<String>,
    pub first_api_level: u32,
    pub power_source: PowerSource,
    pub proxy_address: Option<String>,
    pub proxy_state: ConnectionState,
    pub vpn_state: ConnectionState,
    pub suspicious_flags: Vec<String>,
    pub true_device_id: String,
    pub system_integrity: SystemIntegrity,
    pub is_app_cloned: bool,
    pub device_location: Option<LocationRecord>,
}
