//! Hardware probes: audio, battery, CPU, memory, storage, display, sensors, NFC

use super::{sha256_hex, ProbeContext};
use crate::{
    platform::{
        ChargeStatus, DisplayMetrics, PlugType, RawBatteryHealth, RawBiometric, Rotation,
        SensorInfo, StorageStats, SENSOR_TYPE_PROXIMITY,
    },
    record::{BatteryHealth, BiometricStatus, Orientation, PowerSource},
};

#[derive(Debug, Clone, PartialEq)]
pub struct HardwareFacts {
    pub audio_mute_status: bool,
    pub audio_volume_current: i32,
    pub battery_charging: bool,
    pub battery_health: BatteryHealth,
    pub battery_level: Option<i32>,
    pub battery_temperature: f64,
    pub battery_voltage: i32,
    pub power_source: PowerSource,
    pub biometric_status: BiometricStatus,
    pub cpu_count: u32,
    pub cpu_speed: f32,
    pub physical_memory: u64,
    pub free_storage: u64,
    pub total_storage: u64,
    pub screen_width: i32,
    pub screen_height: i32,
    pub screen_scale: i32,
    pub screen_brightness: i32,
    pub device_orientation: Option<Orientation>,
    pub sensor_hash: String,
    pub has_proximity_sensor: bool,
    pub is_nfc_available: bool,
    pub is_nfc_enabled: bool,
}

/// Charge percentage, `None` unless both level and scale are sane
pub fn battery_percent(level: i32, scale: i32) -> Option<i32> {
    if level < 0 || scale <= 0 {
        return None;
    }
    i32::try_from(i64::from(level) * 100 / i64::from(scale)).ok()
}

fn battery_health(raw: RawBatteryHealth) -> BatteryHealth {
    match raw {
        RawBatteryHealth::Good => BatteryHealth::Good,
        RawBatteryHealth::Cold => BatteryHealth::Cold,
        RawBatteryHealth::Dead => BatteryHealth::Dead,
        RawBatteryHealth::OverVoltage => BatteryHealth::OverVoltage,
        RawBatteryHealth::Overheat => BatteryHealth::Overheat,
        RawBatteryHealth::UnspecifiedFailure => BatteryHealth::UnspecifiedFailure,
        RawBatteryHealth::Unknown => BatteryHealth::Unknown,
    }
}

fn power_source(plugged: PlugType) -> PowerSource {
    match plugged {
        PlugType::Ac => PowerSource::Ac,
        PlugType::Usb => PowerSource::Usb,
        PlugType::Wireless => PowerSource::Wireless,
        PlugType::Unplugged => PowerSource::Battery,
    }
}

fn biometric_status(raw: RawBiometric) -> BiometricStatus {
    match raw {
        RawBiometric::Success => BiometricStatus::Enrolled,
        RawBiometric::NoneEnrolled => BiometricStatus::NotEnrolled,
        RawBiometric::NoHardware => BiometricStatus::Unsupported,
        RawBiometric::HardwareUnavailable => BiometricStatus::Unavailable,
        RawBiometric::Other => BiometricStatus::Unknown,
    }
}

fn orientation(rotation: Rotation) -> Orientation {
    match rotation {
        Rotation::Deg0 => Orientation::PortraitUp,
        Rotation::Deg90 => Orientation::LandscapeLeft,
        Rotation::Deg180 => Orientation::PortraitDown,
        Rotation::Deg270 => Orientation::LandscapeRight,
    }
}

/// Brightness rescaled from 0..=255 to 0..=100
pub fn brightness_percent(raw: i32) -> i32 {
    (raw as f32 * 100.0 / 255.0) as i32
}

/// Stable hash over the sensor inventory
pub fn sensor_hash(sensors: &[SensorInfo]) -> String {
    let joined = sensors
        .iter()
        .map(|s| format!("{}:{}:{}", s.kind, s.name, s.vendor))
        .collect::<Vec<_>>()
        .join("|");
    sha256_hex(&joined)
}

pub fn collect(ctx: &mut ProbeContext<'_>) -> HardwareFacts {
    let platform = ctx.platform;
    let faults = &mut ctx.faults;

    let audio = faults.read("audio", platform.audio()).unwrap_or_default();

    let battery = faults.read("battery", platform.battery());
    let (battery_level, battery_charging, battery_health_state, temperature, voltage, plugged) =
        match battery {
            Some(b) => (
                battery_percent(b.level, b.scale),
                matches!(b.status, ChargeStatus::Charging | ChargeStatus::Full),
                battery_health(b.health),
                f64::from(b.temperature_tenths) / 10.0,
                b.voltage_mv,
                b.plugged,
            ),
            None => (
                None,
                false,
                BatteryHealth::Unknown,
                0.0,
                0,
                PlugType::Unplugged,
            ),
        };

    let biometric = faults
        .read("biometric_status", platform.biometric())
        .map_or(BiometricStatus::Unknown, biometric_status);

    let cpu_speed = faults
        .read("cpu_speed", platform.cpu_max_freq_khz())
        .flatten()
        .map_or(-1.0, |khz| (khz / 1000.0) as f32);

    let storage: StorageStats = faults
        .read("storage", platform.storage())
        .unwrap_or_default();

    let display: DisplayMetrics = faults
        .read("display", platform.display())
        .unwrap_or_default();

    let (sensor_hash, has_proximity_sensor) =
        match faults.read("sensor_hash", platform.sensors()) {
            Some(sensors) => (
                sensor_hash(&sensors),
                sensors.iter().any(|s| s.kind == SENSOR_TYPE_PROXIMITY),
            ),
            None => (String::new(), false),
        };

    let (is_nfc_available, is_nfc_enabled) = match faults.read("nfc", platform.nfc()).flatten() {
        Some(nfc) => (true, nfc.enabled),
        None => (false, false),
    };

    HardwareFacts {
        audio_mute_status: audio.muted,
        audio_volume_current: audio.volume,
        battery_charging,
        battery_health: battery_health_state,
        battery_level,
        battery_temperature: temperature,
        battery_voltage: voltage,
        power_source: power_source(plugged),
        biometric_status: biometric,
        cpu_count: faults.read_or("cpu_count", platform.cpu_count(), 1),
        cpu_speed,
        physical_memory: faults.read_or("physical_memory", platform.physical_memory_bytes(), 0),
        free_storage: storage.free_bytes,
        total_storage: storage.total_bytes,
        screen_width: display.width_px,
        screen_height: display.height_px,
        screen_scale: display.density as i32,
        screen_brightness: faults
            .read("screen_brightness", platform.screen_brightness_raw())
            .map_or(0, brightness_percent),
        device_orientation: display.rotation.map(orientation),
        sensor_hash,
        has_proximity_sensor,
        is_nfc_available,
        is_nfc_enabled,
    }
}
