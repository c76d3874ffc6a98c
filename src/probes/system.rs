//! Build, kernel, locale and clock probes

use chrono::Utc;

use super::{non_blank, sha256_hex, ProbeContext};

/// Fallback when the host has no timezone database
const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq)]
pub struct SystemFacts {
    pub android_version: String,
    pub build_device: String,
    pub build_id: String,
    pub build_manufacturer: String,
    pub build_model: String,
    pub build_number: String,
    pub build_time: i64,
    pub cpu_hash: String,
    pub cpu_type: String,
    pub device_name: String,
    pub first_api_level: u32,
    pub kernel_arch: String,
    pub kernel_name: String,
    pub kernel_version: String,
    pub last_boot_time: i64,
    pub region_country: Option<String>,
    pub region_language: Option<String>,
    pub region_timezone: String,
    pub source: String,
    pub system_uptime: i64,
    pub timezone_identifier: String,
    pub kind: String,
}

/// `±HH:MM` for a UTC offset in milliseconds
pub fn format_utc_offset(offset_ms: i64) -> String {
    let sign = if offset_ms < 0 { '-' } else { '+' };
    let minutes = offset_ms.unsigned_abs() / 60_000;
    format!("{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn collect(ctx: &mut ProbeContext<'_>) -> SystemFacts {
    let platform = ctx.platform;
    let build = &ctx.build;
    let faults = &mut ctx.faults;
    let kind = platform.kind();

    let kernel = faults.read("kernel", platform.kernel_info());
    let (kernel_arch, kernel_name, kernel_version) = match kernel {
        Some(k) => (k.arch, k.name, k.version),
        None => ("unknown".into(), "Linux".into(), "unknown".into()),
    };

    let cpu_type = build
        .supported_abis
        .first()
        .cloned()
        .or_else(|| (kernel_arch != "unknown").then(|| kernel_arch.clone()))
        .unwrap_or_else(|| "unknown".into());

    let first_api_level = faults
        .read(
            "first_api_level",
            platform.system_property("ro.product.first_api_level"),
        )
        .flatten()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|level| *level > 0)
        .unwrap_or(build.sdk_int);

    let release = build.release.as_deref();

    let uptime_secs = faults
        .read("system_uptime", platform.uptime())
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));

    let locale = faults.read("region", platform.locale());
    let (region_language, region_country) = match locale {
        Some(l) => (non_blank(Some(l.language)), non_blank(Some(l.country))),
        None => (None, None),
    };

    let (timezone_identifier, region_timezone) = match faults.read("timezone", platform.timezone())
    {
        Some(tz) => (tz.id, format_utc_offset(tz.raw_offset_ms)),
        None => (DEFAULT_TIMEZONE.to_string(), format_utc_offset(0)),
    };

    SystemFacts {
        android_version: format!("{} ({})", build.sdk_int, release.unwrap_or("unknown")),
        build_device: build.device.clone(),
        build_id: build.id.clone(),
        build_manufacturer: build.manufacturer.clone(),
        build_model: build.model.clone(),
        build_number: build.display.clone(),
        build_time: build.time_ms / 1000,
        cpu_hash: sha256_hex(&build.supported_abis.join(",")),
        cpu_type,
        device_name: format!("{} {}", build.manufacturer, build.model)
            .trim()
            .to_string(),
        first_api_level,
        kernel_arch,
        kernel_name,
        kernel_version,
        last_boot_time: Utc::now().timestamp().saturating_sub(uptime_secs),
        region_country,
        region_language,
        region_timezone,
        source: format!("{kind}-{}.{}", build.sdk_int, release.unwrap_or("?")),
        system_uptime: uptime_secs,
        timezone_identifier,
        kind: kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        assembler::CollectorSettings,
        permissions::CapabilitySet,
        platform::{BuildInfo, TimezoneInfo},
        testing::FakePlatform,
    };

    fn collect_from(platform: &FakePlatform) -> SystemFacts {
        let settings = CollectorSettings::default();
        let granted = CapabilitySet::new();
        let mut ctx = ProbeContext::new(platform, &granted, &settings);
        collect(&mut ctx)
    }

    #[test]
    fn test_format_utc_offset() {
        assert_eq!(format_utc_offset(0), "+00:00");
        assert_eq!(format_utc_offset(19_800_000), "+05:30");
        assert_eq!(format_utc_offset(-18_000_000), "-05:00");
        assert_eq!(format_utc_offset(-1_800_000), "-00:30");
        assert_eq!(format_utc_offset(-12_600_000), "-03:30");
    }

    #[test]
    fn test_build_derived_fields() {
        let facts = collect_from(&FakePlatform::default());
        let build = FakePlatform::default_build();

        assert_eq!(facts.android_version, "34 (14)");
        assert_eq!(facts.source, "android-34.14");
        assert_eq!(facts.kind, "android");
        assert_eq!(facts.build_time, build.time_ms / 1000);
        assert_eq!(facts.device_name, "Google Pixel 8");
        assert_eq!(facts.cpu_type, "arm64-v8a");
        assert_eq!(facts.cpu_hash, sha256_hex("arm64-v8a,armeabi-v7a"));
    }

    #[test]
    fn test_missing_release() {
        let platform = FakePlatform::default().with_build(BuildInfo {
            release: None,
            ..FakePlatform::default_build()
        });
        let facts = collect_from(&platform);

        assert_eq!(facts.android_version, "34 (unknown)");
        assert_eq!(facts.source, "android-34.?");
    }

    #[test]
    fn test_first_api_level() {
        let platform = FakePlatform::default().with_property("ro.product.first_api_level", "30");
        assert_eq!(collect_from(&platform).first_api_level, 30);

        let platform = FakePlatform::default().with_property("ro.product.first_api_level", "0");
        assert_eq!(collect_from(&platform).first_api_level, 34);

        assert_eq!(collect_from(&FakePlatform::default()).first_api_level, 34);
    }

    #[test]
    fn test_clock_and_region() {
        let platform = FakePlatform::default()
            .with_uptime(Duration::from_secs(3600))
            .with_timezone(TimezoneInfo {
                id: "Asia/Kolkata".into(),
                raw_offset_ms: 19_800_000,
            });
        let before = Utc::now().timestamp();
        let facts = collect_from(&platform);

        assert_eq!(facts.system_uptime, 3600);
        assert!(facts.last_boot_time >= before - 3600);
        assert!(facts.last_boot_time <= Utc::now().timestamp() - 3600);
        assert_eq!(facts.timezone_identifier, "Asia/Kolkata");
        assert_eq!(facts.region_timezone, "+05:30");
        assert_eq!(facts.region_language.as_deref(), Some("en"));
        assert_eq!(facts.region_country.as_deref(), Some("US"));
    }

    #[test]
    fn test_kernel_fallback() {
        let mut platform = FakePlatform::default().with_build(BuildInfo {
            supported_abis: Vec::new(),
            ..FakePlatform::default_build()
        });
        platform.fail("kernel");
        let facts = collect_from(&platform);

        assert_eq!(facts.kernel_name, "Linux");
        assert_eq!(facts.kernel_arch, "unknown");
        assert_eq!(facts.cpu_type, "unknown");
    }
}
