//! Security posture probes
//!
//! Root, emulator and app-clone heuristics plus the installed-package checks.
//! None of these need privileges; they only look at build metadata, well-known
//! paths and what the package manager is willing to say.

use super::{sha256_hex, ProbeContext};
use crate::{
    platform::BuildInfo,
    record::{BootloaderState, DeveloperOptionsState, SystemIntegrity, UsbStatus},
};

/// Locations of `su` binaries and superuser packages
pub const SU_PATHS: &[&str] = &[
    "/system/app/Superuser.apk",
    "/sbin/su",
    "/system/bin/su",
    "/system/xbin/su",
    "/data/local/xbin/su",
    "/data/local/bin/su",
    "/system/sd/xbin/su",
    "/system/bin/failsafe/su",
    "/data/local/su",
];

const TEST_KEYS: &str = "test-keys";

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityFacts {
    pub is_rooted: bool,
    pub is_emulator: bool,
    pub is_app_cloned: bool,
    pub bootloader_state: BootloaderState,
    pub developer_options_state: DeveloperOptionsState,
    pub system_integrity: SystemIntegrity,
    pub is_keyguard_secure: bool,
    pub interfering_apps: Vec<String>,
    pub is_click_automator_installed: bool,
    pub is_remote_control_connected: bool,
    pub remote_control_provider: Option<String>,
    pub is_screen_being_mirrored: bool,
    pub usb_cable_state: UsbStatus,
    pub usb_debugging_state: UsbStatus,
    pub pasteboard_hash: String,
}

impl SecurityFacts {
    /// Flags in fixed order: `EMULATOR`, `ROOTED`, `APP_CLONED`, `MOCK_LOCATION`
    pub fn suspicious_flags(&self, mock_location: bool) -> Vec<String> {
        [
            (self.is_emulator, "EMULATOR"),
            (self.is_rooted, "ROOTED"),
            (self.is_app_cloned, "APP_CLONED"),
            (mock_location, "MOCK_LOCATION"),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, flag)| flag.to_string())
        .collect()
    }
}

fn has_test_keys(build: &BuildInfo) -> bool {
    build.tags.as_deref().is_some_and(|t| t.contains(TEST_KEYS))
}

/// Build metadata typical of emulator images
pub fn looks_like_emulator(build: &BuildInfo) -> bool {
    build.fingerprint.to_lowercase().contains("generic")
        || build.model.to_lowercase().contains("emulator")
        || build.manufacturer.to_lowercase().contains("genymotion")
        || build.brand.to_lowercase().starts_with("generic")
}

fn is_rooted(ctx: &ProbeContext<'_>) -> bool {
    has_test_keys(&ctx.build) || SU_PATHS.iter().any(|p| ctx.platform.path_exists(p))
}

fn is_app_cloned(ctx: &mut ProbeContext<'_>) -> bool {
    if let Some(process) = &ctx.process {
        let by_process = process.user_id > 0
            || process.data_dir.contains("/user/999")
            || process.data_dir.contains("/user_de/999")
            || process.code_path.contains("/999/")
            || process
                .process_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(":clone"));
        if by_process {
            return true;
        }
    }

    let clone_managers = ctx.settings.clone_manager_packages.clone();
    !installed_packages(ctx, "is_app_cloned", &clone_managers).is_empty()
}

/// Installed subset of `packages`; the first package manager fault stops the scan
fn installed_packages(ctx: &mut ProbeContext<'_>, field: &str, packages: &[String]) -> Vec<String> {
    let mut installed = Vec::new();
    for package in packages {
        match ctx.faults.read(field, ctx.platform.is_package_installed(package)) {
            Some(true) => installed.push(package.clone()),
            Some(false) => {}
            None => break,
        }
    }
    installed
}

pub fn collect(ctx: &mut ProbeContext<'_>) -> SecurityFacts {
    let is_rooted = is_rooted(ctx);
    let is_emulator = looks_like_emulator(&ctx.build)
        || ctx
            .faults
            .read("is_emulator", ctx.platform.virtualization_hint())
            .flatten()
            .is_some();
    let is_app_cloned = is_app_cloned(ctx);
    let bootloader_state = if has_test_keys(&ctx.build) {
        BootloaderState::Unlocked
    } else {
        BootloaderState::Locked
    };

    let interfering = ctx.settings.interfering_packages.clone();
    let interfering_apps = installed_packages(ctx, "interfering_apps", &interfering);
    let automators = ctx.settings.click_automator_packages.clone();
    let is_click_automator_installed =
        !installed_packages(ctx, "is_click_automator_installed", &automators).is_empty();

    let platform = ctx.platform;
    let faults = &mut ctx.faults;

    let developer_options_state = if faults.read_or(
        "developer_options_state",
        platform.developer_options_enabled(),
        false,
    ) {
        DeveloperOptionsState::Enabled
    } else {
        DeveloperOptionsState::Disabled
    };

    let remote_control_provider = faults
        .read("remote_control_provider", platform.remote_control_session())
        .flatten();

    let (usb_cable_state, usb_debugging_state) = match faults.read("usb", platform.usb_state()) {
        Some(usb) => (
            if usb.cable_connected {
                UsbStatus::Connected
            } else {
                UsbStatus::Disconnected
            },
            if usb.debugging_enabled {
                UsbStatus::Enabled
            } else {
                UsbStatus::Disabled
            },
        ),
        None => (UsbStatus::Unknown, UsbStatus::Unknown),
    };

    let clipboard = faults
        .read("pasteboard_hash", platform.clipboard_text())
        .flatten()
        .unwrap_or_default();

    SecurityFacts {
        is_rooted,
        is_emulator,
        is_app_cloned,
        bootloader_state,
        developer_options_state,
        system_integrity: if is_rooted || is_emulator {
            SystemIntegrity::Compromised
        } else {
            SystemIntegrity::Ok
        },
        is_keyguard_secure: faults.read_or("is_keyguard_secure", platform.keyguard_secure(), false),
        interfering_apps,
        is_click_automator_installed,
        is_remote_control_connected: remote_control_provider.is_some(),
        remote_control_provider,
        is_screen_being_mirrored: faults.read_or(
            "is_screen_being_mirrored",
            platform.screen_mirroring(),
            false,
        ),
        usb_cable_state,
        usb_debugging_state,
        pasteboard_hash: sha256_hex(&clipboard),
    }
}
