//! Linux host platform
//!
//! A [`DevicePlatform`] backed by procfs, sysfs, `/etc` and the process
//! environment, used by the `device-snapshot` binary. Mobile-only facets
//! (telephony, location, biometrics) stay unsupported and the collector
//! reports them as unavailable.
//!
//! All paths are resolved under a configurable root so the parsers can be
//! exercised against a fake tree.

use std::{
    collections::BTreeMap,
    ffi::CString,
    fs,
    net::UdpSocket,
    os::unix::ffi::OsStrExt,
    path::{Path, PathBuf},
    process::Command,
    time::Duration,
};

use parking_lot::Mutex;
use tracing::debug;

use super::{
    BatteryStatus, BuildInfo, ChargeStatus, DevicePlatform, DisplayMetrics, KernelInfo,
    KeyValueStore, LinkProperties, LocaleInfo, NetworkState, NfcState, PlugType, ProbeError,
    ProcessIdentity, RawBatteryHealth, Rotation, StorageStats, TimezoneInfo, Transport,
};

/// Directory name under the XDG data dir
const APP_DIR: &str = "device-snapshot";

/// Users per Android-style user id block
const PER_USER_RANGE: u32 = 100_000;

/// Default data directory for the identity store
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from("/tmp").join(APP_DIR), |d| d.join(APP_DIR))
}

/// JSON-file key/value store for persisted identifiers
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<data dir>/device-snapshot/identity.json`
    pub fn in_default_location() -> Self {
        Self::new(default_data_dir().join("identity.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ProbeError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| ProbeError::Parse(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProbeError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), ProbeError> {
        let _guard = self.lock.lock();
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(&values).map_err(|e| ProbeError::Other(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Fields of an os-release file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    pub id: String,
    pub version_id: Option<String>,
    pub pretty_name: String,
    pub build_id: Option<String>,
}

/// Parse os-release `KEY=value` lines, unquoting values
pub fn parse_os_release(content: &str) -> OsRelease {
    let mut release = OsRelease::default();
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim_matches('"').trim_matches('\'').to_string();
        match key {
            "ID" => release.id = value,
            "VERSION_ID" => release.version_id = Some(value),
            "PRETTY_NAME" => release.pretty_name = value,
            "BUILD_ID" => release.build_id = Some(value),
            _ => {}
        }
    }
    release
}

/// `MemTotal` from /proc/meminfo, in bytes
pub fn parse_mem_total(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find_map(|l| l.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse::<u64>().ok())
        .and_then(|kb| kb.checked_mul(1024))
}

/// Interface carrying the default route in /proc/net/route
pub fn default_route_interface(route_table: &str) -> Option<String> {
    route_table.lines().skip(1).find_map(|line| {
        let mut cols = line.split_whitespace();
        let iface = cols.next()?;
        let destination = cols.next()?;
        (destination == "00000000").then(|| iface.to_string())
    })
}

/// `language_COUNTRY.codeset@modifier` to language and country
pub fn parse_locale(value: &str) -> Option<LocaleInfo> {
    let base = value.split(['.', '@']).next()?.trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    let (language, country) = base.split_once('_').unwrap_or((base, ""));
    Some(LocaleInfo {
        language: language.to_string(),
        country: country.to_string(),
    })
}

/// Host and port of a proxy URL like `http://user@proxy:3128/`
pub fn parse_proxy_url(url: &str) -> Option<(String, String)> {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let authority = rest.split('/').next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let (host, port) = host_port.rsplit_once(':')?;
    (!host.is_empty()).then(|| (host.to_string(), port.to_string()))
}

fn transport_for(iface: &str) -> Transport {
    if iface.starts_with("wl") {
        Transport::Wifi
    } else if iface.starts_with("ww") || iface.starts_with("rmnet") {
        Transport::Cellular
    } else if iface.starts_with('e') {
        Transport::Ethernet
    } else {
        Transport::None
    }
}

fn is_vpn_interface(iface: &str) -> bool {
    ["tun", "tap", "wg", "ppp", "vpn"]
        .iter()
        .any(|prefix| iface.starts_with(prefix))
}

fn charge_status(raw: &str) -> ChargeStatus {
    match raw.trim() {
        "Charging" => ChargeStatus::Charging,
        "Full" => ChargeStatus::Full,
        "Discharging" => ChargeStatus::Discharging,
        "Not charging" => ChargeStatus::NotCharging,
        _ => ChargeStatus::Unknown,
    }
}

fn battery_health(raw: &str) -> RawBatteryHealth {
    match raw.trim() {
        "Good" => RawBatteryHealth::Good,
        "Cold" => RawBatteryHealth::Cold,
        "Dead" => RawBatteryHealth::Dead,
        "Over voltage" => RawBatteryHealth::OverVoltage,
        "Overheat" => RawBatteryHealth::Overheat,
        "Unspecified failure" => RawBatteryHealth::UnspecifiedFailure,
        _ => RawBatteryHealth::Unknown,
    }
}

/// The live Linux host
pub struct LinuxHost {
    root: PathBuf,
    store: Option<FileStore>,
}

impl Default for LinuxHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHost {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/"),
            store: None,
        }
    }

    /// Resolve every host path under `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            store: None,
        }
    }

    pub fn with_store(mut self, store: FileStore) -> Self {
        self.store = Some(store);
        self
    }

    fn is_live(&self) -> bool {
        self.root == Path::new("/")
    }

    fn path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn read(&self, path: &str) -> Result<String, ProbeError> {
        Ok(fs::read_to_string(self.path(path))?)
    }

    fn read_trimmed(&self, path: &str) -> Option<String> {
        self.read(path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn read_number<T: std::str::FromStr>(&self, path: &str) -> Option<T> {
        self.read_trimmed(path)?.parse().ok()
    }

    fn list_dir(&self, path: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.path(path)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn os_release(&self) -> Option<OsRelease> {
        ["/run/host/os-release", "/etc/os-release", "/usr/lib/os-release"]
            .iter()
            .find_map(|p| self.read(p).ok())
            .map(|content| parse_os_release(&content))
    }

    fn hostname(&self) -> String {
        self.read_trimmed("/etc/hostname")
            .or_else(|| self.read_trimmed("/proc/sys/kernel/hostname"))
            .unwrap_or_else(|| "localhost".to_string())
    }

    fn power_supplies(&self, kind: &str) -> Vec<String> {
        self.list_dir("/sys/class/power_supply")
            .into_iter()
            .filter(|name| {
                self.read_trimmed(&format!("/sys/class/power_supply/{name}/type"))
                    .is_some_and(|t| t == kind)
            })
            .collect()
    }

    fn supply_online(&self, kind: &str) -> bool {
        self.power_supplies(kind).iter().any(|name| {
            self.read_number::<u8>(&format!("/sys/class/power_supply/{name}/online")) == Some(1)
        })
    }

    fn detect_virtualization(&self) -> Option<String> {
        if self.is_live() {
            if let Ok(output) = Command::new("systemd-detect-virt").output() {
                let virt = String::from_utf8_lossy(&output.stdout).trim().to_lowercase();
                if output.status.success() && !virt.is_empty() && virt != "none" {
                    return Some(virt);
                }
            }
        }

        if let Some(product) = self.read_trimmed("/sys/devices/virtual/dmi/id/product_name") {
            let product = product.to_lowercase();
            for hint in ["virtualbox", "vmware", "qemu", "kvm"] {
                if product.contains(hint) {
                    return Some(hint.to_string());
                }
            }
        }

        if self.path("/.dockerenv").exists() {
            return Some("docker".to_string());
        }
        if let Ok(cgroup) = self.read("/proc/1/cgroup") {
            for hint in ["docker", "lxc"] {
                if cgroup.contains(hint) {
                    return Some(hint.to_string());
                }
            }
        }
        None
    }

    fn proxy(&self) -> Option<(String, String)> {
        ["https_proxy", "HTTPS_PROXY", "http_proxy", "HTTP_PROXY"]
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .and_then(|url| parse_proxy_url(&url))
    }

    fn local_address(&self) -> Option<String> {
        if !self.is_live() {
            return None;
        }
        // Connecting a UDP socket only selects a route; nothing is sent
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("192.0.2.1:9").ok()?;
        socket.local_addr().ok().map(|a| a.ip().to_string())
    }

    fn statvfs(&self, path: &Path) -> Result<StorageStats, ProbeError> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| ProbeError::Parse(e.to_string()))?;
        // SAFETY: statvfs only writes into the zeroed struct we own, and
        // c_path is a valid NUL-terminated string for the duration of the call
        let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        let frsize = stat.f_frsize as u64;
        Ok(StorageStats {
            total_bytes: (stat.f_blocks as u64).saturating_mul(frsize),
            free_bytes: (stat.f_bavail as u64).saturating_mul(frsize),
        })
    }
}

impl DevicePlatform for LinuxHost {
    fn kind(&self) -> &'static str {
        "linux"
    }

    fn build_info(&self) -> Result<BuildInfo, ProbeError> {
        let release = self
            .os_release()
            .ok_or_else(|| ProbeError::NotFound("os-release".into()))?;
        let manufacturer = self
            .read_trimmed("/sys/devices/virtual/dmi/id/sys_vendor")
            .unwrap_or_else(|| "unknown".into());
        let model = self
            .read_trimmed("/sys/devices/virtual/dmi/id/product_name")
            .unwrap_or_else(|| "unknown".into());
        let device = self.hostname();
        let kernel = self
            .read_trimmed("/proc/sys/kernel/osrelease")
            .unwrap_or_else(|| "unknown".into());
        let time_ms = fs::metadata(self.path("/etc/os-release"))
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis() as i64);

        Ok(BuildInfo {
            sdk_int: 0,
            fingerprint: format!(
                "{}/{}:{}/{}",
                release.id,
                device,
                release.version_id.as_deref().unwrap_or("rolling"),
                kernel
            ),
            id: release.build_id.clone().unwrap_or_else(|| kernel.clone()),
            display: release.pretty_name.clone(),
            brand: release.id.clone(),
            release: release.version_id,
            device,
            manufacturer,
            model,
            tags: None,
            time_ms,
            supported_abis: vec![std::env::consts::ARCH.to_string()],
        })
    }

    fn kernel_info(&self) -> Result<KernelInfo, ProbeError> {
        Ok(KernelInfo {
            arch: std::env::consts::ARCH.to_string(),
            name: self.read("/proc/sys/kernel/ostype")?.trim().to_string(),
            version: self.read("/proc/sys/kernel/osrelease")?.trim().to_string(),
        })
    }

    fn platform_device_id(&self) -> Result<Option<String>, ProbeError> {
        Ok(self
            .read_trimmed("/etc/machine-id")
            .or_else(|| self.read_trimmed("/var/lib/dbus/machine-id")))
    }

    fn battery(&self) -> Result<BatteryStatus, ProbeError> {
        let name = self
            .power_supplies("Battery")
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::NotFound("battery".into()))?;
        let base = format!("/sys/class/power_supply/{name}");

        let plugged = if self.supply_online("Mains") {
            PlugType::Ac
        } else if self.supply_online("USB") {
            PlugType::Usb
        } else {
            PlugType::Unplugged
        };

        Ok(BatteryStatus {
            level: self.read_number(&format!("{base}/capacity")).unwrap_or(-1),
            scale: 100,
            status: self
                .read_trimmed(&format!("{base}/status"))
                .map_or(ChargeStatus::Unknown, |s| charge_status(&s)),
            health: self
                .read_trimmed(&format!("{base}/health"))
                .map_or(RawBatteryHealth::Unknown, |h| battery_health(&h)),
            temperature_tenths: self.read_number(&format!("{base}/temp")).unwrap_or(0),
            voltage_mv: self
                .read_number::<i64>(&format!("{base}/voltage_now"))
                .map_or(0, |uv| (uv / 1000) as i32),
            plugged,
        })
    }

    fn cpu_max_freq_khz(&self) -> Result<Option<f64>, ProbeError> {
        Ok(self.read_number("/sys/devices/system/cpu/cpu0/cpufreq/cpuinfo_max_freq"))
    }

    fn physical_memory_bytes(&self) -> Result<u64, ProbeError> {
        parse_mem_total(&self.read("/proc/meminfo")?)
            .ok_or_else(|| ProbeError::Parse("MemTotal missing from meminfo".into()))
    }

    fn storage(&self) -> Result<StorageStats, ProbeError> {
        let dir = default_data_dir();
        let existing = dir
            .ancestors()
            .find(|p| p.exists())
            .unwrap_or_else(|| Path::new("/"));
        self.statvfs(existing)
    }

    fn display(&self) -> Result<DisplayMetrics, ProbeError> {
        for connector in self.list_dir("/sys/class/drm") {
            let base = format!("/sys/class/drm/{connector}");
            if self.read_trimmed(&format!("{base}/status")).as_deref() != Some("connected") {
                continue;
            }
            let Some(mode) = self
                .read(&format!("{base}/modes"))
                .ok()
                .and_then(|m| m.lines().next().map(str::to_string))
            else {
                continue;
            };
            if let Some((w, h)) = mode.split_once('x') {
                let width_px = w.trim().parse().unwrap_or(0);
                let height_px = h.trim_end_matches(|c: char| !c.is_ascii_digit()).parse().unwrap_or(0);
                return Ok(DisplayMetrics {
                    width_px,
                    height_px,
                    density: 1.0,
                    rotation: Some(Rotation::Deg0),
                });
            }
        }
        Err(ProbeError::NotFound("connected display".into()))
    }

    fn screen_brightness_raw(&self) -> Result<i32, ProbeError> {
        let device = self
            .list_dir("/sys/class/backlight")
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::NotFound("backlight".into()))?;
        let base = format!("/sys/class/backlight/{device}");
        let current: i64 = self
            .read_number(&format!("{base}/brightness"))
            .ok_or_else(|| ProbeError::Parse("brightness".into()))?;
        let max: i64 = self
            .read_number(&format!("{base}/max_brightness"))
            .filter(|m| *m > 0)
            .ok_or_else(|| ProbeError::Parse("max_brightness".into()))?;
        Ok((current.clamp(0, max).saturating_mul(255) / max) as i32)
    }

    fn network(&self) -> Result<NetworkState, ProbeError> {
        let routes = self.read("/proc/net/route")?;
        let transport = default_route_interface(&routes).map_or(Transport::None, |i| transport_for(&i));
        let vpn = self
            .list_dir("/sys/class/net")
            .iter()
            .any(|iface| is_vpn_interface(iface));
        Ok(NetworkState { transport, vpn })
    }

    fn active_link(&self) -> Result<Option<LinkProperties>, ProbeError> {
        let routes = self.read("/proc/net/route")?;
        if default_route_interface(&routes).is_none() {
            return Ok(None);
        }
        let dns_servers = self
            .read("/etc/resolv.conf")
            .map(|conf| {
                conf.lines()
                    .filter_map(|l| l.trim().strip_prefix("nameserver"))
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Some(LinkProperties {
            addresses: self.local_address().into_iter().collect(),
            dns_servers,
        }))
    }

    fn nfc(&self) -> Result<Option<NfcState>, ProbeError> {
        Ok(self
            .list_dir("/sys/class/nfc")
            .first()
            .map(|_| NfcState { enabled: true }))
    }

    fn system_property(&self, name: &str) -> Result<Option<String>, ProbeError> {
        Ok(match name {
            "http.proxyHost" => self.proxy().map(|(host, _)| host),
            "http.proxyPort" => self.proxy().map(|(_, port)| port),
            _ => None,
        })
    }

    fn path_exists(&self, path: &str) -> bool {
        self.path(path).exists()
    }

    fn is_package_installed(&self, package: &str) -> Result<bool, ProbeError> {
        let desktop = format!("/usr/share/applications/{package}.desktop");
        let flatpak = format!("/var/lib/flatpak/app/{package}");
        Ok(self.path_exists(&desktop) || self.path_exists(&flatpak))
    }

    fn process_identity(&self) -> Result<ProcessIdentity, ProbeError> {
        let status = self.read("/proc/self/status")?;
        let uid = status
            .lines()
            .find_map(|l| l.strip_prefix("Uid:"))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|u| u.parse::<u32>().ok())
            .ok_or_else(|| ProbeError::Parse("Uid missing from /proc/self/status".into()))?;

        Ok(ProcessIdentity {
            package_name: env!("CARGO_PKG_NAME").to_string(),
            user_id: uid / PER_USER_RANGE,
            data_dir: default_data_dir().display().to_string(),
            code_path: std::env::current_exe()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            process_name: self.read_trimmed("/proc/self/comm"),
            debuggable: cfg!(debug_assertions),
        })
    }

    fn locale(&self) -> Result<LocaleInfo, ProbeError> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| parse_locale(&value))
            .ok_or_else(|| ProbeError::NotFound("locale".into()))
    }

    fn timezone(&self) -> Result<TimezoneInfo, ProbeError> {
        let id = std::env::var("TZ")
            .ok()
            .map(|tz| tz.trim_start_matches(':').to_string())
            .filter(|tz| !tz.is_empty())
            .or_else(|| self.read_trimmed("/etc/timezone"))
            .or_else(|| {
                fs::read_link(self.path("/etc/localtime")).ok().and_then(|target| {
                    target
                        .to_string_lossy()
                        .split_once("zoneinfo/")
                        .map(|(_, zone)| zone.to_string())
                })
            })
            .unwrap_or_else(|| "UTC".to_string());
        let offset_secs = chrono::Local::now().offset().local_minus_utc();
        Ok(TimezoneInfo {
            id,
            raw_offset_ms: i64::from(offset_secs) * 1000,
        })
    }

    fn uptime(&self) -> Result<Duration, ProbeError> {
        let content = self.read("/proc/uptime")?;
        let secs: f64 = content
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ProbeError::Parse(format!("bad /proc/uptime: {content}")))?;
        Ok(Duration::from_secs_f64(secs))
    }

    fn remote_control_session(&self) -> Result<Option<String>, ProbeError> {
        if std::env::var_os("SSH_CONNECTION").is_some() {
            return Ok(Some("ssh".to_string()));
        }
        Ok(None)
    }

    fn virtualization_hint(&self) -> Result<Option<String>, ProbeError> {
        let hint = self.detect_virtualization();
        if let Some(ref virt) = hint {
            debug!("Virtualization detected: {virt}");
        }
        Ok(hint)
    }

    fn store(&self) -> Option<&dyn KeyValueStore> {
        self.store.as_ref().map(|s| s as &dyn KeyValueStore)
    }
}
