//! Network transport, proxy, Wi-Fi and carrier probes
//!
//! The address/DNS/ISP fields live in the network fallback chain; this group
//! only reads what the platform reports directly.

use super::{non_blank, ProbeContext};
use crate::{
    permissions::Capability,
    platform::{CallState, Transport},
    record::{ConnectionState, NetworkConfig},
};

const UNKNOWN_SSID: &str = "<unknown ssid>";

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityFacts {
    pub network_config: NetworkConfig,
    pub vpn_state: ConnectionState,
    pub proxy_state: ConnectionState,
    pub proxy_address: Option<String>,
    pub wifi_ssid: Option<String>,
    /// Randomized on modern platforms; never reported
    pub wifi_mac_address: Option<String>,
    pub carrier_name: Option<String>,
    pub carrier_country: Option<String>,
    pub is_on_call: bool,
}

fn network_config(transport: Transport) -> NetworkConfig {
    match transport {
        Transport::Wifi => NetworkConfig::Wifi,
        Transport::Cellular => NetworkConfig::Cellular,
        Transport::Ethernet => NetworkConfig::Ethernet,
        Transport::None => NetworkConfig::None,
    }
}

/// `host:port` when both proxy properties describe a usable proxy
pub fn proxy_address(host: Option<&str>, port: Option<&str>) -> Option<String> {
    let host = host.map(str::trim).filter(|h| !h.is_empty())?;
    let port = port
        .unwrap_or("0")
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|p| *p > 0)?;
    Some(format!("{host}:{port}"))
}

/// SSID with surrounding quotes removed; unknown placeholders become `None`
pub fn clean_ssid(raw: &str) -> Option<String> {
    let ssid = raw.trim_matches('"');
    (ssid != UNKNOWN_SSID && !ssid.is_empty()).then(|| ssid.to_string())
}

pub fn collect(ctx: &mut ProbeContext<'_>) -> ConnectivityFacts {
    let platform = ctx.platform;
    let ssid_allowed =
        ctx.is_granted(Capability::FineLocation) && ctx.is_granted(Capability::WifiState);
    let phone_state = ctx.is_granted(Capability::PhoneState);
    let faults = &mut ctx.faults;

    let network = faults.read("network_config", platform.network()).unwrap_or_default();

    let proxy_host = faults
        .read("proxy_state", platform.system_property("http.proxyHost"))
        .flatten();
    let proxy_port = platform.system_property("http.proxyPort").ok().flatten();
    let proxy_address = proxy_address(proxy_host.as_deref(), proxy_port.as_deref());

    let wifi_ssid = if ssid_allowed {
        faults
            .read("wifi_ssid", platform.wifi())
            .and_then(|w| w.ssid)
            .and_then(|raw| clean_ssid(&raw))
    } else {
        None
    };

    let (carrier_name, carrier_country, is_on_call) = match platform.telephony() {
        Some(tm) => {
            let name = non_blank(faults.read("carrier_name", tm.network_operator_name()).flatten());
            let country = non_blank(
                faults
                    .read("carrier_country", tm.network_country_iso())
                    .flatten(),
            )
            .map(|c| c.to_uppercase());
            let on_call = phone_state
                && matches!(
                    faults.read("is_on_call", tm.call_state()),
                    Some(CallState::Ringing | CallState::OffHook)
                );
            (name, country, on_call)
        }
        None => (None, None, false),
    };

    ConnectivityFacts {
        network_config: network_config(network.transport),
        vpn_state: ConnectionState::from_bool(network.vpn),
        proxy_state: ConnectionState::from_bool(proxy_address.is_some()),
        proxy_address,
        wifi_ssid,
        wifi_mac_address: None,
        carrier_name,
        carrier_country,
        is_on_call,
    }
}
