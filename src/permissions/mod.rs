//! Permission-gated capabilities
//!
//! A [`Capability`] is a single platform permission that unlocks richer data
//! (precise location, telephony state, Wi-Fi details). The [`PermissionGate`]
//! classifies a requested set against the host's authorization store and
//! drives the one-shot permission request flow.
//!
//! # Classification
//!
//! ```text
//! requested ──▶ classify() ──┬─▶ granted
//!                            ├─▶ denied              (may be asked again)
//!                            └─▶ permanently denied  (only system settings can fix it)
//! ```
//!
//! Every requested capability lands in exactly one of the three sets.

mod gate;
mod remediation;

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gate::{PermissionGate, StaticPermissionGate};
pub use remediation::{describe_capabilities, RemediationChoice, SettingsPrompt};

/// A platform-gated permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Precise location
    FineLocation,
    /// Approximate location
    CoarseLocation,
    /// Telephony state (call state, hardware identifiers)
    PhoneState,
    /// Wi-Fi connection details
    WifiState,
}

impl Capability {
    /// All known capabilities, in stable order
    pub const ALL: [Capability; 4] = [
        Self::FineLocation,
        Self::CoarseLocation,
        Self::PhoneState,
        Self::WifiState,
    ];

    /// Platform permission identifier
    pub fn platform_name(&self) -> &'static str {
        match self {
            Self::FineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Self::CoarseLocation => "android.permission.ACCESS_COARSE_LOCATION",
            Self::PhoneState => "android.permission.READ_PHONE_STATE",
            Self::WifiState => "android.permission.ACCESS_WIFI_STATE",
        }
    }

    /// Short label shown to users
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FineLocation | Self::CoarseLocation => "Location",
            Self::PhoneState => "Phone",
            Self::WifiState => "Wi-Fi",
        }
    }

    /// Config/CLI spelling
    pub fn key(&self) -> &'static str {
        match self {
            Self::FineLocation => "fine-location",
            Self::CoarseLocation => "coarse-location",
            Self::PhoneState => "phone-state",
            Self::WifiState => "wifi-state",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Unknown capability name in config or on the command line
#[derive(Debug, Error)]
#[error("Unknown capability: {0}")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Capability::ALL
            .into_iter()
            .find(|c| c.key() == normalized || c.platform_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// Ordered, duplicate-free set of capabilities
pub type CapabilitySet = BTreeSet<Capability>;

/// Current grant state of one capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantState {
    Granted,
    /// Not granted, the platform will still show the request dialog
    Denied,
    /// Not granted, the platform will no longer ask
    PermanentlyDenied,
}

impl GrantState {
    /// Map the platform's two signals onto a grant state.
    ///
    /// A denied capability for which the platform says no rationale should be
    /// shown anymore is permanently denied.
    pub fn from_platform(granted: bool, should_show_rationale: bool) -> Self {
        match (granted, should_show_rationale) {
            (true, _) => Self::Granted,
            (false, true) => Self::Denied,
            (false, false) => Self::PermanentlyDenied,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Result of classifying a requested capability set
///
/// The three sets are disjoint and their union is the requested set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionClassification {
    pub granted: CapabilitySet,
    pub denied: CapabilitySet,
    pub permanently_denied: CapabilitySet,
}

impl PermissionClassification {
    /// Build a classification by querying `state_of` once per requested capability
    pub fn from_states<'a>(
        requested: impl IntoIterator<Item = &'a Capability>,
        mut state_of: impl FnMut(Capability) -> GrantState,
    ) -> Self {
        let mut out = Self::default();
        for &capability in requested {
            out.insert(capability, state_of(capability));
        }
        out
    }

    /// Place `capability` in the set matching `state`, removing it from the others
    pub fn insert(&mut self, capability: Capability, state: GrantState) {
        self.granted.remove(&capability);
        self.denied.remove(&capability);
        self.permanently_denied.remove(&capability);
        match state {
            GrantState::Granted => self.granted.insert(capability),
            GrantState::Denied => self.denied.insert(capability),
            GrantState::PermanentlyDenied => self.permanently_denied.insert(capability),
        };
    }

    pub fn is_all_granted(&self) -> bool {
        self.denied.is_empty() && self.permanently_denied.is_empty()
    }

    /// Capabilities that still need a grant (denied ∪ permanently denied)
    pub fn missing(&self) -> CapabilitySet {
        self.denied
            .union(&self.permanently_denied)
            .copied()
            .collect()
    }

    /// Every capability this classification covers
    pub fn requested(&self) -> CapabilitySet {
        self.granted
            .iter()
            .chain(&self.denied)
            .chain(&self.permanently_denied)
            .copied()
            .collect()
    }

    pub fn state_of(&self, capability: Capability) -> Option<GrantState> {
        if self.granted.contains(&capability) {
            Some(GrantState::Granted)
        } else if self.denied.contains(&capability) {
            Some(GrantState::Denied)
        } else if self.permanently_denied.contains(&capability) {
            Some(GrantState::PermanentlyDenied)
        } else {
            None
        }
    }
}
