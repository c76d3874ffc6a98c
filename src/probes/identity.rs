//! Identifiers: persisted install UUIDs, per-process session id, derived hashes

use std::sync::OnceLock;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{sha256_hex, ProbeContext};
use crate::platform::KeyValueStore;

const KEY_APP_GUID: &str = "app_guid";
const KEY_TRUE_DEVICE_ID: &str = "true_device_id";
const KEY_APP_INSTANCE: &str = "app_instance_id";

static SESSION_ID: OnceLock<String> = OnceLock::new();

/// Random id shared by every pass in this process
pub fn session_id() -> &'static str {
    SESSION_ID.get_or_init(|| Uuid::new_v4().to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityFacts {
    pub android_id: Option<String>,
    pub app_instance_id: String,
    pub app_guid: String,
    pub device_hash: String,
    /// Needs vendor services; never reported
    pub gsf_id: Option<String>,
    pub session_id: String,
    pub true_device_id: String,
}

/// Stored UUID under `key`, created and saved on first use
///
/// A store fault yields a fresh UUID that is not persisted.
pub fn get_or_create(store: Option<&dyn KeyValueStore>, key: &str) -> String {
    let Some(store) = store else {
        return Uuid::new_v4().to_string();
    };

    match store.get(key) {
        Ok(Some(existing)) if !existing.trim().is_empty() => existing,
        Ok(_) => {
            let fresh = Uuid::new_v4().to_string();
            if let Err(e) = store.put(key, &fresh) {
                warn!("Could not persist {key}: {e}");
            }
            fresh
        }
        Err(e) => {
            debug!("Store read for {key} failed: {e}");
            Uuid::new_v4().to_string()
        }
    }
}

pub fn collect(ctx: &mut ProbeContext<'_>) -> IdentityFacts {
    let platform = ctx.platform;
    let build = &ctx.build;
    let store = platform.store();

    let android_id = ctx
        .faults
        .read("android_id", platform.platform_device_id())
        .flatten();

    let instance_uuid = get_or_create(store, KEY_APP_INSTANCE);
    let app_instance_id = sha256_hex(&format!(
        "{}:{}:{}:{}",
        android_id.as_deref().unwrap_or("unknown"),
        instance_uuid,
        build.manufacturer,
        build.model
    ));

    let device_hash = sha256_hex(
        &[
            Some(build.manufacturer.as_str()),
            Some(build.model.as_str()),
            Some(build.device.as_str()),
            android_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("|"),
    );

    IdentityFacts {
        app_guid: get_or_create(store, KEY_APP_GUID),
        true_device_id: get_or_create(store, KEY_TRUE_DEVICE_ID),
        app_instance_id,
        device_hash,
        android_id,
        gsf_id: None,
        session_id: session_id().to_string(),
    }
}
