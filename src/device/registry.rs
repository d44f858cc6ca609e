//! One record per browser under `devices/{deviceId}`, refreshed each session.

use super::geo::{IpLocation, LocationResolver};
use super::ip::IpResolver;
use super::user_agent::classify;
use super::{DeviceConfig, UNKNOWN};
use crate::config::{read_json_file, save_json_config};
use crate::store::{device_path, StoreError, ThemeStore, NEW_DEVICES_COUNT_PATH, NEW_DEVICES_UPDATED_PATH};
use chrono::{DateTime, FixedOffset, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEVICE_ID_FILE: &str = "device_id.json";
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
/// Registration times are shown in Brasília time.
const REGISTRATION_UTC_OFFSET_SECS: i32 = -3 * 3600;

/// What the host page knows about the browser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvironment {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub device_brand: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub screen_width: u32,
    #[serde(default)]
    pub screen_height: u32,
    /// First-seen time; a server timestamp sentinel until the store resolves it.
    #[serde(default)]
    pub timestamp: Value,
    /// Human-readable first-seen time.
    #[serde(default)]
    pub registered_at: String,
    #[serde(default)]
    pub last_access: Value,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default = "unknown_ip")]
    pub ip: String,
    #[serde(default, deserialize_with = "lenient_location")]
    pub ip_location: Option<IpLocation>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn unknown_ip() -> String {
    UNKNOWN.to_string()
}

/// A partial location (no coordinates) counts as none, so it gets looked up again.
fn lenient_location<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<IpLocation>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

impl DeviceRecord {
    pub fn last_access_ms(&self) -> Option<i64> {
        self.last_access.as_i64()
    }

    fn needs_lookup(&self) -> bool {
        self.ip.is_empty() || self.ip == UNKNOWN || self.ip_location.is_none()
    }
}

/// `device_<millis>_<9 base36 chars>`.
pub fn generate_device_id<R: Rng + ?Sized>(now_ms: i64, rng: &mut R) -> String {
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("device_{}_{}", now_ms, suffix)
}

/// Read the persisted device id from `dir`, creating and saving one if absent.
pub fn load_or_create_device_id(dir: &Path) -> Result<String, String> {
    let path = dir.join(DEVICE_ID_FILE);
    if let Some(id) = read_json_file::<String>(&path, "DeviceRegistry") {
        if !id.is_empty() {
            return Ok(id);
        }
    }
    let id = generate_device_id(Utc::now().timestamp_millis(), &mut rand::thread_rng());
    save_json_config(&path, &id, "DeviceRegistry")?;
    tracing::info!("[DeviceRegistry] New device id {}", id);
    Ok(id)
}

fn registration_time(now: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(REGISTRATION_UTC_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).format("%d/%m/%Y %H:%M:%S").to_string(),
        None => now.format("%d/%m/%Y %H:%M:%S").to_string(),
    }
}

pub struct DeviceRegistry {
    store: Arc<dyn ThemeStore>,
    ip: IpResolver,
    geo: LocationResolver,
    retry_delay: Duration,
}

impl DeviceRegistry {
    pub fn new(store: Arc<dyn ThemeStore>, config: &DeviceConfig) -> Self {
        Self {
            store,
            ip: IpResolver::new(
                config.ip_providers.clone(),
                Duration::from_secs(config.ip_timeout_secs),
            ),
            geo: LocationResolver::new(
                config.location_providers.clone(),
                Duration::from_secs(config.location_timeout_secs),
            ),
            retry_delay: Duration::from_millis(config.location_retry_delay_ms),
        }
    }

    /// Resolve IP and location, retrying the location lookup once.
    async fn lookup_network(&self) -> (String, Option<IpLocation>) {
        let ip = self.ip.resolve_or_unknown().await;
        if ip == UNKNOWN {
            return (ip, None);
        }
        match self.geo.locate(&ip).await {
            Ok(location) => (ip, Some(location)),
            Err(first) => {
                tracing::warn!(
                    "[DeviceRegistry] {}, retrying in {:?}",
                    first,
                    self.retry_delay
                );
                tokio::time::sleep(self.retry_delay).await;
                let location = self.geo.locate(&ip).await.ok();
                (ip, location)
            }
        }
    }

    /// Write this session's device record. Network lookups only run when the
    /// stored record lacks an IP or location; their failure is not an error.
    pub async fn register(
        &self,
        device_id: &str,
        env: &ClientEnvironment,
    ) -> Result<DeviceRecord, StoreError> {
        let path = device_path(device_id);
        let stored = self.store.get(&path).await?;
        let is_new = stored.is_none();
        let existing: Option<DeviceRecord> = stored.and_then(|raw| match serde_json::from_value(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("[DeviceRegistry] Stored record for {} unreadable: {}", device_id, e);
                None
            }
        });

        let (ip, ip_location) = match &existing {
            Some(record) if !record.needs_lookup() => (record.ip.clone(), record.ip_location.clone()),
            _ => self.lookup_network().await,
        };

        let kind = classify(&env.user_agent);
        let now = self.store.server_timestamp();
        let record = DeviceRecord {
            device_id: device_id.to_string(),
            device_name: kind.name,
            device_brand: kind.brand,
            platform: env.platform.clone(),
            user_agent: env.user_agent.clone(),
            language: env.language.clone(),
            screen_width: env.screen_width,
            screen_height: env.screen_height,
            timestamp: existing
                .as_ref()
                .map(|r| r.timestamp.clone())
                .filter(|t| !t.is_null())
                .unwrap_or_else(|| now.clone()),
            registered_at: existing
                .as_ref()
                .map(|r| r.registered_at.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| registration_time(Utc::now())),
            last_access: now.clone(),
            is_new,
            ip,
            ip_location,
            extra: existing.map(|r| r.extra).unwrap_or_default(),
        };

        let raw = serde_json::to_value(&record).map_err(|e| StoreError::Payload(e.to_string()))?;
        self.store.set(&path, raw).await?;

        if is_new {
            self.store.increment(NEW_DEVICES_COUNT_PATH, 1).await?;
            self.store.set(NEW_DEVICES_UPDATED_PATH, now).await?;
        }
        tracing::info!(
            "[DeviceRegistry] Registered {} (new: {}, ip: {}, located: {})",
            device_id,
            is_new,
            record.ip,
            record.ip_location.is_some()
        );
        Ok(record)
    }
}
