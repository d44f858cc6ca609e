//! Dashboard numbers computed from raw store snapshots.

use crate::device::{DeviceRecord, IpLocation};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Boxes tracked by the selection counters.
pub const TRACKED_ITEMS: usize = 10;
pub const DEVICE_LIST_LIMIT: usize = 100;
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub new_devices: u64,
    pub unique_devices: usize,
    pub today_visits: usize,
}

/// Midnight of `now`'s day in the local timezone, as Unix milliseconds.
pub fn local_midnight_ms(now: DateTime<Utc>) -> i64 {
    let local = now.with_timezone(&Local).date_naive();
    local
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| now.timestamp_millis())
}

/// `new_devices` is the `analytics/newDevices` node, `devices` the whole
/// device registry.
pub fn dashboard_stats(new_devices: Option<&Value>, devices: Option<&Value>, midnight_ms: i64) -> DashboardStats {
    let new_count = new_devices
        .and_then(|v| v.get("count"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut unique = HashSet::new();
    let mut today = HashSet::new();
    for device in children(devices) {
        let Some(id) = device.get("deviceId").and_then(Value::as_str) else {
            continue;
        };
        unique.insert(id);
        let seen = device.get("lastAccess").and_then(Value::as_i64).unwrap_or(0);
        if seen >= midnight_ms {
            today.insert(id);
        }
    }

    DashboardStats {
        new_devices: new_count,
        unique_devices: unique.len(),
        today_visits: today.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCount {
    pub index: usize,
    pub label: String,
    pub count: u64,
}

/// Selection counters for the tracked boxes, most picked first. Ties keep
/// box order.
pub fn item_ranking(selected_items: Option<&Value>) -> Vec<ItemCount> {
    let count_at = |i: usize| -> u64 {
        let raw = match selected_items {
            Some(Value::Array(items)) => items.get(i),
            Some(Value::Object(map)) => map.get(&i.to_string()),
            _ => None,
        };
        raw.and_then(Value::as_u64).unwrap_or(0)
    };

    let mut ranking: Vec<ItemCount> = (0..TRACKED_ITEMS)
        .map(|i| ItemCount {
            index: i,
            label: format!("Item {}", i + 1),
            count: count_at(i),
        })
        .collect();
    ranking.sort_by(|a, b| b.count.cmp(&a.count));
    ranking
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRow {
    pub key: String,
    pub device_id: String,
    pub device_name: String,
    pub ip: String,
    pub location: String,
    pub last_access: Option<i64>,
    pub is_new: bool,
    /// Present only when coordinates are known.
    pub maps_url: Option<String>,
}

/// "City, Region, Country" from whichever parts are present.
pub fn location_text(location: Option<&IpLocation>, ip: &str) -> String {
    match location {
        Some(loc) => {
            let parts: Vec<&str> = [&loc.city, &loc.region, &loc.country]
                .into_iter()
                .map(String::as_str)
                .filter(|p| !p.is_empty() && *p != crate::device::UNKNOWN)
                .collect();
            if parts.is_empty() {
                "Located".to_string()
            } else {
                parts.join(", ")
            }
        }
        None if !ip.is_empty() && ip != crate::device::UNKNOWN => "Pending".to_string(),
        None => "N/A".to_string(),
    }
}

/// Device table rows, most recently seen first.
pub fn device_rows(devices: Option<&Value>) -> Vec<DeviceRow> {
    let Some(Value::Object(map)) = devices else {
        return Vec::new();
    };

    let mut rows: Vec<DeviceRow> = map
        .iter()
        .filter_map(|(key, raw)| {
            let record: DeviceRecord = match serde_json::from_value(raw.clone()) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("[Analytics] Skipping unreadable device {}: {}", key, e);
                    return None;
                }
            };
            let maps_url = record
                .ip_location
                .as_ref()
                .filter(|l| l.latitude != 0.0 && l.longitude != 0.0)
                .map(IpLocation::maps_url);
            Some(DeviceRow {
                key: key.clone(),
                location: location_text(record.ip_location.as_ref(), &record.ip),
                last_access: record.last_access_ms(),
                device_id: record.device_id,
                device_name: record.device_name,
                ip: record.ip,
                is_new: record.is_new,
                maps_url,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.last_access.unwrap_or(0).cmp(&a.last_access.unwrap_or(0)));
    rows.truncate(DEVICE_LIST_LIMIT);
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub key: String,
    pub username: String,
    pub action: String,
    pub timestamp: i64,
}

/// Latest admin log entries, newest first. Entries without a numeric
/// timestamp are skipped.
pub fn recent_activity(logs: Option<&Value>) -> Vec<Activity> {
    let Some(Value::Object(map)) = logs else {
        return Vec::new();
    };

    let mut activity: Vec<Activity> = map
        .iter()
        .filter_map(|(key, entry)| {
            let timestamp = entry.get("timestamp").and_then(Value::as_i64)?;
            let field = |name: &str, fallback: &str| {
                entry
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or(fallback)
                    .to_string()
            };
            Some(Activity {
                key: key.clone(),
                username: field("username", "system"),
                action: field("action", "action"),
                timestamp,
            })
        })
        .collect();

    activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activity.truncate(RECENT_ACTIVITY_LIMIT);
    activity
}

/// Coarse "time ago" label for dashboard rows.
pub fn relative_time(then_ms: Option<i64>, now: DateTime<Utc>) -> String {
    let Some(then_ms) = then_ms.filter(|t| *t > 0) else {
        return "just now".to_string();
    };
    let diff = (now.timestamp_millis() - then_ms).max(0);
    let minutes = diff / 60_000;
    let hours = diff / 3_600_000;
    let days = diff / 86_400_000;

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        format!("{}d ago", days)
    }
}

fn children(node: Option<&Value>) -> Box<dyn Iterator<Item = &Value> + '_> {
    match node {
        Some(Value::Object(map)) => Box::new(map.values()),
        Some(Value::Array(items)) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}
