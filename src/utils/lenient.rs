//! Field deserializers for documents edited by hand in the realtime store.
//!
//! Numbers may arrive as `80`, `"80"` or `"80px"`, and a stray `null` or
//! typo in one field should cost that field only, never the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Numeric value of `12`, `"12"`, `"12.5"` or `"12px"`.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches("px").trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn whole(value: &Value) -> Option<u64> {
    number(value)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as u64)
}

/// `Option<u32>` field; null or unreadable values become `None`.
pub fn opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(whole(&raw).and_then(|n| u32::try_from(n).ok()))
}

/// `Option<u64>` field; null or unreadable values become `None`.
pub fn opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(whole(&raw))
}

/// Required `u32`; accepts numeric strings but rejects anything else.
pub fn u32_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    whole(&raw)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| serde::de::Error::custom(format!("expected a whole number, got {}", raw)))
}

/// `true`/`false`, or their string spellings.
pub fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Nested section that drops to `None` when it cannot be read. Null fields
/// count as absent, so they take the section's defaults.
pub fn section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    let err = match serde_json::from_value(raw.clone()) {
        Ok(section) => return Ok(Some(section)),
        Err(e) => e,
    };
    if let Value::Object(mut fields) = raw {
        fields.retain(|_, v| !v.is_null());
        if let Ok(section) = serde_json::from_value(Value::Object(fields)) {
            return Ok(Some(section));
        }
    }
    tracing::warn!(
        "[Layout] Ignoring unreadable {} section: {}",
        std::any::type_name::<T>().rsplit("::").next().unwrap_or("layout"),
        err
    );
    Ok(None)
}
