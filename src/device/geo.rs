use super::config::{LocationApi, LocationProvider};
use super::{LookupError, UNKNOWN};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Coarse location of an IP address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpLocation {
    pub ip: String,
    pub country: String,
    pub country_code: String,
    pub region: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub isp: String,
    pub address: String,
}

impl IpLocation {
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}&z=15",
            self.latitude, self.longitude
        )
    }
}

fn text(data: &Value, pointer: &str) -> Option<String> {
    data.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn coordinate(data: &Value, key: &str) -> Option<f64> {
    match data.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

fn address(parts: [&Option<String>; 3]) -> String {
    parts
        .iter()
        .filter_map(|p| p.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Map one API's response body onto [`IpLocation`]. `None` when the API
/// reported failure or left out the coordinates.
pub fn parse_location(api: LocationApi, ip: &str, data: &Value) -> Option<IpLocation> {
    let (failed, country, code, region, timezone, isp, lat_key, lon_key) = match api {
        LocationApi::IpapiCo => (
            truthy(data.get("error")),
            text(data, "/country_name"),
            text(data, "/country_code"),
            text(data, "/region"),
            text(data, "/timezone"),
            text(data, "/org"),
            "latitude",
            "longitude",
        ),
        LocationApi::IpApiCom => (
            data.get("status").and_then(Value::as_str) == Some("fail"),
            text(data, "/country"),
            text(data, "/countryCode"),
            text(data, "/regionName"),
            text(data, "/timezone"),
            text(data, "/isp"),
            "lat",
            "lon",
        ),
        LocationApi::IpWhoIs => (
            data.get("success") == Some(&Value::Bool(false)),
            text(data, "/country"),
            text(data, "/country_code"),
            text(data, "/region"),
            text(data, "/timezone/id"),
            text(data, "/connection/isp"),
            "latitude",
            "longitude",
        ),
        LocationApi::IpApiIo => (
            truthy(data.get("error")),
            text(data, "/country_name"),
            text(data, "/country_code"),
            text(data, "/region_name"),
            text(data, "/time_zone/name"),
            text(data, "/organization"),
            "latitude",
            "longitude",
        ),
    };
    if failed {
        return None;
    }

    let latitude = coordinate(data, lat_key)?;
    let longitude = coordinate(data, lon_key)?;
    let city = text(data, "/city");
    let unknown = || UNKNOWN.to_string();

    Some(IpLocation {
        ip: ip.to_string(),
        address: address([&city, &region, &country]),
        country: country.unwrap_or_else(unknown),
        country_code: code.unwrap_or_default(),
        region: region.unwrap_or_else(unknown),
        city: city.unwrap_or_else(unknown),
        latitude,
        longitude,
        timezone: timezone.unwrap_or_else(unknown),
        isp: isp.unwrap_or_else(unknown),
    })
}

/// IP geolocation over an ordered list of APIs.
pub struct LocationResolver {
    client: Client,
    providers: Vec<LocationProvider>,
}

impl LocationResolver {
    pub fn new(providers: Vec<LocationProvider>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            providers,
        }
    }

    pub async fn query(&self, provider: &LocationProvider, ip: &str) -> Result<IpLocation, LookupError> {
        let name = provider.api.name().to_string();
        let response = self
            .client
            .get(provider.url(ip))
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| LookupError::Request {
                provider: name.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                provider: name,
                status: status.as_u16(),
            });
        }

        let data: Value = response.json().await.map_err(|e| LookupError::InvalidResponse {
            provider: name.clone(),
            reason: e.to_string(),
        })?;
        parse_location(provider.api, ip, &data).ok_or(LookupError::InvalidResponse {
            provider: name,
            reason: "no coordinates".to_string(),
        })
    }

    /// First location with coordinates. Unknown or invalid IPs fail fast.
    pub async fn locate(&self, ip: &str) -> Result<IpLocation, LookupError> {
        if ip.is_empty() || ip == UNKNOWN {
            return Err(LookupError::NetworkLookupFailed("location".to_string()));
        }
        for provider in &self.providers {
            match self.query(provider, ip).await {
                Ok(location) => {
                    tracing::debug!(
                        "[LocationResolver] {} located via {}: {}",
                        ip,
                        provider.api.name(),
                        location.address
                    );
                    return Ok(location);
                }
                Err(e) => tracing::warn!("[LocationResolver] {}", e),
            }
        }
        Err(LookupError::NetworkLookupFailed("location".to_string()))
    }
}
