use serde::{Deserialize, Serialize};

/// How an IP echo service formats its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpFormat {
    /// JSON object; the address is under `field`.
    Json { field: String },
    /// Bare address in the body.
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpProvider {
    pub name: String,
    pub url: String,
    pub format: IpFormat,
}

impl IpProvider {
    pub fn json(name: &str, url: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            format: IpFormat::Json {
                field: field.to_string(),
            },
        }
    }

    pub fn text(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            format: IpFormat::Text,
        }
    }
}

/// Supported IP geolocation APIs. Each has its own URL shape and field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationApi {
    IpapiCo,
    IpApiCom,
    IpWhoIs,
    IpApiIo,
}

impl LocationApi {
    pub fn name(&self) -> &'static str {
        match self {
            LocationApi::IpapiCo => "ipapi.co",
            LocationApi::IpApiCom => "ip-api.com",
            LocationApi::IpWhoIs => "ipwho.is",
            LocationApi::IpApiIo => "ip-api.io",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LocationApi::IpapiCo => "https://ipapi.co",
            LocationApi::IpApiCom => "https://ip-api.com",
            LocationApi::IpWhoIs => "https://ipwho.is",
            LocationApi::IpApiIo => "https://ip-api.io",
        }
    }

    /// Lookup URL for `ip` under `base_url`.
    pub fn url(&self, base_url: &str, ip: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            LocationApi::IpapiCo => format!("{}/{}/json/", base, ip),
            LocationApi::IpApiCom => format!(
                "{}/json/{}?fields=status,country,countryCode,region,regionName,city,lat,lon,timezone,isp,query",
                base, ip
            ),
            LocationApi::IpWhoIs => format!("{}/{}", base, ip),
            LocationApi::IpApiIo => format!("{}/json/{}", base, ip),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationProvider {
    pub api: LocationApi,
    /// Overrides the API's public host (self-hosted mirrors, tests).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl LocationProvider {
    pub fn new(api: LocationApi) -> Self {
        Self { api, base_url: None }
    }

    pub fn with_base_url(api: LocationApi, base_url: impl Into<String>) -> Self {
        Self {
            api,
            base_url: Some(base_url.into()),
        }
    }

    pub fn url(&self, ip: &str) -> String {
        let base = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.api.default_base_url());
        self.api.url(base, ip)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Tried in order; first valid address wins.
    pub ip_providers: Vec<IpProvider>,
    pub ip_timeout_secs: u64,
    /// Tried in order; first result with coordinates wins.
    pub location_providers: Vec<LocationProvider>,
    pub location_timeout_secs: u64,
    /// Wait before the single retry of a failed location lookup.
    pub location_retry_delay_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ip_providers: vec![
                IpProvider::json("ipify.org", "https://api.ipify.org?format=json", "ip"),
                IpProvider::json("api64.ipify.org", "https://api64.ipify.org?format=json", "ip"),
                IpProvider::text("ipapi.co", "https://ipapi.co/ip/"),
                IpProvider::json("httpbin.org", "https://httpbin.org/ip", "origin"),
                IpProvider::json("ipwho.is", "https://ipwho.is/", "ip"),
            ],
            ip_timeout_secs: 5,
            location_providers: vec![
                LocationProvider::new(LocationApi::IpapiCo),
                LocationProvider::new(LocationApi::IpApiCom),
                LocationProvider::new(LocationApi::IpWhoIs),
                LocationProvider::new(LocationApi::IpApiIo),
            ],
            location_timeout_secs: 8,
            location_retry_delay_ms: 2000,
        }
    }
}
