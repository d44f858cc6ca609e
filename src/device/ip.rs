use super::config::{IpFormat, IpProvider};
use super::{LookupError, UNKNOWN};
use reqwest::Client;
use serde_json::Value;
use std::net::IpAddr;
use std::time::Duration;

/// True for a bare IPv4 or IPv6 address.
pub fn is_valid_ip(candidate: &str) -> bool {
    candidate.parse::<IpAddr>().is_ok()
}

/// Public IP discovery over an ordered list of echo services.
pub struct IpResolver {
    client: Client,
    providers: Vec<IpProvider>,
}

impl IpResolver {
    pub fn new(providers: Vec<IpProvider>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            providers,
        }
    }

    pub fn providers(&self) -> &[IpProvider] {
        &self.providers
    }

    /// Ask one provider. The answer must parse as an IP address.
    pub async fn query(&self, provider: &IpProvider) -> Result<String, LookupError> {
        let accept = match provider.format {
            IpFormat::Json { .. } => "application/json",
            IpFormat::Text => "text/plain",
        };
        let response = self
            .client
            .get(&provider.url)
            .header("Accept", accept)
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| LookupError::Request {
                provider: provider.name.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                provider: provider.name.clone(),
                status: status.as_u16(),
            });
        }

        let raw = match &provider.format {
            IpFormat::Json { field } => {
                let body: Value = response.json().await.map_err(|e| LookupError::InvalidResponse {
                    provider: provider.name.clone(),
                    reason: e.to_string(),
                })?;
                match body.get(field) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                }
            }
            IpFormat::Text => response.text().await.map_err(|e| LookupError::Request {
                provider: provider.name.clone(),
                message: e.to_string(),
            })?,
        };

        let ip = raw.trim();
        if is_valid_ip(ip) {
            Ok(ip.to_string())
        } else {
            Err(LookupError::InvalidResponse {
                provider: provider.name.clone(),
                reason: format!("not an IP address: {:?}", ip),
            })
        }
    }

    /// First valid address from the provider list.
    pub async fn resolve(&self) -> Result<String, LookupError> {
        for provider in &self.providers {
            match self.query(provider).await {
                Ok(ip) => {
                    tracing::debug!("[IpResolver] Got {} from {}", ip, provider.name);
                    return Ok(ip);
                }
                Err(e) => tracing::warn!("[IpResolver] {}", e),
            }
        }
        Err(LookupError::NetworkLookupFailed("ip".to_string()))
    }

    /// Like [`resolve`](Self::resolve) but degrades to the `"unknown"` placeholder.
    pub async fn resolve_or_unknown(&self) -> String {
        match self.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!("[IpResolver] {}", e);
                UNKNOWN.to_string()
            }
        }
    }
}
