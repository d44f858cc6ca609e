pub mod config;
pub mod geo;
pub mod ip;
pub mod registry;
pub mod user_agent;

pub use config::{DeviceConfig, IpFormat, IpProvider, LocationApi, LocationProvider};
pub use geo::{IpLocation, LocationResolver};
pub use ip::{is_valid_ip, IpResolver};
pub use registry::{
    generate_device_id, load_or_create_device_id, ClientEnvironment, DeviceRecord, DeviceRegistry,
};
pub use user_agent::{classify, DeviceKind};

/// Placeholder stored when a lookup could not produce a value.
pub const UNKNOWN: &str = "unknown";

// ── Error Types ────────────────────────────────────────

/// Failures of the third-party HTTP lookups (IP, location, player profile).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("{provider}: request failed: {message}")]
    Request { provider: String, message: String },
    #[error("{provider}: HTTP {status}")]
    Status { provider: String, status: u16 },
    #[error("{provider}: unusable response: {reason}")]
    InvalidResponse { provider: String, reason: String },
    /// Every provider in the list failed.
    #[error("{0} lookup failed on every provider")]
    NetworkLookupFailed(String),
    #[error("invalid player id: {0}")]
    InvalidPlayerId(String),
}
