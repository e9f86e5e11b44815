use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one shipper instance.
///
/// The host application owns loading (file, env, whatever it uses); this
/// struct only defines the shape. Durations accept humantime strings
/// ("7s", "500ms") when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipperConfig {
    /// Base URL of the remote log-stream service.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Remote container (log group) all streams are created under.
    pub container: String,
    /// Prefix of the daily stream names.
    pub stream_prefix: String,
    #[serde(default = "default_flush_interval", with = "humantime_serde")]
    pub flush_interval: Duration,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Override for the instance-metadata endpoint; `None` uses the default.
    #[serde(default)]
    pub metadata_url: Option<String>,
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(7)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}
