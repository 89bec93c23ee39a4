//! Service endpoint configuration.

use std::time::Duration;

/// Base URLs for the three remote services the viewer consumes.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HydroShare REST API root.
    pub hydroshare_url: String,
    /// GeoServer root (WMS/WFS and the statistics extension).
    pub geoserver_url: String,
    /// Data service root for timeseries values.
    pub hydroserver_url: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hydroshare_url: "https://www.hydroshare.org".to_string(),
            geoserver_url: "https://geoserver.hydroshare.org/geoserver".to_string(),
            hydroserver_url: "https://geoserver.hydroshare.org/wds".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Read overrides from the environment (`HYDROSHARE_URL`,
    /// `GEOSERVER_URL`, `HYDROSERVER_URL`), loading a `.env` file if
    /// one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        Self {
            hydroshare_url: env_or("HYDROSHARE_URL", defaults.hydroshare_url),
            geoserver_url: env_or("GEOSERVER_URL", defaults.geoserver_url),
            hydroserver_url: env_or("HYDROSERVER_URL", defaults.hydroserver_url),
            request_timeout: defaults.request_timeout,
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or(default)
}
