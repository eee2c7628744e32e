//! Client configuration from environment variables.
//!
//! Nothing here fails: an unparseable value is logged and replaced by its
//! default, and optional keys simply stay `None`.

use std::str::FromStr;
use std::time::Duration;

use iterbene_shared::TransportKind;

use crate::realtime::RealtimeOptions;

pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:8000/socket";
pub const DEFAULT_MAPS_SCRIPT_URL: &str = "https://maps.googleapis.com/maps/api/js";
/// Used only when `ITERBENE_CREDENTIAL_SECRET` is unset.
pub const DEV_CREDENTIAL_SECRET: &str = "iterbene-dev-secret";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub socket_url: String,
    pub realtime: RealtimeOptions,
    pub maps_api_key: Option<String>,
    pub maps_script_url: String,
    pub credential_secret: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            realtime: RealtimeOptions::default(),
            maps_api_key: None,
            maps_script_url: DEFAULT_MAPS_SCRIPT_URL.to_string(),
            credential_secret: DEV_CREDENTIAL_SECRET.to_string(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// Environment variables:
    /// - `ITERBENE_SOCKET_URL`: realtime endpoint (default: `ws://localhost:8000/socket`)
    /// - `ITERBENE_MAPS_API_KEY`: map provider key (optional)
    /// - `ITERBENE_MAPS_SCRIPT_URL`: map provider script URL
    /// - `ITERBENE_CREDENTIAL_SECRET`: secret for encrypting stored credentials
    /// - `ITERBENE_RECONNECTION`: "true" | "false"
    /// - `ITERBENE_RECONNECT_ATTEMPTS`, `ITERBENE_RECONNECT_DELAY_MS`,
    ///   `ITERBENE_RECONNECT_DELAY_MAX_MS`, `ITERBENE_CONNECT_TIMEOUT_MS`
    /// - `ITERBENE_TRANSPORTS`: comma list, e.g. "websocket,polling"
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let mut realtime = defaults.realtime.clone();

        realtime.reconnection = parse_or(
            get("ITERBENE_RECONNECTION"),
            "ITERBENE_RECONNECTION",
            realtime.reconnection,
        );
        realtime.reconnection_attempts = parse_or(
            get("ITERBENE_RECONNECT_ATTEMPTS"),
            "ITERBENE_RECONNECT_ATTEMPTS",
            realtime.reconnection_attempts,
        );
        realtime.reconnection_delay = millis_or(
            get("ITERBENE_RECONNECT_DELAY_MS"),
            "ITERBENE_RECONNECT_DELAY_MS",
            realtime.reconnection_delay,
        );
        realtime.reconnection_delay_max = millis_or(
            get("ITERBENE_RECONNECT_DELAY_MAX_MS"),
            "ITERBENE_RECONNECT_DELAY_MAX_MS",
            realtime.reconnection_delay_max,
        );
        realtime.timeout = millis_or(
            get("ITERBENE_CONNECT_TIMEOUT_MS"),
            "ITERBENE_CONNECT_TIMEOUT_MS",
            realtime.timeout,
        );
        if let Some(raw) = get("ITERBENE_TRANSPORTS") {
            match parse_transports(&raw) {
                Ok(transports) => realtime.transports = transports,
                Err(e) => crate::log_warn!("Ignoring ITERBENE_TRANSPORTS='{}': {}", raw, e),
            }
        }

        let credential_secret = get("ITERBENE_CREDENTIAL_SECRET").unwrap_or_else(|| {
            crate::log_warn!("ITERBENE_CREDENTIAL_SECRET not set, using the development secret");
            defaults.credential_secret.clone()
        });

        Self {
            socket_url: get("ITERBENE_SOCKET_URL").unwrap_or(defaults.socket_url),
            realtime,
            maps_api_key: get("ITERBENE_MAPS_API_KEY"),
            maps_script_url: get("ITERBENE_MAPS_SCRIPT_URL").unwrap_or(defaults.maps_script_url),
            credential_secret,
        }
    }
}

fn parse_or<T: FromStr + Copy>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            crate::log_warn!("Ignoring unparseable {}='{}'", key, raw);
            default
        }),
    }
}

fn millis_or(raw: Option<String>, key: &str, default: Duration) -> Duration {
    let default_ms = default.as_millis() as u64;
    Duration::from_millis(parse_or(raw, key, default_ms))
}

fn parse_transports(raw: &str) -> Result<Vec<TransportKind>, String> {
    let mut transports = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let kind: TransportKind = part.parse()?;
        if !transports.contains(&kind) {
            transports.push(kind);
        }
    }
    if transports.is_empty() {
        return Err("no transports listed".to_string());
    }
    Ok(transports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.socket_url, DEFAULT_SOCKET_URL);
        assert_eq!(config.realtime, RealtimeOptions::default());
        assert_eq!(config.maps_api_key, None);
        assert_eq!(config.credential_secret, DEV_CREDENTIAL_SECRET);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("ITERBENE_SOCKET_URL", "wss://api.iterbene.com/socket"),
            ("ITERBENE_MAPS_API_KEY", "k-123"),
            ("ITERBENE_RECONNECTION", "false"),
            ("ITERBENE_RECONNECT_ATTEMPTS", "9"),
            ("ITERBENE_RECONNECT_DELAY_MS", "250"),
            ("ITERBENE_TRANSPORTS", "polling, websocket, polling"),
        ]);
        assert_eq!(config.socket_url, "wss://api.iterbene.com/socket");
        assert_eq!(config.maps_api_key.as_deref(), Some("k-123"));
        assert!(!config.realtime.reconnection);
        assert_eq!(config.realtime.reconnection_attempts, 9);
        assert_eq!(config.realtime.reconnection_delay, Duration::from_millis(250));
        assert_eq!(
            config.realtime.transports,
            vec![TransportKind::Polling, TransportKind::WebSocket]
        );
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config_from(&[
            ("ITERBENE_RECONNECT_ATTEMPTS", "lots"),
            ("ITERBENE_TRANSPORTS", "smoke-signals"),
            ("ITERBENE_MAPS_API_KEY", "   "),
        ]);
        assert_eq!(config.realtime.reconnection_attempts, 5);
        assert_eq!(config.realtime.transports, RealtimeOptions::default().transports);
        assert_eq!(config.maps_api_key, None);
    }
}
