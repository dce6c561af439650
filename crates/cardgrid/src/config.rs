//! Server configuration, with environment overrides.

use std::str::FromStr;
use std::time::Duration;

use cardgrid_room::RoomConfig;
use cardgrid_session::SessionConfig;

/// Listen address used when `CARDGRID_BIND` is unset.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Everything needed to run a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    pub room: RoomConfig,
    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            room: RoomConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// An environment variable held a value that could not be used.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl ServerConfig {
    /// Defaults overridden by the process environment.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `CARDGRID_BIND` | `bind_addr` |
    /// | `CARDGRID_IDLE_TIMEOUT_MINS` | `room.idle_timeout` |
    /// | `CARDGRID_REAP_INTERVAL_MINS` | `room.reap_interval` |
    /// | `CARDGRID_START_DELAY_MS` | `room.start_delay` |
    /// | `CARDGRID_OUTBOUND_CAPACITY` | `session.outbound_capacity` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("CARDGRID_BIND") {
            config.bind_addr = bind;
        }
        if let Some(timeout) = parse_minutes(&lookup, "CARDGRID_IDLE_TIMEOUT_MINS")? {
            config.room.idle_timeout = timeout;
        }
        if let Some(interval) = parse_minutes(&lookup, "CARDGRID_REAP_INTERVAL_MINS")? {
            if interval.is_zero() {
                return Err(ConfigError {
                    var: "CARDGRID_REAP_INTERVAL_MINS",
                    value: "0".into(),
                    reason: "must be at least 1".into(),
                });
            }
            config.room.reap_interval = interval;
        }
        if let Some(ms) = parse::<u64>(&lookup, "CARDGRID_START_DELAY_MS")? {
            config.room.start_delay = Duration::from_millis(ms);
        }
        if let Some(capacity) = parse::<usize>(&lookup, "CARDGRID_OUTBOUND_CAPACITY")? {
            if capacity == 0 {
                return Err(ConfigError {
                    var: "CARDGRID_OUTBOUND_CAPACITY",
                    value: capacity.to_string(),
                    reason: "must be at least 1".into(),
                });
            }
            config.session.outbound_capacity = capacity;
        }

        Ok(config)
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e: T::Err| ConfigError {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// A whole number of minutes, rejected if it does not fit in seconds.
fn parse_minutes(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(mins) = parse::<u64>(lookup, var)? else {
        return Ok(None);
    };
    let secs = mins.checked_mul(60).ok_or_else(|| ConfigError {
        var,
        value: mins.to_string(),
        reason: "too many minutes".into(),
    })?;
    Ok(Some(Duration::from_secs(secs)))
}
