//! Configuration
//!
//! Session and server settings loaded from environment variables, falling
//! back to defaults for anything unset.

use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::lobby::session::SessionConfig;
use crate::network::server::ServerConfig;

/// Number of teams (2 or 3).
pub const ENV_NUM_TEAMS: &str = "JOUST_NUM_TEAMS";
/// Countdown length in seconds.
pub const ENV_COUNTDOWN_SECS: &str = "JOUST_COUNTDOWN_SECS";
/// Spawn offset from the arena center.
pub const ENV_SPAWN_OFFSET: &str = "JOUST_SPAWN_OFFSET";
/// Gateway bind address.
pub const ENV_BIND_ADDR: &str = "JOUST_BIND_ADDR";
/// Gateway connection limit.
pub const ENV_MAX_CONNECTIONS: &str = "JOUST_MAX_CONNECTIONS";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Full application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Lobby session settings.
    pub session: SessionConfig,
    /// Gateway server settings.
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load using `lookup` to resolve variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(teams) = parse_var(&lookup, ENV_NUM_TEAMS)? {
            config.session.num_teams = teams;
        }
        if let Some(secs) = parse_var(&lookup, ENV_COUNTDOWN_SECS)? {
            config.session.countdown_time = secs;
        }
        if let Some(offset) = parse_var(&lookup, ENV_SPAWN_OFFSET)? {
            config.session.spawn_offset = offset;
        }
        if let Some(addr) = parse_var(&lookup, ENV_BIND_ADDR)? {
            config.server.bind_addr = addr;
        }
        if let Some(max) = parse_var(&lookup, ENV_MAX_CONNECTIONS)? {
            config.server.max_connections = max;
        }

        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.session.num_teams, 2);
        assert_eq!(config.session.countdown_time, 3);
        assert_eq!(config.server.bind_addr.port(), 8080);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_NUM_TEAMS, "3"),
            (ENV_COUNTDOWN_SECS, " 5 "),
            (ENV_BIND_ADDR, "127.0.0.1:9000"),
            (ENV_MAX_CONNECTIONS, "8"),
        ]))
        .unwrap();

        assert_eq!(config.session.num_teams, 3);
        assert_eq!(config.session.countdown_time, 5);
        assert_eq!(config.server.bind_addr.port(), 9000);
        assert_eq!(config.server.max_connections, 8);
    }

    #[test]
    fn test_invalid_value() {
        let result = AppConfig::from_lookup(lookup_from(&[(ENV_COUNTDOWN_SECS, "soon")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidValue {
                name: ENV_COUNTDOWN_SECS,
                value: "soon".to_string(),
            }
        );
    }
}
