use chrono_tz::Tz;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::series::AppendPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    // FIWARE STH API
    pub sth_host: String,
    pub sth_port: u16,
    pub fiware_service: String,
    pub fiware_servicepath: String,

    // Polling
    pub poll_interval_ms: u64,
    pub poll_last_n: u32,
    pub local_timezone: Tz,

    // Series buffers
    pub series_deduplicate: bool,
    pub series_max_points: usize,

    // Sensor entities
    pub luminosity_entity_type: String,
    pub luminosity_entity_id: String,
    pub dht_entity_type: String,
    pub dht_entity_id: String,

    // Dashboard server
    pub dashboard_host: String,
    pub dashboard_port: u16,

    // Rate limiting
    pub disable_rate_limiting: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sth_host: "localhost".to_string(),
            sth_port: 8666,
            fiware_service: "smart".to_string(),
            fiware_servicepath: "/".to_string(),

            poll_interval_ms: 10_000,
            poll_last_n: 10,
            local_timezone: chrono_tz::America::Sao_Paulo,

            series_deduplicate: false,
            series_max_points: 0,

            luminosity_entity_type: "Lamp".to_string(),
            luminosity_entity_id: "urn:ngsi-ld:Lamp:003".to_string(),
            dht_entity_type: "DHTSensor".to_string(),
            dht_entity_id: "urn:ngsi-ld:DHT:001".to_string(),

            dashboard_host: "0.0.0.0".to_string(),
            dashboard_port: 8050,

            disable_rate_limiting: false,
            rate_limit_per_second: 10,
            rate_limit_burst: 60,
        }
    }
}

/// Reads settings through a key lookup, so tests can supply a map instead of
/// the process environment.
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn string(&self, key: &str, default: String) -> String {
        (self.lookup)(key).unwrap_or(default)
    }

    /// Unset keeps `default`; set but unparseable is an error.
    fn parse<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        let Some(raw) = (self.lookup)(key) else {
            return Ok(default);
        };
        let parsed = raw.trim().parse::<T>();
        parsed.map_err(|_| ConfigError::Invalid { var: key, value: raw })
    }

    fn positive<T: FromStr + PartialEq + Default>(
        &self,
        key: &'static str,
        default: T,
    ) -> Result<T, ConfigError> {
        let value = self.parse(key, default)?;
        if value == T::default() {
            return Err(ConfigError::Invalid {
                var: key,
                value: (self.lookup)(key).unwrap_or_default(),
            });
        }
        Ok(value)
    }

    fn flag(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = (self.lookup)(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { var: key, value: raw }),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present).
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unset keys take their default. A key that is set must parse.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `STH_HOST` is not set, and
    /// `ConfigError::Invalid` for a value that does not parse, an unknown
    /// timezone, or a zero `POLL_INTERVAL_MS` / `POLL_LAST_N`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };
        let defaults = Self::default();

        Ok(Self {
            // FIWARE STH API
            sth_host: (vars.lookup)("STH_HOST").ok_or(ConfigError::Missing("STH_HOST"))?,
            sth_port: vars.parse("STH_PORT", defaults.sth_port)?,
            fiware_service: vars.string("FIWARE_SERVICE", defaults.fiware_service),
            fiware_servicepath: vars.string("FIWARE_SERVICEPATH", defaults.fiware_servicepath),

            // Polling
            poll_interval_ms: vars.positive("POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
            poll_last_n: vars.positive("POLL_LAST_N", defaults.poll_last_n)?,
            local_timezone: vars.parse("LOCAL_TIMEZONE", defaults.local_timezone)?,

            // Series buffers
            series_deduplicate: vars.flag("SERIES_DEDUPLICATE", defaults.series_deduplicate)?,
            series_max_points: vars.parse("SERIES_MAX_POINTS", defaults.series_max_points)?,

            // Sensor entities
            luminosity_entity_type: vars
                .string("LUMINOSITY_ENTITY_TYPE", defaults.luminosity_entity_type),
            luminosity_entity_id: vars.string("LUMINOSITY_ENTITY_ID", defaults.luminosity_entity_id),
            dht_entity_type: vars.string("DHT_ENTITY_TYPE", defaults.dht_entity_type),
            dht_entity_id: vars.string("DHT_ENTITY_ID", defaults.dht_entity_id),

            // Dashboard server
            dashboard_host: vars.string("DASHBOARD_HOST", defaults.dashboard_host),
            dashboard_port: vars.parse("DASHBOARD_PORT", defaults.dashboard_port)?,

            // Rate limiting
            disable_rate_limiting: vars
                .flag("DISABLE_RATE_LIMITING", defaults.disable_rate_limiting)?,
            rate_limit_per_second: vars
                .positive("RATE_LIMIT_PER_SECOND", defaults.rate_limit_per_second)?,
            rate_limit_burst: vars.positive("RATE_LIMIT_BURST", defaults.rate_limit_burst)?,
        })
    }

    #[must_use]
    pub fn sth_base_url(&self) -> String {
        format!("http://{}:{}", self.sth_host, self.sth_port)
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.dashboard_host, self.dashboard_port)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn append_policy(&self) -> AppendPolicy {
        AppendPolicy {
            deduplicate: self.series_deduplicate,
            max_points: (self.series_max_points > 0).then_some(self.series_max_points),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}
