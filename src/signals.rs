use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::config::Config;
use crate::error::AppError;

/// The three sensor readings shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Luminosity,
    Humidity,
    Temperature,
}

impl Signal {
    /// Poll and display order.
    pub const ALL: [Self; 3] = [Self::Luminosity, Self::Humidity, Self::Temperature];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used in URLs and SSE event names.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Luminosity => "luminosity",
            Self::Humidity => "humidity",
            Self::Temperature => "temperature",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Luminosity => "Luminosity",
            Self::Humidity => "Humidity",
            Self::Temperature => "Temperature",
        }
    }

    /// Line colour of the primary trace.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Luminosity => "red",
            Self::Humidity => "green",
            Self::Temperature => "orange",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Signal {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|signal| signal.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::NotFound(format!("Signal '{s}' not found")))
    }
}

/// Where a signal lives in the STH API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDefinition {
    pub signal: Signal,
    pub entity_type: String,
    pub entity_id: String,
    pub attribute: String,
    pub last_n: u32,
}

/// Build the luminosity, humidity and temperature definitions, in that order.
///
/// Humidity and temperature are two attributes of the same DHT22 entity.
#[must_use]
pub fn definitions(config: &Config) -> Vec<SignalDefinition> {
    Signal::ALL
        .into_iter()
        .map(|signal| {
            let (entity_type, entity_id) = match signal {
                Signal::Luminosity => (
                    &config.luminosity_entity_type,
                    &config.luminosity_entity_id,
                ),
                Signal::Humidity | Signal::Temperature => {
                    (&config.dht_entity_type, &config.dht_entity_id)
                }
            };

            SignalDefinition {
                signal,
                entity_type: entity_type.clone(),
                entity_id: entity_id.clone(),
                attribute: signal.slug().to_string(),
                last_n: config.poll_last_n,
            }
        })
        .collect()
}
