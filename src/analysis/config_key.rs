//! Composite experiment keys.
//!
//! Every trace is named after the experiment that produced it:
//! `method~protocol-load-sizeRate-flowRate-bufferSize-queueCount`, e.g.
//! `DT-1.0~DCTCP-0.20-0.3-200.0-4194304-2`. The method may itself contain
//! `-`, so the method is split off at `~` first. Field text is kept verbatim
//! ("0.20" stays "0.20") so a key always re-encodes to the string it was
//! parsed from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separates the method from the scenario fields
pub const METHOD_DELIMITER: char = '~';
/// Separates the scenario fields
pub const FIELD_DELIMITER: char = '-';

const SCENARIO_FIELDS: [&str; 6] = [
    "protocol",
    "load_level",
    "request_size_rate",
    "request_flow_rate",
    "buffer_size",
    "queue_count",
];

/// Errors from decoding or building a composite key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigKeyError {
    #[error("key '{0}' has no '~' separating method and scenario")]
    MissingMethodDelimiter(String),

    #[error("key '{0}' has an empty method")]
    EmptyMethod(String),

    #[error("scenario '{scenario}' has {found} fields, expected 6")]
    FieldCount { scenario: String, found: usize },

    #[error("{field} '{value}' is empty or contains a key delimiter")]
    InvalidField { field: &'static str, value: String },
}

/// Every experiment parameter except the method
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scenario {
    pub protocol: String,
    pub load_level: String,
    pub request_size_rate: String,
    pub request_flow_rate: String,
    pub buffer_size: String,
    pub queue_count: String,
}

impl Scenario {
    pub fn new(
        protocol: &str,
        load_level: &str,
        request_size_rate: &str,
        request_flow_rate: &str,
        buffer_size: &str,
        queue_count: &str,
    ) -> Result<Self, ConfigKeyError> {
        let scenario = Self {
            protocol: protocol.to_string(),
            load_level: load_level.to_string(),
            request_size_rate: request_size_rate.to_string(),
            request_flow_rate: request_flow_rate.to_string(),
            buffer_size: buffer_size.to_string(),
            queue_count: queue_count.to_string(),
        };
        scenario.validate()?;
        Ok(scenario)
    }

    fn fields(&self) -> [&str; 6] {
        [
            &self.protocol,
            &self.load_level,
            &self.request_size_rate,
            &self.request_flow_rate,
            &self.buffer_size,
            &self.queue_count,
        ]
    }

    fn validate(&self) -> Result<(), ConfigKeyError> {
        for (field, value) in SCENARIO_FIELDS.into_iter().zip(self.fields()) {
            if value.is_empty()
                || value.contains(FIELD_DELIMITER)
                || value.contains(METHOD_DELIMITER)
                || value.contains(char::is_whitespace)
            {
                return Err(ConfigKeyError::InvalidField {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Offered load as a number, when the load field is numeric
    pub fn load_value(&self) -> Option<f64> {
        self.load_level.parse().ok()
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [protocol, load, size, flow, buffer, queues] = self.fields();
        write!(
            f,
            "{protocol}{d}{load}{d}{size}{d}{flow}{d}{buffer}{d}{queues}",
            d = FIELD_DELIMITER
        )
    }
}

impl FromStr for Scenario {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(FIELD_DELIMITER).collect();
        match parts.as_slice() {
            [protocol, load, size, flow, buffer, queues] => {
                Scenario::new(protocol, load, size, flow, buffer, queues)
            }
            _ => Err(ConfigKeyError::FieldCount {
                scenario: s.to_string(),
                found: parts.len(),
            }),
        }
    }
}

/// Identity of one experiment run: method plus scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigKey {
    pub method: String,
    pub scenario: Scenario,
}

impl ConfigKey {
    pub fn new(method: &str, scenario: Scenario) -> Result<Self, ConfigKeyError> {
        if method.is_empty() {
            return Err(ConfigKeyError::EmptyMethod(method.to_string()));
        }
        if method.contains(METHOD_DELIMITER) || method.contains(char::is_whitespace) {
            return Err(ConfigKeyError::InvalidField {
                field: "method",
                value: method.to_string(),
            });
        }
        Ok(Self {
            method: method.to_string(),
            scenario,
        })
    }

    /// The same scenario run under another method
    pub fn with_method(&self, method: &str) -> ConfigKey {
        ConfigKey {
            method: method.to_string(),
            scenario: self.scenario.clone(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.method, METHOD_DELIMITER, self.scenario)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (method, scenario) = s
            .split_once(METHOD_DELIMITER)
            .ok_or_else(|| ConfigKeyError::MissingMethodDelimiter(s.to_string()))?;
        if method.is_empty() {
            return Err(ConfigKeyError::EmptyMethod(s.to_string()));
        }
        ConfigKey::new(method, scenario.parse()?)
    }
}
