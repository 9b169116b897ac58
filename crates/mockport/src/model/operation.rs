//! Settings shared by SOAP operations and REST methods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How a matched operation is served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// Served from the configured mock responses.
    #[default]
    Enabled,
    /// Treated as unmatched.
    Disabled,
    /// Bypasses response selection; the caller proxies the request.
    Forwarded,
    /// Responds with the request body.
    Echo,
}

/// Algorithm used to choose among several enabled mock responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStrategy {
    Random,
    Sequence,
    #[serde(rename = "XPATH_INPUT", alias = "XPATH")]
    XPathInput,
    #[serde(rename = "JSON_PATH_INPUT", alias = "JSON_PATH")]
    JsonPathInput,
    #[default]
    Default,
}

impl ResponseStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStrategy::Random => "random",
            ResponseStrategy::Sequence => "sequence",
            ResponseStrategy::XPathInput => "xpath_input",
            ResponseStrategy::JsonPathInput => "json_path_input",
            ResponseStrategy::Default => "default",
        }
    }
}

impl fmt::Display for ResponseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution settings of a SOAP operation or REST method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSettings {
    pub status: OperationStatus,
    pub strategy: ResponseStrategy,
    pub simulate_network_delay: bool,
    /// Delay in milliseconds; zero or negative means no delay.
    pub network_delay_ms: i64,
    pub default_response_id: Option<String>,
    pub forwarded_endpoint: Option<String>,
}

impl OperationSettings {
    /// The delay to apply before responding, if any.
    pub fn effective_delay(&self) -> Option<Duration> {
        if self.simulate_network_delay && self.network_delay_ms > 0 {
            Some(Duration::from_millis(self.network_delay_ms as u64))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_delay_requires_flag_and_positive_value() {
        let mut settings = OperationSettings {
            network_delay_ms: 250,
            ..Default::default()
        };
        assert_eq!(settings.effective_delay(), None);

        settings.simulate_network_delay = true;
        assert_eq!(settings.effective_delay(), Some(Duration::from_millis(250)));

        settings.network_delay_ms = 0;
        assert_eq!(settings.effective_delay(), None);

        settings.network_delay_ms = -40;
        assert_eq!(settings.effective_delay(), None);
    }

    #[test]
    fn test_strategy_serde_names() {
        let strategy: ResponseStrategy = serde_yaml::from_str("XPATH_INPUT").unwrap();
        assert_eq!(strategy, ResponseStrategy::XPathInput);
        let strategy: ResponseStrategy = serde_yaml::from_str("SEQUENCE").unwrap();
        assert_eq!(strategy, ResponseStrategy::Sequence);
        let strategy: ResponseStrategy = serde_yaml::from_str("JSON_PATH").unwrap();
        assert_eq!(strategy, ResponseStrategy::JsonPathInput);
    }
}
