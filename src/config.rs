use crate::error::Result;
use crate::types::VolumeLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens to local activity tracking when a stop command fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopFailurePolicy {
    /// Treat the activity as gone and return to idle
    #[default]
    ClearActivity,

    /// Keep tracking the activity; a launch waiting on the stop is abandoned
    KeepActivity,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Application registered on startup, if any
    #[serde(default)]
    pub app_id: Option<String>,

    /// Parameters attached to every launch request
    #[serde(default)]
    pub launch_parameters: Option<String>,

    /// Requested volume before the user changes it
    #[serde(default = "default_initial_volume")]
    pub initial_volume: VolumeLevel,

    #[serde(default)]
    pub stop_failure: StopFailurePolicy,

    /// Buffered change notifications per subscriber
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,

    /// Expected `source` of the device API handshake message
    #[serde(default = "default_handshake_source")]
    pub handshake_source: String,
}

fn default_initial_volume() -> VolumeLevel {
    0.5
}

fn default_notify_capacity() -> usize {
    100
}

fn default_handshake_source() -> String {
    "CastApi".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            launch_parameters: None,
            initial_volume: default_initial_volume(),
            stop_failure: StopFailurePolicy::default(),
            notify_capacity: default_notify_capacity(),
            handshake_source: default_handshake_source(),
        }
    }
}

impl SessionConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading session config from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub(crate) fn normalized(mut self) -> Self {
        if !self.initial_volume.is_finite() {
            tracing::warn!("Invalid initial volume, using {}", default_initial_volume());
            self.initial_volume = default_initial_volume();
        }
        self.initial_volume = self.initial_volume.clamp(0.0, 1.0);
        if self.app_id.as_deref() == Some("") {
            self.app_id = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config = SessionConfig::from_json("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.initial_volume, 0.5);
        assert_eq!(config.stop_failure, StopFailurePolicy::ClearActivity);
        assert_eq!(config.notify_capacity, 100);
    }

    #[test]
    fn test_parse_full_config() {
        let config = SessionConfig::from_json(
            r#"{
                "app_id": "Foo",
                "launch_parameters": "v=abc",
                "initial_volume": 1.4,
                "stop_failure": "keep-activity",
                "notify_capacity": 8,
                "handshake_source": "Bridge"
            }"#,
        )
        .unwrap();
        assert_eq!(config.app_id.as_deref(), Some("Foo"));
        assert_eq!(config.launch_parameters.as_deref(), Some("v=abc"));
        assert_eq!(config.initial_volume, 1.0);
        assert_eq!(config.stop_failure, StopFailurePolicy::KeepActivity);
        assert_eq!(config.handshake_source, "Bridge");
    }

    #[test]
    fn test_empty_app_id_is_unset() {
        let config = SessionConfig::from_json(r#"{ "app_id": "" }"#).unwrap();
        assert_eq!(config.app_id, None);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(SessionConfig::from_json("{ app_id").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = SessionConfig::from_file("/nonexistent/cast-session.json").unwrap_err();
        assert!(matches!(err, crate::error::CastError::Io(_)));
    }
}
