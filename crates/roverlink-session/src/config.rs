use std::path::Path;
use std::time::Duration;

use roverlink_codec::CommandValues;
use roverlink_schema::Variant;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// When a session builds a command on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyPolicy {
    /// Commands are only sent when the caller asks.
    #[default]
    Manual,
    /// Send the current command after every decoded telemetry frame.
    AfterTelemetry,
}

/// Session configuration, usually loaded from a JSON file.
///
/// ```json
/// {
///   "variant": "extended-25",
///   "reply": "after-telemetry",
///   "link": "/dev/ttyACM0",
///   "command": { "rightDesiredRpm": 120, "leftDesiredRpm": 120 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Protocol variant spoken by the controller.
    pub variant: Variant,
    pub reply: ReplyPolicy,
    /// Command values layered over an all-zero command.
    pub command: CommandValues,
    /// Link address; `None` means the default serial device.
    pub link: Option<String>,
    pub baud_rate: u32,
    /// Read timeout in milliseconds; `None` blocks.
    pub read_timeout_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            reply: ReplyPolicy::default(),
            command: CommandValues::new(),
            link: None,
            baud_rate: roverlink_transport::SerialConfig::DEFAULT_BAUD_RATE,
            read_timeout_ms: None,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SessionError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "roverlink-config-{}-{}-{name}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ))
    }

    #[test]
    fn defaults_match_controller_settings() {
        let config = SessionConfig::default();
        assert_eq!(config.variant, Variant::Legacy21);
        assert_eq!(config.reply, ReplyPolicy::Manual);
        assert_eq!(config.baud_rate, 115_200);
        assert!(config.command.is_empty());
        assert_eq!(config.read_timeout(), None);
    }

    #[test]
    fn loads_partial_file() {
        let path = temp_path("partial.json");
        std::fs::write(
            &path,
            r#"{"variant": "extended", "reply": "after-telemetry", "command": {"led1": 1}}"#,
        )
        .expect("config should be writable");

        let config = SessionConfig::from_json_file(&path).expect("config should load");
        assert_eq!(config.variant, Variant::Extended25);
        assert_eq!(config.reply, ReplyPolicy::AfterTelemetry);
        assert_eq!(config.command.get("led1"), Some(1));
        assert_eq!(config.baud_rate, 115_200);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_unknown_keys() {
        let path = temp_path("unknown.json");
        std::fs::write(&path, r#"{"baud": 9600}"#).expect("config should be writable");

        let err = SessionConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, SessionError::Config { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = SessionConfig::from_json_file(temp_path("missing.json")).unwrap_err();
        assert!(matches!(err, SessionError::ConfigRead { .. }));
    }
}
