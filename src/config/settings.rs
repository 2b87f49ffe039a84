use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::error::MonitorError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Connection settings
    pub serial: SerialSettings,

    // Monitoring settings
    pub update_interval_seconds: u64,

    // SMS settings
    pub sms: SmsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub unit_id: u8,
    pub timeout_ms: u64,
    pub parity: ParityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsSettings {
    /// Minimum delay between two unsolicited SMS alerts.
    pub alert_interval_minutes: u64,
    /// How often the inbox is polled for stats requests.
    pub lookup_interval_seconds: u64,
    /// A request older than this is ignored.
    pub lookback_seconds: u64,
    /// Substring that marks an inbound message as a stats request.
    pub trigger: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParityConfig {
    None,
    Even,
    Odd,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            serial: SerialSettings::default(),
            update_interval_seconds: 60,
            sms: SmsSettings::default(),
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            unit_id: 1,
            timeout_ms: 2000,
            parity: ParityConfig::None,
        }
    }
}

impl Default for SmsSettings {
    fn default() -> Self {
        Self {
            alert_interval_minutes: 30,
            lookup_interval_seconds: 5,
            lookback_seconds: 5,
            trigger: "solar:stats".to_string(),
        }
    }
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(&path)?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| MonitorError::ConfigError(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_constants() {
        let settings = Settings::default();
        assert_eq!(settings.serial.port, "/dev/ttyUSB0");
        assert_eq!(settings.serial.baud_rate, 9600);
        assert_eq!(settings.update_interval_seconds, 60);
        assert_eq!(settings.sms.alert_interval_minutes, 30);
        assert_eq!(settings.sms.trigger, "solar:stats");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            update_interval_seconds = 10

            [serial]
            port = "/dev/ttyACM0"
            "#,
        )
        .unwrap();

        assert_eq!(settings.serial.port, "/dev/ttyACM0");
        assert_eq!(settings.serial.baud_rate, 9600);
        assert_eq!(settings.update_interval_seconds, 10);
        assert_eq!(settings.sms.lookup_interval_seconds, 5);
    }
}
