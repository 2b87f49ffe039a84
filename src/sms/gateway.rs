use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::debug;
use serde::Deserialize;
use tokio::process::Command;

use crate::utils::error::MonitorError;

/// One inbound message as reported by the external list command.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsMessage {
    pub number: String,
    /// Local wall-clock time with no timezone, as the tooling reports it.
    #[serde(rename = "received", with = "sms_time")]
    pub received_at: NaiveDateTime,
    pub body: String,
}

mod sms_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// External send/list primitives behind a narrow interface. The production
/// implementation shells out; tests substitute their own.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Sends `body` to all `numbers` in one invocation.
    async fn send(&self, numbers: &[String], body: &str) -> Result<(), MonitorError>;

    /// Lists recently received inbound messages.
    async fn list_recent(&self) -> Result<Vec<SmsMessage>, MonitorError>;
}

/// Gateway backed by the Termux SMS command line tools.
#[derive(Debug, Default)]
pub struct TermuxGateway;

impl TermuxGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SmsGateway for TermuxGateway {
    async fn send(&self, numbers: &[String], body: &str) -> Result<(), MonitorError> {
        let recipients = numbers.join(",");
        debug!("📨 Sending SMS to {}", recipients);

        let status = Command::new("termux-sms-send")
            .arg("-n")
            .arg(&recipients)
            .arg(body)
            .status()
            .await
            .map_err(|e| {
                MonitorError::GatewayError(format!("failed to run termux-sms-send: {}", e))
            })?;

        if !status.success() {
            return Err(MonitorError::GatewayError(format!(
                "termux-sms-send exited with {}",
                status
            )));
        }

        Ok(())
    }

    async fn list_recent(&self) -> Result<Vec<SmsMessage>, MonitorError> {
        let output = Command::new("termux-sms-list").output().await.map_err(|e| {
            MonitorError::GatewayError(format!("failed to run termux-sms-list: {}", e))
        })?;

        if !output.status.success() {
            return Err(MonitorError::GatewayError(format!(
                "termux-sms-list exited with {}",
                output.status
            )));
        }

        let messages: Vec<SmsMessage> = serde_json::from_slice(&output.stdout)?;
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_termux_sms_list_output() {
        let json = r#"[
            {"number": "+15551234567", "received": "2026-08-29 10:15:00", "body": "solar:stats"},
            {"number": "+15557654321", "received": "2026-08-29 09:00:30", "body": "hello"}
        ]"#;

        let messages: Vec<SmsMessage> = serde_json::from_str(json).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].number, "+15551234567");
        assert_eq!(
            messages[0].received_at,
            NaiveDate::from_ymd_opt(2026, 8, 29)
                .unwrap()
                .and_hms_opt(10, 15, 0)
                .unwrap()
        );
        assert_eq!(messages[1].body, "hello");
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let json = r#"[{"number": "1", "received": "29/08/2026 10:15", "body": "x"}]"#;
        assert!(serde_json::from_str::<Vec<SmsMessage>>(json).is_err());
    }
}
