use async_trait::async_trait;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::StateSink;
use crate::controller::state::ControllerState;
use crate::sms::gateway::SmsGateway;
use crate::utils::error::MonitorError;

/// Rate-limited SMS digest of the controller state.
///
/// Delivery inside the minimum interval is a no-op. Send failures are logged
/// and never propagated; the interval only restarts after a successful send.
pub struct SmsAlertSink {
    gateway: Arc<dyn SmsGateway>,
    recipients: Vec<String>,
    min_interval: Duration,
    last_sent_at: Option<Instant>,
}

impl SmsAlertSink {
    pub fn new(gateway: Arc<dyn SmsGateway>, recipients: Vec<String>, min_interval: Duration) -> Self {
        Self {
            gateway,
            recipients,
            min_interval,
            last_sent_at: None,
        }
    }
}

#[async_trait]
impl StateSink for SmsAlertSink {
    async fn deliver(&mut self, state: &ControllerState) -> Result<(), MonitorError> {
        if let Some(last) = self.last_sent_at {
            if last.elapsed() < self.min_interval {
                return Ok(());
            }
        }

        match self.gateway.send(&self.recipients, &state.to_string()).await {
            Ok(()) => {
                self.last_sent_at = Some(Instant::now());
            }
            Err(e) => {
                warn!(
                    "failed to send SMS alert to {}: {}",
                    self.recipients.join(","),
                    e
                );
            }
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), MonitorError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "sms-alert"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sms::gateway::SmsMessage;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingGateway {
        sends: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sends: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl SmsGateway for CountingGateway {
        async fn send(&self, _numbers: &[String], _body: &str) -> Result<(), MonitorError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MonitorError::GatewayError("send failed".to_string()));
            }
            self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn list_recent(&self) -> Result<Vec<SmsMessage>, MonitorError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deliveries_inside_the_interval_are_dropped() {
        let gateway = CountingGateway::new();
        let mut sink = SmsAlertSink::new(
            gateway.clone(),
            vec!["+111".to_string()],
            Duration::from_secs(1800),
        );
        let state = ControllerState::default();

        sink.deliver(&state).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        sink.deliver(&state).await.unwrap();
        assert_eq!(gateway.sends.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1800)).await;
        sink.deliver(&state).await.unwrap();
        assert_eq!(gateway.sends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_send_does_not_restart_the_interval() {
        let gateway = CountingGateway::new();
        let mut sink = SmsAlertSink::new(
            gateway.clone(),
            vec!["+111".to_string()],
            Duration::from_secs(1800),
        );
        let state = ControllerState::default();

        gateway.fail.store(true, Ordering::SeqCst);
        sink.deliver(&state).await.unwrap();
        assert_eq!(gateway.sends.load(Ordering::SeqCst), 0);

        // Next delivery retries immediately because nothing was sent yet.
        gateway.fail.store(false, Ordering::SeqCst);
        sink.deliver(&state).await.unwrap();
        assert_eq!(gateway.sends.load(Ordering::SeqCst), 1);
    }
}
