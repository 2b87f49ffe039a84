pub mod csv_log;
pub mod sms_alert;
pub mod terminal;

pub use csv_log::CsvLogSink;
pub use sms_alert::SmsAlertSink;
pub use terminal::TerminalSink;

use async_trait::async_trait;
use log::warn;

use crate::controller::state::ControllerState;
use crate::utils::error::MonitorError;

/// A delivery target for committed snapshots.
#[async_trait]
pub trait StateSink: Send {
    async fn deliver(&mut self, state: &ControllerState) -> Result<(), MonitorError>;
    async fn close(&mut self) -> Result<(), MonitorError>;
    fn name(&self) -> &str;
}

/// Fans a snapshot out to every sink in order. A failing sink is logged and
/// never blocks the sinks after it.
pub async fn deliver_all(sinks: &mut [Box<dyn StateSink>], state: &ControllerState) {
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.deliver(state).await {
            warn!("failed to deliver state to {} sink: {}", sink.name(), e);
        }
    }
}

pub async fn close_all(sinks: &mut [Box<dyn StateSink>]) {
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.close().await {
            warn!("failed to close {} sink: {}", sink.name(), e);
        }
    }
}
