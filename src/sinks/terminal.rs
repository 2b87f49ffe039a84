use async_trait::async_trait;
use chrono::Local;

use super::StateSink;
use crate::controller::state::ControllerState;
use crate::utils::error::MonitorError;

/// Prints each snapshot as one timestamped line on stdout.
pub struct TerminalSink;

#[async_trait]
impl StateSink for TerminalSink {
    async fn deliver(&mut self, state: &ControllerState) -> Result<(), MonitorError> {
        println!("{} | {}", Local::now().format("%Y-%m-%d %H:%M:%S"), state);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), MonitorError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "terminal"
    }
}
