use async_trait::async_trait;
use log::{error, info};
use std::time::Duration;
use tokio_modbus::client::{Context, Reader};
use tokio_modbus::prelude::*;

use crate::config::settings::{ParityConfig, SerialSettings};
use crate::utils::error::MonitorError;

/// Narrow request/response view of the register protocol.
///
/// Words come back big-endian across registers, first word most significant.
/// Framing, CRC and wire retries live below this trait.
#[async_trait]
pub trait RegisterTransport: Send {
    async fn read_words(&mut self, address: u16, count: u16) -> Result<Vec<u16>, MonitorError>;

    async fn close(&mut self) -> Result<(), MonitorError>;
}

/// Modbus RTU transport over a serial line.
pub struct RtuTransport {
    ctx: Option<Context>,
    port: String,
    timeout: Duration,
}

impl RtuTransport {
    pub fn connect(settings: &SerialSettings) -> Result<Self, MonitorError> {
        info!("🔌 Connecting to charge controller on {}", settings.port);
        info!(
            "⚙️  Configuration: {} baud, 8 data bits, 1 stop bit, unit {}",
            settings.baud_rate, settings.unit_id
        );

        let parity = match settings.parity {
            ParityConfig::None => tokio_serial::Parity::None,
            ParityConfig::Even => tokio_serial::Parity::Even,
            ParityConfig::Odd => tokio_serial::Parity::Odd,
        };

        let builder = tokio_serial::new(&settings.port, settings.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(parity);

        let serial = tokio_serial::SerialStream::open(&builder).map_err(|e| {
            error!("❌ Failed to open serial port {}: {}", settings.port, e);
            MonitorError::ConnectionError(format!(
                "failed to open serial port {}: {}",
                settings.port, e
            ))
        })?;

        let ctx = rtu::attach_slave(serial, Slave(settings.unit_id));

        info!("✅ Serial connection established");
        Ok(Self {
            ctx: Some(ctx),
            port: settings.port.clone(),
            timeout: Duration::from_millis(settings.timeout_ms),
        })
    }
}

#[async_trait]
impl RegisterTransport for RtuTransport {
    async fn read_words(&mut self, address: u16, count: u16) -> Result<Vec<u16>, MonitorError> {
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| MonitorError::ConnectionError("transport is closed".to_string()))?;

        let words = tokio::time::timeout(self.timeout, ctx.read_holding_registers(address, count))
            .await?
            .map_err(|e| MonitorError::TransportError(e.to_string()))?
            .map_err(|e| MonitorError::TransportError(format!("modbus exception: {:?}", e)))?;

        Ok(words)
    }

    async fn close(&mut self) -> Result<(), MonitorError> {
        if self.ctx.take().is_some() {
            info!("Serial connection to {} closed", self.port);
        }
        Ok(())
    }
}
