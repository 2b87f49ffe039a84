use chrono::{DateTime, Local};

use super::state::ControllerState;
use super::transport::RegisterTransport;
use crate::utils::error::MonitorError;

// Holding register map of the Renogy Wanderer / Rover family.
const REG_BATTERY_SOC: u16 = 0x100;
const REG_BATTERY_VOLTAGE: u16 = 0x101;
const REG_CHARGING_CURRENT: u16 = 0x102;
const REG_TEMPERATURE: u16 = 0x103;
const REG_PV_VOLTAGE: u16 = 0x107;
const REG_PV_CURRENT: u16 = 0x108;
const REG_PV_POWER: u16 = 0x109;

/// Applies the uniform `raw * scale` conversion of the register map.
pub(crate) fn scale_raw(raw: u16, scale: f64) -> f64 {
    f64::from(raw) * scale
}

/// Decodes the controller temperature word.
///
/// The low byte is sign-magnitude: bits 0-6 carry the magnitude in Celsius,
/// bit 7 is the sign.
pub(crate) fn decode_temperature(word: u16) -> f64 {
    let byte = (word & 0xff) as u8;
    let magnitude = f64::from(byte & 0x7f);
    if byte & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Polls a Renogy charge controller and holds the committed snapshot.
///
/// `update` is single-writer: it takes `&mut self` and must be driven by one
/// scheduler at a time. There is no internal locking.
pub struct RenogyController<T: RegisterTransport> {
    transport: T,
    state: ControllerState,
    last_updated_at: Option<DateTime<Local>>,
}

impl<T: RegisterTransport> RenogyController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ControllerState::default(),
            last_updated_at: None,
        }
    }

    /// The committed snapshot. Defaults to all zeroes until the first
    /// successful [`update`](Self::update).
    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Local>> {
        self.last_updated_at
    }

    /// Reads all seven measurements and commits them as a new snapshot.
    ///
    /// All-or-nothing: the first failed read aborts the cycle and the
    /// committed snapshot stays untouched.
    pub async fn update(&mut self) -> Result<(), MonitorError> {
        let mut next = self.state;

        next.battery_soc = self.read_scaled(REG_BATTERY_SOC, 1.0).await?;
        next.battery_voltage = self.read_scaled(REG_BATTERY_VOLTAGE, 0.1).await?;
        next.charging_current = self.read_scaled(REG_CHARGING_CURRENT, 0.01).await?;
        next.pv_current = self.read_scaled(REG_PV_CURRENT, 0.01).await?;
        next.pv_voltage = self.read_scaled(REG_PV_VOLTAGE, 0.1).await?;
        next.pv_power = self.read_scaled(REG_PV_POWER, 1.0).await?;
        next.temperature = self.read_temperature().await?;

        self.state = next;
        self.last_updated_at = Some(Local::now());
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), MonitorError> {
        self.transport.close().await
    }

    /// Reads a two-register measurement. The controller carries the value in
    /// the first returned word.
    async fn read_u16(&mut self, address: u16) -> Result<u16, MonitorError> {
        let words = self.transport.read_words(address, 2).await?;
        words.first().copied().ok_or_else(|| {
            MonitorError::InvalidData(format!("empty response for register 0x{:x}", address))
        })
    }

    async fn read_scaled(&mut self, address: u16, scale: f64) -> Result<f64, MonitorError> {
        Ok(scale_raw(self.read_u16(address).await?, scale))
    }

    async fn read_temperature(&mut self) -> Result<f64, MonitorError> {
        let words = self.transport.read_words(REG_TEMPERATURE, 1).await?;
        let word = words.first().copied().ok_or_else(|| {
            MonitorError::InvalidData(format!(
                "empty response for register 0x{:x}",
                REG_TEMPERATURE
            ))
        })?;
        Ok(decode_temperature(word))
    }
}
