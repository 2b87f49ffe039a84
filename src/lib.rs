//! Solar Charge Controller Monitor
//!
//! This library polls a Renogy-style solar charge controller over Modbus RTU,
//! decodes its measurements into state snapshots, and delivers them to a set
//! of sinks (CSV log, terminal, rate-limited SMS). A background bridge
//! answers on-demand SMS stats requests with the latest snapshot.

pub mod config;
pub mod controller;
pub mod sinks;
pub mod sms;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use controller::{ControllerState, RegisterTransport, RenogyController, RtuTransport};
pub use sinks::{CsvLogSink, SmsAlertSink, StateSink, TerminalSink};
pub use sms::{SmsGateway, SmsRequester, TermuxGateway};
pub use utils::error::MonitorError;

pub const VERSION: &str = "0.1.0";
