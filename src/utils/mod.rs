pub mod error;

pub use error::MonitorError;
