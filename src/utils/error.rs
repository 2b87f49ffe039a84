use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("SMS gateway error: {0}")]
    GatewayError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::InvalidData(format!("JSON error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for MonitorError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        MonitorError::Timeout
    }
}
