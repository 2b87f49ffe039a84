pub mod settings;

pub use settings::{ParityConfig, SerialSettings, Settings, SmsSettings};
