pub mod gateway;
pub mod requester;

pub use gateway::{SmsGateway, SmsMessage, TermuxGateway};
pub use requester::{RespondFn, SmsRequester};
