pub mod renogy;
pub mod state;
pub mod transport;

pub use renogy::RenogyController;
pub use state::{ControllerState, CSV_HEADER};
pub use transport::{RegisterTransport, RtuTransport};
