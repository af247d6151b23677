pub mod controller;
pub mod state;

pub use controller::RevealController;
pub use state::{RevealSnapshot, RevealStatus, RevealStream, TickOutcome};
