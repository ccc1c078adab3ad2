#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
pub mod state;

pub use controller::{GenerateController, GenerateTimings};
pub use state::GenerateState;
