pub mod gate;
pub mod handlers;

pub use gate::{Endpoint, VerificationGate};
