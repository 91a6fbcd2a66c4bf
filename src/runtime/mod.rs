//! Runtime support for the heartbeat loop
//!
//! Time source and cooperative shutdown.

pub mod clock;
pub mod shutdown;

pub use clock::{Clock, SystemClock};
pub use shutdown::ShutdownSignal;
