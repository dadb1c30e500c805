//! Simulation runtime - session state, clocks and the tick controller

pub mod clock;
pub mod controller;
pub mod session;

pub use clock::{Clock, RuntimeClock, SteppingClock};
pub use controller::{ControllerBuilder, ControllerError, SimulationController};
pub use session::Session;
