mod engine;

pub use engine::{ClockEngine, ClockState};
