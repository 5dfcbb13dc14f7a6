//! Time subsystem.
//!
//! Provides a testable stopwatch for time-driven repaints without coupling to a
//! runtime loop.

mod timer;

pub use timer::Timer;
