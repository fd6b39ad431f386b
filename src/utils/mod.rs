//! Commonly used utilities shared across the framework.

pub mod timer;

pub use self::timer::{Routine, Timer};
