//! The stacked-state application layer and its frame loop.

pub mod engine;
pub mod settings;
pub mod state;
pub mod time;

pub use self::engine::{Context, Engine, EngineStatus, StateHandle};
pub use self::settings::{Settings, StateParams, TimeParams};
pub use self::state::{State, StateCore};
pub use self::time::{ManualClock, TimeSource, TimeStep, TimeSystem, WallClock};
