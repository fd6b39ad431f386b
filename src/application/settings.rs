//! Engine configuration. Every parameter has a sensible default, so a
//! `Settings::default()` engine runs out of the box; hosts usually override
//! a handful of fields or deserialize the whole struct from JSON.

use std::fs;
use std::path::Path;

use crate::errors::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub time: TimeParams,
    pub state: StateParams,
}

impl Settings {
    /// Parses settings from a JSON payload.
    pub fn from_str(payload: &str) -> Result<Settings> {
        Ok(::serde_json::from_str(payload)?)
    }

    /// Reads and parses settings from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let payload = fs::read_to_string(path)?;
        Settings::from_str(&payload)
    }
}

/// Frame timing parameters. A value of zero disables the corresponding
/// bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeParams {
    /// Below this rate the timestep is clamped instead of growing, trading
    /// slow motion for stability after a hitch.
    pub min_fps: u32,
    /// Above this rate the engine sleeps off the surplus frame time.
    pub max_fps: u32,
}

impl Default for TimeParams {
    fn default() -> Self {
        TimeParams {
            min_fps: 0,
            max_fps: 0,
        }
    }
}

/// Per-state simulation parameters, applied to every state when it is
/// created. States may change their own copies afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateParams {
    /// Multiplier from wall-clock frame time to the state's scaled time.
    pub time_scale: f32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
}

impl Default for StateParams {
    fn default() -> Self {
        StateParams {
            time_scale: 1.0,
            velocity_iterations: 8,
            position_iterations: 3,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.time.min_fps, 0);
        assert_eq!(settings.time.max_fps, 0);
        assert_eq!(settings.state.time_scale, 1.0);
        assert_eq!(settings.state.velocity_iterations, 8);
        assert_eq!(settings.state.position_iterations, 3);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let settings =
            Settings::from_str(r#"{ "state": { "time_scale": 0.5 }, "time": { "max_fps": 60 } }"#)
                .unwrap();
        assert_eq!(settings.state.time_scale, 0.5);
        assert_eq!(settings.state.velocity_iterations, 8);
        assert_eq!(settings.time.max_fps, 60);
        assert_eq!(settings.time.min_fps, 0);
    }
}
