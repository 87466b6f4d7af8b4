//! Compiler configuration.

use serde::{Deserialize, Serialize};

/// Default length of one discrete frame, in milliseconds.
pub const ONE_FRAME_MS: f64 = 1.0;

/// Configuration for the timeline compiler.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Clock step used when adjacent style-only steps must not collapse into one keyframe.
    pub frame_ms: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_ms: ONE_FRAME_MS,
        }
    }
}
