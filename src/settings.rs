//! Engine configuration.
//!
//! Settings are plain data with sensible defaults. They can be written by hand
//! as RON, where every missing field keeps its default:
//!
//! ```ron
//! (
//!     resolution: (1280, 720),
//!     max_sub_steps: 4,
//!     game_mode: true,
//! )
//! ```

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::physics;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Output size in pixels.
    pub resolution: (u32, u32),
    /// Physics sub-step cap. Negative: one variable step per frame. Zero: no cap.
    pub max_sub_steps: i32,
    /// Reference rate of the fixed physics step.
    pub internal_fps: f32,
    pub gravity: [f32; 3],
    pub solver_iterations: usize,
    pub physics_enabled: bool,
    /// Start in game mode instead of editor mode.
    pub game_mode: bool,
    pub debug_draw_physics: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            resolution: (1920, 1080),
            max_sub_steps: 1,
            internal_fps: physics::INTERNAL_FPS,
            gravity: physics::GRAVITY.into(),
            solver_iterations: physics::MAX_SOLVER_ITERATIONS,
            physics_enabled: true,
            game_mode: false,
            debug_draw_physics: false,
        }
    }
}

impl EngineSettings {
    pub fn from_ron_str(source: &str) -> anyhow::Result<Self> {
        ron::from_str(source).context("Invalid engine settings")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_ron_str(&source)
    }

    pub fn to_ron_string(&self) -> anyhow::Result<String> {
        let config = ron::ser::PrettyConfig::new().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, config).context("Failed to serialize engine settings")
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_ron_string()?)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}
