//! kestrel-ngin
//!
//! The core of a small 3D engine: a pool of game objects arranged in a
//! hierarchy, cameras that only recompute their matrices when something
//! changed, a rigid body simulation stepped at a fixed internal rate and a thin
//! rendering hardware interface for vertex and index buffers.
//!
//! High-level modules
//! - `components`: camera and rigid body components attached to game objects
//! - `context`: settings, engine mode flags, renderer handle and profiler
//! - `data_structures`: transforms, frustums, game objects and their pool
//! - `engine`: owns the context, the scene and physics and drives a frame
//! - `filesystem`: path helpers and supported file type checks
//! - `physics`: sub-step policy and the rapier backed world
//! - `resources`: textures, meshes, shaders, audio clips, fonts and their cache
//! - `rhi`: backend independent GPU buffers
//! - `serializer`: binary scene stream
//! - `settings`: engine settings stored as RON
//!

pub mod components;
pub mod context;
pub mod data_structures;
pub mod engine;
pub mod filesystem;
pub mod physics;
pub mod profiler;
pub mod resources;
pub mod rhi;
pub mod serializer;
pub mod settings;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use context::Context;
pub use engine::Engine;
pub use settings::EngineSettings;

/// Installs `env_logger` unless a logger is already set. `RUST_LOG` picks the level.
pub fn init_logger() {
    if let Err(e) = env_logger::try_init() {
        log::debug!("Logger already initialised: {}", e);
    }
}
